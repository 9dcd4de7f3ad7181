//! Update documents, aggregate stages, bulk operations and write results

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::options::SortSpec;
use crate::query::Filter;

/// Update document, passed to the server verbatim
///
/// No local interpretation of `$set`/`$inc` is performed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateDocument(Map<String, Value>);

impl UpdateDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(path.into(), value.into());
        self
    }

    /// Synthetic update applied by soft deletes
    pub fn soft_delete() -> Self {
        let mut deleted = Map::new();
        deleted.insert("status".to_string(), Value::Bool(true));
        Self::new().set("deleted", Value::Object(deleted))
    }
}

impl From<Map<String, Value>> for UpdateDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// One aggregate pipeline stage, serialized as a single-key object
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Value),
    Group(Value),
    Sort(SortSpec),
    Project(Value),
    Limit(u64),
    Skip(u64),
    Unwind(Value),
    AddFields(Value),
    Count(String),
}

impl Stage {
    pub fn matching(filter: &Filter) -> Self {
        Self::Match(filter.to_value())
    }

    /// `$unwind` on a path, e.g. `"$variants"`
    pub fn unwind(path: impl Into<String>) -> Self {
        Self::Unwind(Value::String(path.into()))
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Match(_) => "$match",
            Self::Group(_) => "$group",
            Self::Sort(_) => "$sort",
            Self::Project(_) => "$project",
            Self::Limit(_) => "$limit",
            Self::Skip(_) => "$skip",
            Self::Unwind(_) => "$unwind",
            Self::AddFields(_) => "$addFields",
            Self::Count(_) => "$count",
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::Match(v)
            | Self::Group(v)
            | Self::Project(v)
            | Self::Unwind(v)
            | Self::AddFields(v) => v.clone(),
            Self::Sort(spec) => spec.to_value(),
            Self::Limit(n) | Self::Skip(n) => Value::from(*n),
            Self::Count(field) => Value::String(field.clone()),
        }
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key(), &self.body())?;
        map.end()
    }
}

/// Tagged write action batched into a single `bulkWrite`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkOperation {
    UpdateOne {
        filter: Value,
        update: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        upsert: Option<bool>,
    },
    InsertOne {
        document: Value,
    },
    DeleteOne {
        filter: Value,
    },
    ReplaceOne {
        filter: Value,
        replacement: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        upsert: Option<bool>,
    },
}

impl BulkOperation {
    pub fn update_one(filter: impl Into<Value>, update: impl Into<Value>) -> Self {
        Self::UpdateOne {
            filter: filter.into(),
            update: update.into(),
            upsert: None,
        }
    }

    pub fn insert_one(document: impl Into<Value>) -> Self {
        Self::InsertOne {
            document: document.into(),
        }
    }

    pub fn delete_one(filter: impl Into<Value>) -> Self {
        Self::DeleteOne {
            filter: filter.into(),
        }
    }

    pub fn replace_one(filter: impl Into<Value>, replacement: impl Into<Value>) -> Self {
        Self::ReplaceOne {
            filter: filter.into(),
            replacement: replacement.into(),
            upsert: None,
        }
    }
}

impl From<UpdateDocument> for Value {
    fn from(update: UpdateDocument) -> Self {
        Value::Object(update.0)
    }
}

/// Reply to `findOneAndUpdate` and `updateMany`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
    pub acknowledged: bool,
}

/// Reply to hard deletes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Reply to `bulkWrite`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BulkWriteResult {
    pub inserted_count: u64,
    pub matched_count: u64,
    pub modified_count: u64,
    pub deleted_count: u64,
    pub upserted_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stages_serialize_as_single_key_objects() {
        let pipeline = vec![
            Stage::matching(&Filter::new().eq("warehouse", "north")),
            Stage::unwind("$variants"),
            Stage::Group(json!({"_id": "$category", "total": {"$sum": "$quantity"}})),
            Stage::Sort(SortSpec::new().descending("total")),
            Stage::Skip(5),
            Stage::Limit(10),
            Stage::Project(json!({"total": 1})),
            Stage::AddFields(json!({"checked": true})),
            Stage::Count("groups".to_string()),
        ];
        assert_eq!(
            serde_json::to_value(&pipeline).unwrap(),
            json!([
                {"$match": {"warehouse": "north"}},
                {"$unwind": "$variants"},
                {"$group": {"_id": "$category", "total": {"$sum": "$quantity"}}},
                {"$sort": {"total": -1}},
                {"$skip": 5},
                {"$limit": 10},
                {"$project": {"total": 1}},
                {"$addFields": {"checked": true}},
                {"$count": "groups"}
            ])
        );
    }

    #[test]
    fn test_bulk_operations_are_externally_tagged() {
        let ops = vec![
            BulkOperation::update_one(json!({"sku": "A"}), json!({"$inc": {"quantity": 1}})),
            BulkOperation::insert_one(json!({"sku": "B"})),
            BulkOperation::delete_one(json!({"sku": "C"})),
            BulkOperation::ReplaceOne {
                filter: json!({"sku": "D"}),
                replacement: json!({"sku": "D", "quantity": 0}),
                upsert: Some(true),
            },
        ];
        assert_eq!(
            serde_json::to_value(&ops).unwrap(),
            json!([
                {"updateOne": {"filter": {"sku": "A"}, "update": {"$inc": {"quantity": 1}}}},
                {"insertOne": {"document": {"sku": "B"}}},
                {"deleteOne": {"filter": {"sku": "C"}}},
                {"replaceOne": {"filter": {"sku": "D"}, "replacement": {"sku": "D", "quantity": 0}, "upsert": true}}
            ])
        );
    }

    #[test]
    fn test_bulk_operation_parses_from_json() {
        let op: BulkOperation =
            serde_json::from_value(json!({"deleteOne": {"filter": {"sku": "Z"}}})).unwrap();
        assert_eq!(op, BulkOperation::delete_one(json!({"sku": "Z"})));
    }

    #[test]
    fn test_soft_delete_update_document() {
        assert_eq!(
            serde_json::to_value(UpdateDocument::soft_delete()).unwrap(),
            json!({"deleted": {"status": true}})
        );
    }

    #[test]
    fn test_results_tolerate_missing_fields() {
        let result: UpdateResult = serde_json::from_value(json!({"matchedCount": 2})).unwrap();
        assert_eq!(result.matched_count, 2);
        assert_eq!(result.modified_count, 0);
        assert!(!result.acknowledged);

        let result: DeleteResult = serde_json::from_value(json!({"deletedCount": 3})).unwrap();
        assert_eq!(result.deleted_count, 3);
    }
}

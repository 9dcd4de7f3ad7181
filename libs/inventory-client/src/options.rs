//! Per-operation options
//!
//! Options travel as the last element of a command tuple. Unset fields are
//! omitted from the wire object.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Sort direction for a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_i32(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

/// Ordered sort specification: `{field: 1 | -1, ...}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec(Vec<(String, SortOrder)>);

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ascending(mut self, field: impl Into<String>) -> Self {
        self.0.push((field.into(), SortOrder::Ascending));
        self
    }

    pub fn descending(mut self, field: impl Into<String>) -> Self {
        self.0.push((field.into(), SortOrder::Descending));
        self
    }

    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(field, order)| (field.clone(), Value::from(order.as_i32())))
            .collect();
        Value::Object(map)
    }
}

impl Serialize for SortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Options for `find` and its variants
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<Map<String, Value>>,
}

impl FindOptions {
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_projection(mut self, projection: Map<String, Value>) -> Self {
        self.projection = Some(projection);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsert: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_disk_use: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkWriteOptions {
    /// Stop at the first failing operation (server default when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,
}

/// Opaque options for create and delete, forwarded verbatim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteOptions(Map<String, Value>);

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl From<Map<String, Value>> for WriteOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unset_fields_are_omitted() {
        assert_eq!(serde_json::to_value(FindOptions::default()).unwrap(), json!({}));
        assert_eq!(
            serde_json::to_value(AggregateOptions {
                allow_disk_use: Some(true),
                batch_size: None
            })
            .unwrap(),
            json!({"allowDiskUse": true})
        );
    }

    #[test]
    fn test_sort_spec_keeps_field_order() {
        let options = FindOptions::default()
            .with_limit(20)
            .with_sort(SortSpec::new().descending("updatedAt").ascending("sku"));
        assert_eq!(
            serde_json::to_string(&options).unwrap(),
            r#"{"limit":20,"sort":{"updatedAt":-1,"sku":1}}"#
        );
    }

    #[test]
    fn test_write_options_are_transparent() {
        let options = WriteOptions::new().set("actor", "importer");
        assert_eq!(serde_json::to_value(options).unwrap(), json!({"actor": "importer"}));
    }
}

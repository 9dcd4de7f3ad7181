//! Command encoding
//!
//! Each public operation maps to a positional tuple
//! `[name, primary?, secondary?, options?]`. Options, when supplied, are
//! always last; when omitted the tuple is shorter, never padded.

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::error::{InventoryError, Result};
use crate::models::{BulkOperation, UpdateDocument};
use crate::options::{AggregateOptions, BulkWriteOptions, FindOptions, UpdateOptions, WriteOptions};

/// Wire operation names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    InsertOne,
    Find,
    FindOneAndUpdate,
    UpdateMany,
    DeleteOne,
    DeleteMany,
    Aggregate,
    BulkWrite,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsertOne => "insertOne",
            Self::Find => "find",
            Self::FindOneAndUpdate => "findOneAndUpdate",
            Self::UpdateMany => "updateMany",
            Self::DeleteOne => "deleteOne",
            Self::DeleteMany => "deleteMany",
            Self::Aggregate => "aggregate",
            Self::BulkWrite => "bulkWrite",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positional command tuple sent as the request body
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    operation: Operation,
    args: Vec<Value>,
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.args.len() + 1))?;
        seq.serialize_element(self.operation.as_str())?;
        for arg in &self.args {
            seq.serialize_element(arg)?;
        }
        seq.end()
    }
}

fn encode<T: Serialize + ?Sized>(value: &T, property: &str) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| InventoryError::encoding(property, e))
}

impl Command {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            args: Vec::new(),
        }
    }

    fn arg<T: Serialize + ?Sized>(mut self, value: &T, property: &str) -> Result<Self> {
        self.args.push(encode(value, property)?);
        Ok(self)
    }

    fn options<O: Serialize>(self, options: Option<&O>) -> Result<Self> {
        match options {
            Some(options) => self.arg(options, "options"),
            None => Ok(self),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Arguments after the operation name
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Exact bytes that are signed and sent
    pub fn to_body(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| InventoryError::encoding("command", e))
    }

    /// `["insertOne", item, options?]`
    pub fn insert_one<T: Serialize + ?Sized>(
        item: &T,
        options: Option<&WriteOptions>,
    ) -> Result<Self> {
        Self::new(Operation::InsertOne)
            .arg(item, "item")?
            .options(options)
    }

    /// `["find", query, options?]`
    pub fn find<Q: Serialize + ?Sized>(query: &Q, options: Option<&FindOptions>) -> Result<Self> {
        Self::new(Operation::Find).arg(query, "query")?.options(options)
    }

    /// `["find", query, {..options, limit: 1}]`
    ///
    /// Any caller-supplied limit is deliberately narrowed to exactly one.
    pub fn find_one<Q: Serialize + ?Sized>(
        query: &Q,
        options: Option<FindOptions>,
    ) -> Result<Self> {
        let options = options.unwrap_or_default().with_limit(1);
        Self::find(query, Some(&options))
    }

    /// `["findOneAndUpdate", query, update, options?]`
    pub fn find_one_and_update<Q, U>(
        query: &Q,
        update: &U,
        options: Option<&UpdateOptions>,
    ) -> Result<Self>
    where
        Q: Serialize + ?Sized,
        U: Serialize + ?Sized,
    {
        Self::new(Operation::FindOneAndUpdate)
            .arg(query, "query")?
            .arg(update, "update")?
            .options(options)
    }

    /// `["updateMany", query, update, options?]`
    pub fn update_many<Q, U>(query: &Q, update: &U, options: Option<&UpdateOptions>) -> Result<Self>
    where
        Q: Serialize + ?Sized,
        U: Serialize + ?Sized,
    {
        Self::new(Operation::UpdateMany)
            .arg(query, "query")?
            .arg(update, "update")?
            .options(options)
    }

    /// `["findOneAndUpdate", query, {deleted: {status: true}}, options?]`
    pub fn soft_delete<Q: Serialize + ?Sized>(
        query: &Q,
        options: Option<&WriteOptions>,
    ) -> Result<Self> {
        Self::new(Operation::FindOneAndUpdate)
            .arg(query, "query")?
            .arg(&UpdateDocument::soft_delete(), "update")?
            .options(options)
    }

    /// `["deleteOne", query, options?]`
    pub fn delete_one<Q: Serialize + ?Sized>(
        query: &Q,
        options: Option<&WriteOptions>,
    ) -> Result<Self> {
        Self::new(Operation::DeleteOne)
            .arg(query, "query")?
            .options(options)
    }

    /// `["deleteMany", query, options?]`
    pub fn delete_many<Q: Serialize + ?Sized>(
        query: &Q,
        options: Option<&WriteOptions>,
    ) -> Result<Self> {
        Self::new(Operation::DeleteMany)
            .arg(query, "query")?
            .options(options)
    }

    /// `["aggregate", pipeline, options?]`; stage order is preserved
    pub fn aggregate<P: Serialize + ?Sized>(
        pipeline: &P,
        options: Option<&AggregateOptions>,
    ) -> Result<Self> {
        Self::new(Operation::Aggregate)
            .arg(pipeline, "pipeline")?
            .options(options)
    }

    /// `["bulkWrite", operations, options?]`; operation order is preserved
    pub fn bulk_write(
        operations: &[BulkOperation],
        options: Option<&BulkWriteOptions>,
    ) -> Result<Self> {
        Self::new(Operation::BulkWrite)
            .arg(operations, "operations")?
            .options(options)
    }

    /// Expands `(query, update)` pairs into one `bulkWrite` of `updateOne`s
    pub fn update_batch<Q, U>(
        updates: &[(Q, U)],
        options: Option<&BulkWriteOptions>,
    ) -> Result<Self>
    where
        Q: Serialize,
        U: Serialize,
    {
        let operations = updates
            .iter()
            .map(|(query, update)| {
                Ok(BulkOperation::update_one(
                    encode(query, "query")?,
                    encode(update, "update")?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::bulk_write(&operations, options)
    }
}

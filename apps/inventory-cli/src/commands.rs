//! Subcommand definitions and dispatch

use clap::{Args, Subcommand};
use eyre::{Result, WrapErr, bail};
use inventory_client::{
    AggregateOptions, BulkOperation, BulkWriteOptions, FindOptions, InventoryClient, SortSpec,
    UpdateOptions, WriteOptions,
};
use serde_json::{Map, Value};
use tracing::{info, instrument};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Insert one item
    Create {
        /// Item document as JSON
        #[arg(value_parser = parse_json)]
        item: Value,

        /// Extra write options as a JSON object
        #[arg(long, value_parser = parse_object)]
        options: Option<Map<String, Value>>,
    },

    /// Find every item matching a query
    Find {
        /// Query as JSON (e.g. '{"quantity":{"$lt":5}}')
        #[arg(value_parser = parse_json, default_value = "{}")]
        query: Value,

        #[command(flatten)]
        find: FindArgs,
    },

    /// Find the first item matching a query
    FindOne {
        #[arg(value_parser = parse_json, default_value = "{}")]
        query: Value,

        #[command(flatten)]
        find: FindArgs,
    },

    /// Update the first item matching a query
    Update {
        #[arg(value_parser = parse_json)]
        query: Value,

        /// Update document as JSON (e.g. '{"$set":{"price":10}}')
        #[arg(value_parser = parse_json)]
        update: Value,

        #[arg(long)]
        upsert: bool,
    },

    /// Update every item matching a query
    UpdateMany {
        #[arg(value_parser = parse_json)]
        query: Value,

        #[arg(value_parser = parse_json)]
        update: Value,

        #[arg(long)]
        upsert: bool,
    },

    /// Soft-delete the first matching item (marks it deleted)
    Delete {
        #[arg(value_parser = parse_json)]
        query: Value,
    },

    /// Permanently remove the first matching item
    DeleteOne {
        #[arg(value_parser = parse_json)]
        query: Value,
    },

    /// Permanently remove every matching item
    DeleteMany {
        #[arg(value_parser = parse_json)]
        query: Value,
    },

    /// Run an aggregation pipeline
    Aggregate {
        /// Pipeline as a JSON array of stages
        #[arg(value_parser = parse_json)]
        pipeline: Value,

        #[arg(long)]
        allow_disk_use: bool,

        #[arg(long)]
        batch_size: Option<u32>,
    },

    /// Submit mixed write operations in one request
    BulkWrite {
        /// JSON array of operations (e.g. '[{"insertOne":{"document":{}}}]')
        #[arg(value_parser = parse_json)]
        operations: Value,

        /// Continue past failing operations
        #[arg(long)]
        unordered: bool,
    },

    /// Apply many (query, update) pairs in one request
    UpdateBatch {
        /// JSON array of [query, update] pairs
        #[arg(value_parser = parse_json)]
        updates: Value,

        #[arg(long)]
        unordered: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct FindArgs {
    #[arg(short, long)]
    pub limit: Option<i64>,

    #[arg(short, long)]
    pub skip: Option<u64>,

    /// Sort keys as field:asc or field:desc, in priority order
    #[arg(long, value_delimiter = ',')]
    pub sort: Vec<String>,

    /// Projection as a JSON object
    #[arg(long, value_parser = parse_object)]
    pub projection: Option<Map<String, Value>>,
}

impl FindArgs {
    /// `None` when no flag was given, so the command tuple stays short
    pub fn to_options(&self) -> Result<Option<FindOptions>> {
        if self.limit.is_none()
            && self.skip.is_none()
            && self.sort.is_empty()
            && self.projection.is_none()
        {
            return Ok(None);
        }

        let mut options = FindOptions::default();
        if let Some(limit) = self.limit {
            options = options.with_limit(limit);
        }
        if let Some(skip) = self.skip {
            options = options.with_skip(skip);
        }
        if !self.sort.is_empty() {
            options = options.with_sort(parse_sort(&self.sort)?);
        }
        if let Some(projection) = &self.projection {
            options = options.with_projection(projection.clone());
        }
        Ok(Some(options))
    }
}

/// Execute one subcommand, returning the JSON to print
#[instrument(skip_all)]
pub async fn run(client: &InventoryClient, command: Commands) -> Result<Value> {
    let output = match command {
        Commands::Create { item, options } => {
            let options = options.map(WriteOptions::from);
            let created: Value = client.create(&item, options.as_ref()).await?;
            created
        }
        Commands::Find { query, find } => {
            let options = find.to_options()?;
            let items: Vec<Value> = client.find_flexible(&query, options.as_ref()).await?;
            info!(count = items.len(), "Items found");
            Value::Array(items)
        }
        Commands::FindOne { query, find } => {
            let item: Option<Value> = client
                .find_one_flexible(&query, find.to_options()?)
                .await?;
            item.unwrap_or(Value::Null)
        }
        Commands::Update {
            query,
            update,
            upsert,
        } => {
            let result = client
                .update(&query, &update, update_options(upsert).as_ref())
                .await?;
            serde_json::to_value(result)?
        }
        Commands::UpdateMany {
            query,
            update,
            upsert,
        } => {
            let result = client
                .update_many(&query, &update, update_options(upsert).as_ref())
                .await?;
            serde_json::to_value(result)?
        }
        Commands::Delete { query } => serde_json::to_value(client.delete(&query, None).await?)?,
        Commands::DeleteOne { query } => {
            serde_json::to_value(client.delete_one(&query, None).await?)?
        }
        Commands::DeleteMany { query } => {
            serde_json::to_value(client.delete_many(&query, None).await?)?
        }
        Commands::Aggregate {
            pipeline,
            allow_disk_use,
            batch_size,
        } => {
            if !pipeline.is_array() {
                bail!("Pipeline must be a JSON array of stages");
            }
            let options = aggregate_options(allow_disk_use, batch_size);
            let rows: Vec<Value> = client.aggregate(&pipeline, options.as_ref()).await?;
            Value::Array(rows)
        }
        Commands::BulkWrite {
            operations,
            unordered,
        } => {
            let operations: Vec<BulkOperation> = serde_json::from_value(operations)
                .wrap_err("Operations must be a JSON array of bulk operations")?;
            let result = client
                .bulk_write(&operations, bulk_options(unordered).as_ref())
                .await?;
            serde_json::to_value(result)?
        }
        Commands::UpdateBatch { updates, unordered } => {
            let updates: Vec<(Value, Value)> = serde_json::from_value(updates)
                .wrap_err("Updates must be a JSON array of [query, update] pairs")?;
            let result = client
                .update_batch(&updates, bulk_options(unordered).as_ref())
                .await?;
            serde_json::to_value(result)?
        }
    };
    Ok(output)
}

fn update_options(upsert: bool) -> Option<UpdateOptions> {
    upsert.then(|| UpdateOptions { upsert: Some(true) })
}

fn aggregate_options(allow_disk_use: bool, batch_size: Option<u32>) -> Option<AggregateOptions> {
    (allow_disk_use || batch_size.is_some()).then(|| AggregateOptions {
        allow_disk_use: allow_disk_use.then_some(true),
        batch_size,
    })
}

fn bulk_options(unordered: bool) -> Option<BulkWriteOptions> {
    unordered.then(|| BulkWriteOptions {
        ordered: Some(false),
    })
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {}", e))
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, String> {
    match parse_json(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(format!("expected a JSON object, got {}", other)),
    }
}

fn parse_sort(keys: &[String]) -> Result<SortSpec> {
    keys.iter().try_fold(SortSpec::new(), |spec, key| {
        let (field, order) = key.split_once(':').unwrap_or((key.as_str(), "asc"));
        match order.to_ascii_lowercase().as_str() {
            "asc" | "1" => Ok(spec.ascending(field)),
            "desc" | "-1" => Ok(spec.descending(field)),
            _ => bail!("Unknown sort order '{}' for field '{}'", order, field),
        }
    })
}

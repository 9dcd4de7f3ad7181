//! Inventory Store Client
//!
//! Performs CRUD, batch and aggregation operations against a remote
//! inventory store through a single signed HTTP endpoint (`{base}/query`),
//! using a MongoDB-style query/update/aggregate vocabulary.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐
//! │ InventoryClient│  ← public operations (+ ClientRegistry)
//! └───────┬────────┘
//!         │ Command   ["find", query, options?]
//! ┌───────▼────────┐
//! │     Signer     │  ← HMAC-SHA256 over key id, public key and body
//! └───────┬────────┘
//! ┌───────▼────────┐
//! │   Transport    │  ← one POST per command (reqwest)
//! └───────┬────────┘
//! ┌───────▼────────┐
//! │   Classifier   │  ← Validation / Authentication / Network errors
//! └────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use inventory_client::{ClientConfig, Filter, InventoryClient, Operator, UpdateDocument};
//! use serde_json::{Value, json};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = InventoryClient::new(ClientConfig::new("key-id", "secret", "public-key"))?;
//!
//! let low_stock: Vec<Value> = client
//!     .find(&Filter::new().field("quantity", Operator::Lt(5.into())), None)
//!     .await?;
//!
//! client
//!     .update(
//!         &Filter::new().eq("sku", "X-1"),
//!         &UpdateDocument::new().set("$inc", json!({"quantity": 10})),
//!         None,
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod models;
pub mod options;
pub mod query;
pub mod registry;
pub mod signer;
pub mod transport;

// Re-export commonly used types
pub use client::InventoryClient;
pub use command::{Command, Operation};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{ErrorDetails, InventoryError, Result, ValidationErrorItem, ValidationFailure};
pub use models::{BulkOperation, BulkWriteResult, DeleteResult, Stage, UpdateDocument, UpdateResult};
pub use options::{
    AggregateOptions, BulkWriteOptions, FindOptions, SortOrder, SortSpec, UpdateOptions,
    WriteOptions,
};
pub use query::{Condition, Filter, Operator};
pub use registry::ClientRegistry;
pub use signer::Credentials;
pub use transport::{HttpTransport, RawResponse, Transport, TransportError, TransportRequest};

//! Client facade
//!
//! Every operation follows the same path: encode the command, snapshot the
//! configuration, sign, send once, classify.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::classify::classify;
use crate::command::Command;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::{BulkOperation, BulkWriteResult, DeleteResult, UpdateResult};
use crate::options::{
    AggregateOptions, BulkWriteOptions, FindOptions, UpdateOptions, WriteOptions,
};
use crate::query::Filter;
use crate::signer;
use crate::transport::{self, HttpTransport, Transport};

/// Signed client for the inventory store
///
/// # Example
///
/// ```rust,no_run
/// use inventory_client::{ClientConfig, Filter, FindOptions, InventoryClient};
/// use serde_json::Value;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = InventoryClient::new(
///     ClientConfig::new("key-id", "secret", "public-key")
///         .with_base_url("http://localhost:8080"),
/// )?;
///
/// let items: Vec<Value> = client
///     .find(
///         &Filter::new().eq("category", "widgets"),
///         Some(&FindOptions::default().with_limit(10)),
///     )
///     .await?;
///
/// let first: Option<Value> = client.find_one(&Filter::new().eq("sku", "X-1"), None).await?;
/// # Ok(())
/// # }
/// ```
pub struct InventoryClient<T: Transport = HttpTransport> {
    config: Arc<RwLock<ClientConfig>>,
    transport: Arc<T>,
}

impl InventoryClient<HttpTransport> {
    /// Create a client over the default HTTP transport
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T: Transport> InventoryClient<T> {
    /// Create a client over a caller-supplied transport
    ///
    /// Fails with a configuration error, before any network activity, if a
    /// credential is empty.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            transport: Arc::new(transport),
        })
    }

    /// Current configuration
    pub async fn config(&self) -> ClientConfig {
        self.config.read().await.clone()
    }

    /// Replace credentials and base URL; takes effect on the next call
    ///
    /// Calls that already captured the previous configuration complete with it.
    pub async fn set_config(&self, config: ClientConfig) -> Result<()> {
        config.validate()?;
        *self.config.write().await = config;
        debug!("Inventory client configuration replaced");
        Ok(())
    }

    #[instrument(skip_all, fields(operation = %command.operation()))]
    async fn execute<R: DeserializeOwned>(&self, command: Command) -> Result<R> {
        let config = self.config.read().await.clone();

        let signed = signer::sign_command(&config.credentials(), &command)?;
        debug!(
            base_url = %config.base_url(),
            bytes = signed.body.len(),
            "Sending inventory command"
        );

        let outcome = transport::invoke(self.transport.as_ref(), config.base_url(), &signed).await;
        let result = classify(outcome);

        match &result {
            Ok(_) => debug!("Inventory command succeeded"),
            Err(e) => warn!(
                error = %e,
                status = ?e.status_code(),
                request_id = ?e.request_id(),
                "Inventory command failed"
            ),
        }

        result
    }

    /// Insert one item, returning the stored item
    pub async fn create<D>(&self, item: &D, options: Option<&WriteOptions>) -> Result<D>
    where
        D: Serialize + DeserializeOwned,
    {
        self.execute(Command::insert_one(item, options)?).await
    }

    /// Find items matching a typed filter
    pub async fn find<D: DeserializeOwned>(
        &self,
        query: &Filter,
        options: Option<&FindOptions>,
    ) -> Result<Vec<D>> {
        self.find_flexible(query, options).await
    }

    /// First item matching a typed filter, or `None`
    ///
    /// The limit is always forced to 1; a larger caller limit is discarded.
    pub async fn find_one<D: DeserializeOwned>(
        &self,
        query: &Filter,
        options: Option<FindOptions>,
    ) -> Result<Option<D>> {
        self.find_one_flexible(query, options).await
    }

    /// Find with any serializable query document, forwarded verbatim
    pub async fn find_flexible<Q, D>(
        &self,
        query: &Q,
        options: Option<&FindOptions>,
    ) -> Result<Vec<D>>
    where
        Q: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        self.execute(Command::find(query, options)?).await
    }

    /// `find_one` with any serializable query document
    pub async fn find_one_flexible<Q, D>(
        &self,
        query: &Q,
        options: Option<FindOptions>,
    ) -> Result<Option<D>>
    where
        Q: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        let items: Vec<D> = self.execute(Command::find_one(query, options)?).await?;
        Ok(items.into_iter().next())
    }

    /// Update the first matching item (`findOneAndUpdate`)
    pub async fn update<Q, U>(
        &self,
        query: &Q,
        update: &U,
        options: Option<&UpdateOptions>,
    ) -> Result<UpdateResult>
    where
        Q: Serialize + ?Sized,
        U: Serialize + ?Sized,
    {
        self.execute(Command::find_one_and_update(query, update, options)?)
            .await
    }

    /// Update every matching item
    pub async fn update_many<Q, U>(
        &self,
        query: &Q,
        update: &U,
        options: Option<&UpdateOptions>,
    ) -> Result<UpdateResult>
    where
        Q: Serialize + ?Sized,
        U: Serialize + ?Sized,
    {
        self.execute(Command::update_many(query, update, options)?)
            .await
    }

    /// Soft delete: mark the first matching item `deleted.status = true`
    pub async fn delete<Q: Serialize + ?Sized>(
        &self,
        query: &Q,
        options: Option<&WriteOptions>,
    ) -> Result<UpdateResult> {
        self.execute(Command::soft_delete(query, options)?).await
    }

    /// Remove the first matching item
    pub async fn delete_one<Q: Serialize + ?Sized>(
        &self,
        query: &Q,
        options: Option<&WriteOptions>,
    ) -> Result<DeleteResult> {
        self.execute(Command::delete_one(query, options)?).await
    }

    /// Remove every matching item
    pub async fn delete_many<Q: Serialize + ?Sized>(
        &self,
        query: &Q,
        options: Option<&WriteOptions>,
    ) -> Result<DeleteResult> {
        self.execute(Command::delete_many(query, options)?).await
    }

    /// Run an aggregate pipeline; stages reach the server in the given order
    pub async fn aggregate<P, D>(
        &self,
        pipeline: &P,
        options: Option<&AggregateOptions>,
    ) -> Result<Vec<D>>
    where
        P: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        self.execute(Command::aggregate(pipeline, options)?).await
    }

    /// Apply tagged write operations in one request, in the given order
    pub async fn bulk_write(
        &self,
        operations: &[BulkOperation],
        options: Option<&BulkWriteOptions>,
    ) -> Result<BulkWriteResult> {
        self.execute(Command::bulk_write(operations, options)?).await
    }

    /// Apply `(query, update)` pairs as one `bulkWrite` of `updateOne`s
    pub async fn update_batch<Q, U>(
        &self,
        updates: &[(Q, U)],
        options: Option<&BulkWriteOptions>,
    ) -> Result<BulkWriteResult>
    where
        Q: Serialize,
        U: Serialize,
    {
        self.execute(Command::update_batch(updates, options)?).await
    }
}

impl<T: Transport> Clone for InventoryClient<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> fmt::Debug for InventoryClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("InventoryClient");
        match self.config.try_read() {
            Ok(config) => out.field("config", &*config),
            Err(_) => out.field("config", &"<locked>"),
        };
        out.finish_non_exhaustive()
    }
}

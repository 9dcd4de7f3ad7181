//! Client registry
//!
//! Holds at most one configured client so application code can reach it
//! without threading a reference through every call. The registry itself is
//! an ordinary value: create one at startup and share it (for example in
//! application state).

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::client::InventoryClient;
use crate::config::ClientConfig;
use crate::error::{InventoryError, Result};
use crate::models::{BulkOperation, BulkWriteResult, DeleteResult, UpdateResult};
use crate::options::{
    AggregateOptions, BulkWriteOptions, FindOptions, UpdateOptions, WriteOptions,
};
use crate::query::Filter;
use crate::transport::{HttpTransport, Transport};

const ALREADY_INITIALIZED: &str = "Inventory client is already initialized";
const NOT_INITIALIZED: &str = "Inventory client must be initialized first";

/// Registry owning the single active client
pub struct ClientRegistry<T: Transport = HttpTransport> {
    slot: RwLock<Option<Arc<InventoryClient<T>>>>,
}

impl<T: Transport> Default for ClientRegistry<T> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl ClientRegistry<HttpTransport> {
    /// Build and install a client over the default HTTP transport
    pub async fn initialize(&self, config: ClientConfig) -> Result<Arc<InventoryClient>> {
        self.install(InventoryClient::new(config)?).await
    }
}

impl<T: Transport> ClientRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an already-built client; fails if one is active
    pub async fn install(&self, client: InventoryClient<T>) -> Result<Arc<InventoryClient<T>>> {
        let mut slot = self.slot.write().await;
        if slot.is_some() {
            return Err(InventoryError::configuration(ALREADY_INITIALIZED));
        }
        let client = Arc::new(client);
        *slot = Some(Arc::clone(&client));
        info!("Inventory client initialized");
        Ok(client)
    }

    /// Drop the active client, returning it if there was one
    pub async fn reset(&self) -> Option<Arc<InventoryClient<T>>> {
        let previous = self.slot.write().await.take();
        if previous.is_some() {
            info!("Inventory client reset");
        }
        previous
    }

    pub async fn is_initialized(&self) -> bool {
        self.slot.read().await.is_some()
    }

    /// The active client, or a configuration error when none is installed
    pub async fn client(&self) -> Result<Arc<InventoryClient<T>>> {
        self.slot
            .read()
            .await
            .clone()
            .ok_or_else(|| InventoryError::configuration(NOT_INITIALIZED))
    }

    pub async fn set_config(&self, config: ClientConfig) -> Result<()> {
        self.client().await?.set_config(config).await
    }

    pub async fn create<D>(&self, item: &D, options: Option<&WriteOptions>) -> Result<D>
    where
        D: Serialize + DeserializeOwned,
    {
        self.client().await?.create(item, options).await
    }

    pub async fn find<D: DeserializeOwned>(
        &self,
        query: &Filter,
        options: Option<&FindOptions>,
    ) -> Result<Vec<D>> {
        self.client().await?.find(query, options).await
    }

    pub async fn find_one<D: DeserializeOwned>(
        &self,
        query: &Filter,
        options: Option<FindOptions>,
    ) -> Result<Option<D>> {
        self.client().await?.find_one(query, options).await
    }

    pub async fn find_flexible<Q, D>(
        &self,
        query: &Q,
        options: Option<&FindOptions>,
    ) -> Result<Vec<D>>
    where
        Q: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        self.client().await?.find_flexible(query, options).await
    }

    pub async fn find_one_flexible<Q, D>(
        &self,
        query: &Q,
        options: Option<FindOptions>,
    ) -> Result<Option<D>>
    where
        Q: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        self.client().await?.find_one_flexible(query, options).await
    }

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
        self.client().await?.update(query, update, options).await
    }

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
        self.client().await?.update_many(query, update, options).await
    }

    pub async fn delete<Q: Serialize + ?Sized>(
        &self,
        query: &Q,
        options: Option<&WriteOptions>,
    ) -> Result<UpdateResult> {
        self.client().await?.delete(query, options).await
    }

    pub async fn delete_one<Q: Serialize + ?Sized>(
        &self,
        query: &Q,
        options: Option<&WriteOptions>,
    ) -> Result<DeleteResult> {
        self.client().await?.delete_one(query, options).await
    }

    pub async fn delete_many<Q: Serialize + ?Sized>(
        &self,
        query: &Q,
        options: Option<&WriteOptions>,
    ) -> Result<DeleteResult> {
        self.client().await?.delete_many(query, options).await
    }

    pub async fn aggregate<P, D>(
        &self,
        pipeline: &P,
        options: Option<&AggregateOptions>,
    ) -> Result<Vec<D>>
    where
        P: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        self.client().await?.aggregate(pipeline, options).await
    }

    pub async fn bulk_write(
        &self,
        operations: &[BulkOperation],
        options: Option<&BulkWriteOptions>,
    ) -> Result<BulkWriteResult> {
        self.client().await?.bulk_write(operations, options).await
    }

    pub async fn update_batch<Q, U>(
        &self,
        updates: &[(Q, U)],
        options: Option<&BulkWriteOptions>,
    ) -> Result<BulkWriteResult>
    where
        Q: Serialize,
        U: Serialize,
    {
        self.client().await?.update_batch(updates, options).await
    }
}

//! The layered client.

use std::sync::Arc;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::records::Records;
use crate::store::RecordStore;

/// A store wrapped with awaitable auth, RPC and record operations.
///
/// Every client owns its store handle and configuration; build as many as
/// needed, nothing is shared globally.
pub struct Client<S: RecordStore> {
    store: Arc<S>,
    config: Arc<ClientConfig>,
    records: Records<S>,
}

impl<S: RecordStore> Clone for Client<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            records: self.records.clone(),
        }
    }
}

impl<S: RecordStore> Client<S> {
    /// Wrap a store. The configuration is fixed for the client's lifetime.
    pub fn new(store: S, config: ClientConfig) -> Self {
        let store = Arc::new(store);
        let config = Arc::new(config);
        let records = Records::new(store.clone(), config.clone());
        tracing::debug!(
            split_char = %config.split_char,
            full_paths = config.full_paths,
            id_key = ?config.id_key,
            "client created"
        );
        Self {
            store,
            config,
            records,
        }
    }

    /// Wrap a store using the default configuration.
    pub fn with_defaults(store: S) -> Self {
        Self::new(store, ClientConfig::default())
    }

    /// Record and list operations.
    pub fn record(&self) -> &Records<S> {
        &self.records
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Authenticate; resolves with the session data.
    pub async fn login(&self, credentials: Value) -> Result<Value> {
        let session = self.store.login(credentials).await?;
        tracing::info!("client logged in");
        Ok(session)
    }

    /// Call a remote procedure.
    pub async fn make(&self, name: &str, payload: Value) -> Result<Value> {
        tracing::debug!(rpc = %name, "making rpc");
        self.store.make_rpc(name, payload).await
    }

    /// A fresh unique id from the store.
    pub fn uid(&self) -> String {
        self.store.new_uid()
    }
}

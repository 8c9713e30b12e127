//! # Tether Client
//!
//! An awaitable record layer over a realtime data-sync backend.
//!
//! The backend itself (connections, subscriptions, wire-level conflict
//! handling) sits behind the [`RecordStore`] trait. On top of it this crate
//! adds:
//!
//! - existence-checked record and list helpers ([`Records`])
//! - merge-mode updates of existing records with locked and protected keys
//!   ([`Records::update_existing_record`], powered by `tether-engine`)
//! - listed records: an index list kept in step with one record per entry
//!   ([`Records::get_dataset_record`], [`Records::delete_dataset_record`])
//! - a [`Client`] facade adding login and RPC
//!
//! ## Quick Start
//!
//! ```rust
//! use tether_client::{Client, ClientConfig, MemoryStore, RecordUpdate, UpdateMode};
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let client = Client::new(MemoryStore::new(), ClientConfig::default());
//!
//! // Create (or fetch) users/u1 and index it in the "users" list
//! client
//!     .record()
//!     .get_dataset_record("users", Some("u1"), Some(json!({"tags": ["a"]})))
//!     .await
//!     .unwrap();
//!
//! // Append to the tags array of the existing record
//! let update = RecordUpdate::new(json!({"tags": ["b"]})).mode(UpdateMode::DeepConcat);
//! client.record().update_existing_record("users/u1", update).await.unwrap();
//!
//! let doc = client.record().snapshot("users/u1").await.unwrap();
//! assert_eq!(doc, json!({"id": "u1", "tags": ["a", "b"]}));
//! # });
//! ```

mod client;
mod config;
mod dataset;
mod error;
mod memory;
mod records;
mod store;
mod update;

pub use client::Client;
pub use config::{ClientConfig, ConfigError};
pub use error::{Error, ErrorKind, Result};
pub use memory::{MemoryList, MemoryRecord, MemoryStore, RpcHandler, WriteEvent};
pub use records::{add_entry, Records};
pub use store::{DocumentHandle, ListHandle, RecordStore};
pub use update::RecordUpdate;

pub use tether_engine::{KeyPolicy, UpdateMode, IGNORE_SENTINEL};

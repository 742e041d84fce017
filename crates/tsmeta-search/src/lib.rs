//! Asynchronous TSMeta indexing for an Elasticsearch document store.
//!
//! This crate writes time-series metadata records to a document store without
//! blocking the calling thread. Each [`DocumentSchema::index`] or
//! [`DocumentSchema::delete`] call builds one HTTP request, hands it to a
//! [`Transport`](transport::Transport) and returns a [`Deferred`] handle that
//! resolves once the store acknowledges, errors, or the request is cancelled.
//!
//! # Architecture
//!
//! - [`config`] - Store settings, from code, serde, or environment variables
//! - [`error`] - The [`SchemaError`] taxonomy
//! - [`deferred`] - Single-assignment result handles
//! - [`transport`] - Request type and the transport callback contract
//! - [`bridge`] - Turns one transport callback into one handle resolution
//! - [`meta`] - The [`TsMeta`] document
//! - [`store`] - The document store collaborator
//! - [`schema`] - Index and delete operations with per-schema counters
//! - `es_transport` - Transport on top of the `elasticsearch` crate
//!   (feature `elasticsearch`, on by default)
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use tsmeta_search::transport::{BufferedResponse, ResponseCallback, StoreRequest, Transport};
//! use tsmeta_search::{ElasticSearch, StoreConfig, TsMeta, TsMetaSchema};
//!
//! // A transport that acknowledges every write immediately.
//! struct AckTransport;
//!
//! impl Transport for AckTransport {
//!     fn execute_async(&self, _request: StoreRequest, callback: Box<dyn ResponseCallback>) {
//!         callback.completed(Box::new(BufferedResponse::new(204, "")));
//!     }
//! }
//!
//! let store = ElasticSearch::new(StoreConfig::default(), Arc::new(AckTransport));
//! let schema = TsMetaSchema::new(Arc::new(store)).unwrap();
//!
//! assert!(schema.index(&TsMeta::new("010101")).join().unwrap());
//! assert_eq!(schema.added(), 1);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bridge;
pub mod config;
pub mod deferred;
pub mod error;
#[cfg(feature = "elasticsearch")]
pub mod es_transport;
pub mod meta;
pub mod schema;
pub mod store;
pub mod transport;

pub use config::StoreConfig;
pub use deferred::Deferred;
pub use error::{SchemaError, SchemaResult};
#[cfg(feature = "elasticsearch")]
pub use es_transport::EsTransport;
pub use meta::{Document, TsMeta, UidMeta, UniqueIdType};
pub use schema::{DocumentSchema, SchemaStats, TsMetaSchema};
pub use store::{ElasticSearch, SearchStore};

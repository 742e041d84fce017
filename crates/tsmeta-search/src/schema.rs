//! Document schema: turns entities into index and delete requests.
//!
//! A [`DocumentSchema`] writes documents to `{host}/{doc_type}/{id}`, adding
//! `?replication=async` when the store asks for it. Calls return a
//! [`Deferred`] at once; the outcome arrives when the transport reports back.
//!
//! # Example
//!
//! ```ignore
//! use tsmeta_search::{ElasticSearch, StoreConfig, TsMeta, TsMetaSchema};
//!
//! let (store, _transport) = ElasticSearch::connect(StoreConfig::from_env(), runtime)?;
//! let schema = TsMetaSchema::new(Arc::new(store))?;
//! let indexed = schema.index(&TsMeta::new("010101")).await?;
//! ```

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use crate::bridge::{Counters, Operation, ResponseBridge};
use crate::config::TSMETA_TYPE_KEY;
use crate::deferred::Deferred;
use crate::error::{SchemaError, SchemaResult};
use crate::meta::{Document, TsMeta};
use crate::store::SearchStore;
use crate::transport::StoreRequest;

/// Schema for [`TsMeta`] documents.
pub type TsMetaSchema = DocumentSchema<TsMeta>;

/// Point-in-time copy of a schema's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaStats {
    /// Successfully indexed documents.
    pub added: u64,
    /// Successfully deleted documents.
    pub deleted: u64,
    /// Requests that ended in any error.
    pub errors: u64,
}

/// Writes documents of type `D` to the store.
pub struct DocumentSchema<D> {
    store: Arc<dyn SearchStore>,
    doc_type: String,
    counters: Arc<Counters>,
    _document: PhantomData<fn(&D)>,
}

impl<D> Debug for DocumentSchema<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSchema")
            .field("doc_type", &self.doc_type)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl<D: Document> DocumentSchema<D> {
    /// Creates a schema on `store`.
    ///
    /// Fails with [`SchemaError::Configuration`] when the document type
    /// setting is missing or empty.
    pub fn new(store: Arc<dyn SearchStore>) -> SchemaResult<Self> {
        let doc_type = store
            .config()
            .tsmeta_type()
            .map(str::to_string)
            .ok_or_else(|| SchemaError::Configuration {
                key: TSMETA_TYPE_KEY.to_string(),
                message: "document type must be set and non-empty".to_string(),
            })?;

        Ok(Self {
            store,
            doc_type,
            counters: Arc::new(Counters::default()),
            _document: PhantomData,
        })
    }

    /// Sends `document` to the store, creating or replacing it.
    ///
    /// Resolves to `true` on success or an error on failure.
    pub fn index(&self, document: &D) -> Deferred<bool> {
        let id = document.document_id();
        if id.is_empty() {
            return Deferred::from_error(SchemaError::invalid_argument(
                "Meta must have a non-empty TSUID.",
            ));
        }

        let body = match document.to_bytes() {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to serialize document {}: {}", id, e);
                self.counters.record_error();
                return Deferred::from_error(e);
            }
        };

        let request = StoreRequest::post(self.store.host(), self.document_path(id), body);
        self.submit(request, Operation::Index)
    }

    /// Deletes the document stored under `id`.
    ///
    /// Resolves to `true` on success or an error on failure.
    pub fn delete(&self, id: &str) -> Deferred<bool> {
        if id.is_empty() {
            return Deferred::from_error(SchemaError::invalid_argument(
                "TSUID cannot be null or empty.",
            ));
        }

        let request = StoreRequest::delete(self.store.host(), self.document_path(id));
        self.submit(request, Operation::Delete)
    }

    fn document_path(&self, id: &str) -> String {
        format!("/{}/{}", self.doc_type, id)
    }

    fn submit(&self, request: StoreRequest, operation: Operation) -> Deferred<bool> {
        let request = if self.store.async_replication() {
            request.with_param("replication", "async")
        } else {
            request
        };

        tracing::debug!("Submitting {} {} ({})", request.method(), request.uri(), operation);

        let (deferred, resolver) = Deferred::pending();
        let bridge = ResponseBridge::new(resolver, Arc::clone(&self.counters), operation);
        self.store
            .transport()
            .execute_async(request, Box::new(bridge));
        deferred
    }
}

impl<D> DocumentSchema<D> {
    /// Returns the document type configured in `tsd.search.elasticsearch.tsmeta_type`.
    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// Returns the successfully indexed document count.
    pub fn added(&self) -> u64 {
        self.counters.added()
    }

    /// Returns the successfully deleted document count.
    pub fn deleted(&self) -> u64 {
        self.counters.deleted()
    }

    /// Returns the count of operations that ended in an error.
    pub fn errors(&self) -> u64 {
        self.counters.errors()
    }

    /// Returns a snapshot of all counters.
    pub fn stats(&self) -> SchemaStats {
        SchemaStats {
            added: self.added(),
            deleted: self.deleted(),
            errors: self.errors(),
        }
    }
}

//! Test infrastructure for schema integration tests.
//!
//! Provides a transport that records each submitted request and keeps its
//! callback so a test can deliver the outcome later, from any thread.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use tsmeta_search::transport::{
    BufferedResponse, ResponseCallback, StoreRequest, StoreResponse, Transport,
};
use tsmeta_search::{
    ElasticSearch, SchemaResult, SearchStore, StoreConfig, TsMeta, TsMetaSchema, UidMeta,
    UniqueIdType,
};

pub const HOST: &str = "localhost:9092";

/// Transport that parks each request until the test answers it.
#[derive(Default)]
pub struct CapturingTransport {
    requests: Mutex<Vec<StoreRequest>>,
    pending: Mutex<Vec<Box<dyn ResponseCallback>>>,
}

impl CapturingTransport {
    /// Number of requests submitted so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// The most recently submitted request.
    pub fn last_request(&self) -> StoreRequest {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("no request was submitted")
    }

    /// Takes the callback of the most recent unanswered request.
    ///
    /// Earlier callbacks stay parked; dropping one would resolve its handle.
    pub fn take_callback(&self) -> Box<dyn ResponseCallback> {
        self.pending
            .lock()
            .pop()
            .expect("no callback is pending")
    }

    pub fn complete(&self, status: u16, body: &str) {
        self.take_callback()
            .completed(Box::new(BufferedResponse::new(status, body)));
    }

    pub fn cancel(&self) {
        self.take_callback().cancelled();
    }

    pub fn fail(&self, message: &str) {
        self.take_callback().failed(message.to_string().into());
    }
}

impl Transport for CapturingTransport {
    fn execute_async(&self, request: StoreRequest, callback: Box<dyn ResponseCallback>) {
        self.requests.lock().push(request);
        self.pending.lock().push(callback);
    }
}

/// Store whose replication flag can be flipped between requests.
pub struct TestStore {
    config: StoreConfig,
    async_replication: AtomicBool,
    transport: Arc<CapturingTransport>,
}

impl TestStore {
    pub fn set_async_replication(&self, enabled: bool) {
        self.async_replication.store(enabled, Ordering::SeqCst);
    }
}

impl SearchStore for TestStore {
    fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn async_replication(&self) -> bool {
        self.async_replication.load(Ordering::SeqCst)
    }

    fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

pub fn test_config() -> StoreConfig {
    StoreConfig {
        host: HOST.to_string(),
        ..Default::default()
    }
}

pub fn test_store() -> (Arc<TestStore>, Arc<CapturingTransport>) {
    let transport = Arc::new(CapturingTransport::default());
    let store = Arc::new(TestStore {
        config: test_config(),
        async_replication: AtomicBool::new(false),
        transport: Arc::clone(&transport),
    });
    (store, transport)
}

pub fn test_schema() -> (TsMetaSchema, Arc<TestStore>, Arc<CapturingTransport>) {
    let (store, transport) = test_store();
    let schema = TsMetaSchema::new(store.clone()).expect("schema construction failed");
    (schema, store, transport)
}

/// An `ElasticSearch` store over a capturing transport.
pub fn elastic_store(config: StoreConfig) -> (ElasticSearch, Arc<CapturingTransport>) {
    let transport = Arc::new(CapturingTransport::default());
    (ElasticSearch::new(config, transport.clone()), transport)
}

pub fn test_meta() -> TsMeta {
    TsMeta::new("010101")
        .with_display_name("Testing")
        .with_metric(UidMeta::new(UniqueIdType::Metric, &[1], "sys.cpu.user"))
        .with_tags(vec![
            UidMeta::new(UniqueIdType::Tagk, &[1], "host"),
            UidMeta::new(UniqueIdType::Tagv, &[1], "web01"),
        ])
}

pub fn assert_counters(schema: &TsMetaSchema, added: u64, deleted: u64, errors: u64) {
    assert_eq!(schema.added(), added, "added");
    assert_eq!(schema.deleted(), deleted, "deleted");
    assert_eq!(schema.errors(), errors, "errors");
}

/// Response whose body cannot be read, used to exercise classification failures.
pub struct BrokenBodyResponse {
    pub status: u16,
    pub released: Arc<AtomicBool>,
}

impl StoreResponse for BrokenBodyResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn body_text(&mut self) -> SchemaResult<String> {
        Err(tsmeta_search::SchemaError::Transport {
            message: "connection closed mid-body".to_string(),
            source: None,
        })
    }

    fn release(&mut self) -> SchemaResult<()> {
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}

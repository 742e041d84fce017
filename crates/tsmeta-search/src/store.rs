//! Document store handle shared by schemas.

use std::fmt::Debug;
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::transport::Transport;

/// Configuration and transport of the document store a schema writes to.
///
/// The host and the replication flag are read on every request, so an
/// implementation may change them at runtime.
pub trait SearchStore: Send + Sync {
    /// Returns the store configuration.
    fn config(&self) -> &StoreConfig;

    /// Returns the store base address.
    fn host(&self) -> &str {
        &self.config().host
    }

    /// Returns whether writes use asynchronous replication.
    fn async_replication(&self) -> bool {
        self.config().async_replication
    }

    /// Returns the transport requests are submitted through.
    fn transport(&self) -> &dyn Transport;
}

/// The Elasticsearch document store.
pub struct ElasticSearch {
    config: StoreConfig,
    transport: Arc<dyn Transport>,
}

impl Debug for ElasticSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticSearch")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ElasticSearch {
    /// Creates a store that submits requests through `transport`.
    pub fn new(config: StoreConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Creates a store backed by an [`EsTransport`](crate::es_transport::EsTransport)
    /// running on `runtime`.
    #[cfg(feature = "elasticsearch")]
    pub fn connect(
        config: StoreConfig,
        runtime: tokio::runtime::Handle,
    ) -> crate::error::SchemaResult<(Self, Arc<crate::es_transport::EsTransport>)> {
        let transport = Arc::new(crate::es_transport::EsTransport::new(&config, runtime)?);
        tracing::info!("Elasticsearch store configured at {}", config.host);
        let store = Self::new(config, transport.clone());
        Ok((store, transport))
    }
}

impl SearchStore for ElasticSearch {
    fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

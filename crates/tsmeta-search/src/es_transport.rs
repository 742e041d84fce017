//! Elasticsearch HTTP transport.
//!
//! [`EsTransport`] runs each request as a task on a tokio runtime and reports
//! the outcome through the request's [`ResponseCallback`]. Requests are sent to
//! the single node named by the configured host; the request's own host is
//! used only for logging.

use std::fmt::Debug;
use std::time::Duration;

use elasticsearch::http::headers::HeaderMap;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::http::{Method as HttpMethod, Url};
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::config::{HOST_KEY, StoreConfig};
use crate::error::{SchemaError, SchemaResult, TransportFailure};
use crate::transport::{BufferedResponse, Method, ResponseCallback, StoreRequest, Transport};

/// [`Transport`] backed by the `elasticsearch` crate's HTTP transport.
pub struct EsTransport {
    http: elasticsearch::http::transport::Transport,
    runtime: Handle,
    timeout: Duration,
    shutdown: watch::Sender<bool>,
}

impl Debug for EsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EsTransport")
            .field("timeout", &self.timeout)
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

impl EsTransport {
    /// Builds a transport for `config.host` whose requests run on `runtime`.
    pub fn new(config: &StoreConfig, runtime: Handle) -> SchemaResult<Self> {
        let url: Url = config.host.parse().map_err(|e| SchemaError::Configuration {
            key: HOST_KEY.to_string(),
            message: format!("Invalid URL: {}", e),
        })?;

        let timeout = Duration::from_millis(config.request_timeout_ms);
        let http = TransportBuilder::new(SingleNodeConnectionPool::new(url))
            .timeout(timeout)
            .build()
            .map_err(|e| SchemaError::Configuration {
                key: HOST_KEY.to_string(),
                message: format!("Failed to build transport: {}", e),
            })?;

        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            http,
            runtime,
            timeout,
            shutdown,
        })
    }

    /// Cancels every in-flight request and every request submitted afterwards.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down Elasticsearch transport");
        self.shutdown.send_replace(true);
    }

    /// Returns `true` once [`EsTransport::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl Transport for EsTransport {
    fn execute_async(&self, request: StoreRequest, callback: Box<dyn ResponseCallback>) {
        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow_and_update() {
            tracing::debug!("Transport shut down; cancelling {}", request.uri());
            callback.cancelled();
            return;
        }

        let http = self.http.clone();
        let timeout = self.timeout;
        self.runtime.spawn(async move {
            let uri = request.uri();
            let (method, path, params, body) = request.into_parts();
            let method = match method {
                Method::Post => HttpMethod::Post,
                Method::Delete => HttpMethod::Delete,
            };
            let query = (!params.is_empty()).then_some(&params);

            let exchange = async {
                let response = http
                    .send(method, &path, HeaderMap::new(), query, body, Some(timeout))
                    .await?;
                let status = response.status_code().as_u16();
                let text = response.text().await?;
                Ok::<_, elasticsearch::Error>(BufferedResponse::new(status, text))
            };

            tokio::select! {
                Ok(()) = shutdown.changed() => {
                    tracing::debug!("Request {} cancelled by shutdown", uri);
                    callback.cancelled();
                }
                result = exchange => match result {
                    Ok(response) => callback.completed(Box::new(response)),
                    Err(e) => {
                        tracing::debug!("Request {} failed: {}", uri, e);
                        let failure: TransportFailure = Box::new(e);
                        callback.failed(failure);
                    }
                },
            }
        });
    }
}

impl Drop for EsTransport {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

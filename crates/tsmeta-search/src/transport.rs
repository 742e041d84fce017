//! HTTP transport abstraction.
//!
//! The schema never talks to the network directly. It hands a [`StoreRequest`]
//! and a [`ResponseCallback`] to a [`Transport`], which performs the exchange
//! on its own threads and later delivers exactly one of the three callback
//! events.

use std::fmt;

use crate::error::{SchemaError, SchemaResult, TransportFailure};

/// HTTP method of a store request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Create or replace a document.
    Post,
    /// Remove a document.
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A single request against the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRequest {
    method: Method,
    host: String,
    path: String,
    params: Vec<(&'static str, &'static str)>,
    body: Option<Vec<u8>>,
}

impl StoreRequest {
    /// Creates a request with a body.
    pub fn post(host: impl Into<String>, path: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::Post,
            host: host.into(),
            path: path.into(),
            params: Vec::new(),
            body: Some(body),
        }
    }

    /// Creates a request without a body.
    pub fn delete(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            host: host.into(),
            path: path.into(),
            params: Vec::new(),
            body: None,
        }
    }

    /// Appends a query parameter.
    pub fn with_param(mut self, key: &'static str, value: &'static str) -> Self {
        self.params.push((key, value));
        self
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the store base address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the path relative to the host, starting with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query parameters.
    pub fn params(&self) -> &[(&'static str, &'static str)] {
        &self.params
    }

    /// Returns the request body, if any.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Splits the request into its path, query parameters and body.
    pub fn into_parts(self) -> (Method, String, Vec<(&'static str, &'static str)>, Option<Vec<u8>>) {
        (self.method, self.path, self.params, self.body)
    }

    /// Returns the full request URI.
    pub fn uri(&self) -> String {
        let mut uri = format!("{}{}", self.host, self.path);
        for (i, (key, value)) in self.params.iter().enumerate() {
            uri.push(if i == 0 { '?' } else { '&' });
            uri.push_str(key);
            uri.push('=');
            uri.push_str(value);
        }
        uri
    }
}

/// A response delivered to [`ResponseCallback::completed`].
///
/// The receiver owns the response and must call [`StoreResponse::release`]
/// exactly once, whatever it does with the body.
pub trait StoreResponse: Send {
    /// Returns the HTTP status code.
    fn status(&self) -> u16;

    /// Consumes the body as text.
    fn body_text(&mut self) -> SchemaResult<String>;

    /// Releases the underlying connection resources.
    fn release(&mut self) -> SchemaResult<()>;
}

/// Receives the outcome of one request.
///
/// Each event consumes the callback, so at most one of them can fire.
pub trait ResponseCallback: Send {
    /// The store answered.
    fn completed(self: Box<Self>, response: Box<dyn StoreResponse>);

    /// The exchange failed before a response was available.
    fn failed(self: Box<Self>, error: TransportFailure);

    /// The exchange was cancelled.
    fn cancelled(self: Box<Self>);
}

/// Executes store requests asynchronously.
pub trait Transport: Send + Sync {
    /// Starts `request` and returns immediately; `callback` is invoked later
    /// on a thread owned by the transport.
    fn execute_async(&self, request: StoreRequest, callback: Box<dyn ResponseCallback>);
}

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedResponse {
    status: u16,
    body: Option<Vec<u8>>,
}

impl BufferedResponse {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: Some(body.into()),
        }
    }

    /// Returns `true` once the body has been consumed or released.
    pub fn is_released(&self) -> bool {
        self.body.is_none()
    }
}

impl StoreResponse for BufferedResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn body_text(&mut self) -> SchemaResult<String> {
        let body = self
            .body
            .take()
            .ok_or_else(|| SchemaError::transport("response body already consumed"))?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn release(&mut self) -> SchemaResult<()> {
        self.body = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_without_params() {
        let request = StoreRequest::delete("localhost:9092", "/tsmeta/010101");
        assert_eq!(request.uri(), "localhost:9092/tsmeta/010101");
        assert_eq!(request.method(), Method::Delete);
        assert!(request.body().is_none());
    }

    #[test]
    fn test_uri_with_params() {
        let request = StoreRequest::post("localhost:9092", "/tsmeta/010101", b"{}".to_vec())
            .with_param("replication", "async")
            .with_param("refresh", "true");
        assert_eq!(
            request.uri(),
            "localhost:9092/tsmeta/010101?replication=async&refresh=true"
        );
        assert_eq!(request.body(), Some(&b"{}"[..]));
    }

    #[test]
    fn test_into_parts() {
        let request = StoreRequest::post("h", "/t/1", vec![1, 2]).with_param("replication", "async");
        let (method, path, params, body) = request.into_parts();
        assert_eq!(method, Method::Post);
        assert_eq!(path, "/t/1");
        assert_eq!(params, vec![("replication", "async")]);
        assert_eq!(body, Some(vec![1, 2]));
    }

    #[test]
    fn test_buffered_body_consumed_once() {
        let mut response = BufferedResponse::new(500, "WTF?");
        assert_eq!(response.status(), 500);
        assert_eq!(response.body_text().unwrap(), "WTF?");
        assert!(response.is_released());
        assert!(response.body_text().is_err());
        assert!(response.release().is_ok());
    }
}

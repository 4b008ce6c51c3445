//! Operation handlers and the operation table.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Business-logic failure raised by a handler.
///
/// The dispatcher wraps this into a failure response; the original cause
/// survives in the error text rather than disappearing into logs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    /// Human-readable failure reason, forwarded to the caller verbatim.
    pub message: String,
}

impl HandlerError {
    /// Create a handler error from any displayable cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// A named unit of remote work.
///
/// Payload in, data or error out; the envelope lifecycle is entirely the
/// dispatcher's concern.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Execute the operation against an opaque payload.
    async fn handle(&self, payload: Value) -> Result<Value, HandlerError>;
}

/// Adapter registering a plain async closure as a handler.
pub struct FnHandler<F>(F);

impl<F> FnHandler<F> {
    /// Wrap a closure `(payload) -> future of (data | error)`.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> OperationHandler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send,
{
    async fn handle(&self, payload: Value) -> Result<Value, HandlerError> {
        (self.0)(payload).await
    }
}

/// Operation name to handler mapping for one service.
///
/// Built once at service wiring time, then shared read-only with the
/// dispatcher; each service is this table plus queue names over the one
/// shared dispatcher implementation.
#[derive(Default)]
pub struct OperationTable {
    handlers: HashMap<String, Arc<dyn OperationHandler>>,
}

impl OperationTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an operation name.
    ///
    /// Re-registering an operation replaces the previous handler.
    pub fn register(&mut self, operation: impl Into<String>, handler: Arc<dyn OperationHandler>) {
        let operation = operation.into();
        if self.handlers.insert(operation.clone(), handler).is_some() {
            warn!(operation = %operation, "Handler replaced for operation");
        }
    }

    /// Register an async closure for an operation name.
    pub fn register_fn<F, Fut>(&mut self, operation: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.register(operation, Arc::new(FnHandler::new(f)));
    }

    /// Look up the handler for an operation.
    #[must_use]
    pub fn get(&self, operation: &str) -> Option<Arc<dyn OperationHandler>> {
        self.handlers.get(operation).cloned()
    }

    /// Registered operation names.
    #[must_use]
    pub fn operations(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the table has no handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

//! One outbound call and its retry bookkeeping

use reqwest::Method;
use serde_json::Value;

/// An outbound request plus the flag that limits it to one reactive retry
///
/// Created fresh for every call and never shared between calls.
#[derive(Debug, Clone)]
pub struct RequestAttempt {
    method: Method,
    path: String,
    body: Option<Value>,
    already_retried: bool,
}

impl RequestAttempt {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            already_retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub const fn already_retried(&self) -> bool {
        self.already_retried
    }

    pub(crate) const fn mark_retried(&mut self) {
        self.already_retried = true;
    }
}

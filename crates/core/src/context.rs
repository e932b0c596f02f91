use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ActionError;
use crate::permission::PermissionSet;
use crate::types::{HttpVerb, RequestId};

/// Per-request state handed to a freshly constructed action instance.
///
/// A context is owned by exactly one execution and dropped once the
/// response has been produced; it is never shared between requests.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub received_at: DateTime<Utc>,
    pub verb: HttpVerb,
    /// Concrete request path (without query string).
    pub path: String,
    /// Values captured from named path segments.
    pub params: HashMap<String, String>,
    /// Decoded query-string parameters.
    pub query: HashMap<String, String>,
    pub body: Value,
    pub caller_permissions: PermissionSet,
}

impl RequestContext {
    /// Create a context with a fresh request id and an empty body.
    #[must_use]
    pub fn new(verb: HttpVerb, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(Uuid::new_v4().to_string()),
            received_at: Utc::now(),
            verb,
            path: path.into(),
            params: HashMap::new(),
            query: HashMap::new(),
            body: Value::Null,
            caller_permissions: PermissionSet::new(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_caller_permissions(mut self, permissions: PermissionSet) -> Self {
        self.caller_permissions = permissions;
        self
    }

    /// Look up a captured path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Look up a path parameter the route is expected to capture.
    pub fn require_param(&self, name: &str) -> Result<&str, ActionError> {
        self.param(name)
            .ok_or_else(|| ActionError::bad_request(format!("missing path parameter '{name}'")))
    }

    /// Deserialize the body into a typed value. A shape mismatch is the
    /// caller's fault.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, ActionError> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| ActionError::bad_request(format!("invalid request body: {e}")))
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use actroute_core::{
    ActionResult, Fault, GateDecision, HttpVerb, PermissionSet, RequestContext, Validation,
    Violation, ViolationCode, check_permissions, validate_body,
};
use actroute_executor::{ActionExecutor, LifecycleFailure};
use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::DispatchMetrics;
use crate::registry::{DispatchTable, RouteLookup};

/// Transport-neutral input to the dispatch pipeline.
///
/// The body is kept as raw bytes; it is only parsed once the permission
/// gate has passed.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub verb: HttpVerb,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Bytes,
    pub caller_permissions: PermissionSet,
}

impl DispatchRequest {
    pub fn new(verb: HttpVerb, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
            query: HashMap::new(),
            body: Bytes::new(),
            caller_permissions: PermissionSet::new(),
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize `value` as the request body.
    #[must_use]
    pub fn with_json(self, value: &Value) -> Self {
        self.with_body(value.to_string())
    }

    #[must_use]
    pub fn with_caller_permissions(mut self, permissions: PermissionSet) -> Self {
        self.caller_permissions = permissions;
        self
    }
}

/// How a dispatched request ended.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The lifecycle completed; the result goes to the response encoder.
    Completed(ActionResult),
    NotFound,
    MethodNotAllowed { allowed: Vec<HttpVerb> },
    /// The permission gate denied the request. `missing` is diagnostic
    /// only.
    Forbidden { missing: PermissionSet },
    /// The body was malformed or violated the action's schema.
    Invalid(Vec<Violation>),
    /// A lifecycle step failed.
    Failed(LifecycleFailure),
}

/// Runs requests through match, gate, parse, validate, and execute.
///
/// Holds the immutable dispatch table, the executor, and shared counters.
/// Cloning is cheap and every clone dispatches against the same table.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: Arc<DispatchTable>,
    executor: ActionExecutor,
    metrics: Arc<DispatchMetrics>,
}

impl Dispatcher {
    pub fn new(table: DispatchTable, executor: ActionExecutor) -> Self {
        Self {
            table: Arc::new(table),
            executor,
            metrics: Arc::new(DispatchMetrics::default()),
        }
    }

    #[must_use]
    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    #[must_use]
    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    /// Dispatch one request. Every request produces exactly one outcome.
    #[instrument(
        name = "dispatch",
        skip(self, request),
        fields(verb = %request.verb, path = %request.path)
    )]
    pub async fn dispatch(&self, request: DispatchRequest) -> DispatchOutcome {
        self.metrics.increment_dispatched();

        let route = match self.table.lookup(request.verb, &request.path) {
            RouteLookup::Found(route) => route,
            RouteLookup::MethodNotAllowed(allowed) => {
                debug!(?allowed, "path matched under other verbs");
                self.metrics.increment_method_not_allowed();
                return DispatchOutcome::MethodNotAllowed { allowed };
            }
            RouteLookup::NotFound => {
                debug!("no route matched");
                self.metrics.increment_not_found();
                return DispatchOutcome::NotFound;
            }
        };
        let entry = route.entry;
        let descriptor = entry.descriptor();

        if let GateDecision::Denied { missing } =
            check_permissions(descriptor.permissions(), &request.caller_permissions)
        {
            info!(source = entry.source(), %missing, "permission denied");
            self.metrics.increment_forbidden();
            return DispatchOutcome::Forbidden { missing };
        }

        let validator = entry.validator();
        let body = match parse_body(&request.body) {
            Ok(body) => body,
            Err(violation) if validator.is_some() => {
                debug!(source = entry.source(), "malformed request body");
                self.metrics.increment_invalid();
                return DispatchOutcome::Invalid(vec![violation]);
            }
            // No declared body contract, so an unparseable body is ignored.
            Err(_) => Value::Null,
        };

        if let Validation::Invalid(violations) = validate_body(validator, &body) {
            debug!(
                source = entry.source(),
                violations = violations.len(),
                "request body failed validation"
            );
            self.metrics.increment_invalid();
            return DispatchOutcome::Invalid(violations);
        }

        let ctx = RequestContext::new(request.verb, request.path)
            .with_params(route.params)
            .with_query(request.query)
            .with_body(body)
            .with_caller_permissions(request.caller_permissions);

        match self.executor.execute(entry.factory(), ctx).await {
            Ok(result) => {
                self.metrics.increment_completed();
                DispatchOutcome::Completed(result)
            }
            Err(failure) => {
                match failure.fault() {
                    Fault::Caller => {
                        warn!(
                            source = entry.source(),
                            state = %failure.state,
                            error = %failure.error,
                            "action rejected request"
                        );
                        self.metrics.increment_caller_faults();
                    }
                    Fault::Internal => {
                        error!(
                            source = entry.source(),
                            state = %failure.state,
                            error = %failure.error,
                            "action failed"
                        );
                        self.metrics.increment_internal_faults();
                    }
                }
                DispatchOutcome::Failed(failure)
            }
        }
    }
}

/// Parse a raw body. An empty or whitespace-only body is `null`.
fn parse_body(raw: &[u8]) -> Result<Value, Violation> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(raw).map_err(|e| {
        Violation::new(
            "",
            ViolationCode::InvalidJson,
            format!("request body is not valid JSON: {e}"),
        )
    })
}

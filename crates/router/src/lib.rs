//! Discovery and dispatch for routable actions.
//!
//! [`ActionSource`]s are discovered into an immutable [`DispatchTable`]
//! (optionally mounted under prefixes). A [`Dispatcher`] then takes each
//! request through route matching, the permission gate, body parsing and
//! validation, and finally the lifecycle executor.

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod pattern;
pub mod registry;
pub mod source;

pub use dispatcher::{DispatchOutcome, DispatchRequest, Dispatcher};
pub use error::RouterError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use pattern::{PathPattern, PatternError};
pub use registry::{
    DispatchEntry, DispatchTable, DispatchTableBuilder, RouteInfo, RouteLookup, RouteMatch,
};
pub use source::ActionSource;

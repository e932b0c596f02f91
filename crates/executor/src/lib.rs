//! Lifecycle execution for routable actions.
//!
//! An [`Action`] implements four async steps. An [`ActionFactory`] builds a
//! fresh instance per request and the [`ActionExecutor`] drives it through
//! [`LifecycleState`]s, resolving shared services through an explicitly
//! passed [`ServiceResolver`].

pub mod action;
pub mod executor;
pub mod lifecycle;
pub mod services;

pub use action::{Action, ActionFactory, DynLifecycle};
pub use executor::ActionExecutor;
pub use lifecycle::{LifecycleFailure, LifecycleState};
pub use services::{ServiceError, ServiceRegistry, ServiceResolver};

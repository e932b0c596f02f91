//! Action sets served by the binary.

pub mod orders;

use actroute_executor::ServiceRegistry;
use actroute_router::{ActionSource, DispatchTable};

use crate::error::ServerError;

/// Every action source the server mounts.
pub fn sources() -> Vec<ActionSource> {
    orders::sources()
}

/// Build the dispatch table with every action mounted under `prefix`.
pub fn dispatch_table(prefix: &str) -> Result<DispatchTable, ServerError> {
    Ok(DispatchTable::builder().mount(prefix, sources())?.build())
}

/// Build the service registry the actions resolve from.
pub fn services() -> Result<ServiceRegistry, ServerError> {
    let mut registry = ServiceRegistry::new();
    orders::register_services(&mut registry).map_err(|e| ServerError::Config(e.to_string()))?;
    Ok(registry)
}

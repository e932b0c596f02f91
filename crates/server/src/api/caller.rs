//! Resolution of the permission tokens granted to the caller.

use actroute_core::PermissionSet;
use axum::http::{Extensions, HeaderMap};
use tracing::debug;

use crate::config::PermissionsConfig;

/// Grants attached to a request by an upstream authentication layer.
///
/// When present, this extension takes precedence over the configured
/// permissions header.
#[derive(Debug, Clone, Default)]
pub struct CallerPermissions(pub PermissionSet);

/// Collect the caller's grants: the request extension if set, otherwise the
/// configured header, plus the anonymous grants.
pub fn resolve(
    config: &PermissionsConfig,
    anonymous: &PermissionSet,
    headers: &HeaderMap,
    extensions: &Extensions,
) -> PermissionSet {
    let mut granted = anonymous.clone();

    if let Some(CallerPermissions(set)) = extensions.get::<CallerPermissions>() {
        granted.extend_from(set);
    } else if let Some(name) = config.header.as_deref()
        && let Some(value) = headers.get(name)
    {
        match value.to_str() {
            Ok(raw) => granted.extend_from(&PermissionSet::parse_list(raw)),
            Err(_) => debug!(header = name, "ignoring non-ASCII permissions header"),
        }
    }

    granted
}

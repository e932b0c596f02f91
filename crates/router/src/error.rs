use actroute_core::{HttpVerb, SchemaError};
use thiserror::Error;

use crate::pattern::PatternError;

/// Discovery-time configuration errors. Any of these aborts table
/// construction; a process must not serve from a partially built table.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Two sources declared the same verb and path pattern.
    #[error("duplicate route {verb} {pattern}: declared by '{first}' and '{second}'")]
    DuplicateRoute {
        verb: HttpVerb,
        pattern: String,
        first: String,
        second: String,
    },

    /// An earlier route with the same verb matches every path the new one
    /// would, so the new one could never be reached.
    #[error("route {verb} {pattern} from '{second}' is unreachable: shadowed by {shadowed_by} from '{first}'")]
    ShadowedRoute {
        verb: HttpVerb,
        pattern: String,
        shadowed_by: String,
        first: String,
        second: String,
    },

    /// A source declared a body schema that does not compile.
    #[error("invalid body schema in '{source_name}': {reason}")]
    InvalidSchema {
        source_name: String,
        reason: SchemaError,
    },

    /// A source declared a path that is not a valid pattern.
    #[error("invalid path pattern '{pattern}' in '{source_name}': {reason}")]
    InvalidPattern {
        source_name: String,
        pattern: String,
        reason: PatternError,
    },

    /// A mount prefix that is neither empty nor a slash-led path without a
    /// trailing slash.
    #[error("invalid mount prefix '{0}'")]
    InvalidPrefix(String),
}

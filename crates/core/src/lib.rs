pub mod context;
pub mod descriptor;
pub mod error;
pub mod outcome;
pub mod permission;
pub mod schema;
pub mod types;
pub mod validate;

pub use context::RequestContext;
pub use descriptor::ActionDescriptor;
pub use error::{ActionError, Fault};
pub use outcome::{ActionResult, Payload, ResultKind};
pub use permission::{GateDecision, PermissionSet, check_permissions};
pub use schema::{Field, PropertyType, Schema, ValueType};
pub use types::{HttpVerb, Permission, RequestId, UnsupportedVerb};
pub use validate::{
    BodyValidator, SchemaError, Validation, Violation, ViolationCode, validate_body,
};

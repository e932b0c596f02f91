use serde::{Deserialize, Serialize};

use crate::permission::PermissionSet;
use crate::schema::Schema;
use crate::types::{HttpVerb, Permission};

/// Immutable declaration of one routable action: the verb and path it binds
/// to, the permissions a caller must hold, and an optional body schema.
///
/// Descriptors are built once at startup through the `with_*` methods and
/// are owned by the dispatch table for the lifetime of the process.
///
/// ```
/// use actroute_core::{ActionDescriptor, HttpVerb, PropertyType, Schema};
///
/// let descriptor = ActionDescriptor::new(HttpVerb::Post, "/orders")
///     .with_permissions(["CREATE", "MANAGE"])
///     .with_schema(Schema::new().field("orderId", PropertyType::string_not_empty()));
/// assert_eq!(descriptor.verb(), HttpVerb::Post);
/// assert_eq!(descriptor.permissions().len(), 2);
/// assert!(descriptor.schema().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    verb: HttpVerb,
    path: String,
    #[serde(default)]
    permissions: PermissionSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema: Option<Schema>,
}

impl ActionDescriptor {
    /// Create a public descriptor with no body contract.
    #[must_use]
    pub fn new(verb: HttpVerb, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
            permissions: PermissionSet::new(),
            schema: None,
        }
    }

    /// Require one more permission token.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<Permission>) -> Self {
        self.permissions.insert(permission);
        self
    }

    /// Require every token in `permissions`.
    #[must_use]
    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        for p in permissions {
            self.permissions.insert(p);
        }
        self
    }

    /// Attach a body validation schema.
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn verb(&self) -> HttpVerb {
        self.verb
    }

    /// The declared path pattern, e.g. `/orders/:id`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Whether the descriptor is public (no permissions required).
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Return a copy bound to `path` instead of the declared path. Used when
    /// a source set is mounted under a prefix.
    #[must_use]
    pub fn rebased(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }
}

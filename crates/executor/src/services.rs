//! Explicit dependency resolution for lifecycle hooks.
//!
//! Actions reach shared services (stores, clients) through a
//! [`ServiceResolver`] handed to them at construction time. The resolver is
//! built once at startup and passed into the executor; nothing is looked up
//! from process-global state.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use actroute_core::ActionError;
use thiserror::Error;

/// Errors raised while registering or resolving services.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// No service is registered under the token.
    #[error("service not found: {0}")]
    NotFound(String),

    /// A service exists under the token but has a different type.
    #[error("service '{token}' is not a {expected}")]
    TypeMismatch {
        token: String,
        expected: &'static str,
    },

    /// The token was registered twice.
    #[error("service '{0}' is already registered")]
    Duplicate(String),
}

/// A resolution failure inside a hook is a server-side problem.
impl From<ServiceError> for ActionError {
    fn from(e: ServiceError) -> Self {
        ActionError::internal(e.to_string())
    }
}

type SharedService = Arc<dyn Any + Send + Sync>;

/// Resolves a configured service instance by token.
///
/// Resolution has no effect on routing and never mutates the resolver.
pub trait ServiceResolver: Send + Sync {
    /// Return the type-erased service registered under `token`.
    fn resolve_any(&self, token: &str) -> Option<SharedService>;
}

impl dyn ServiceResolver {
    /// Resolve and downcast a service.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use actroute_executor::{ServiceRegistry, ServiceResolver};
    ///
    /// let mut registry = ServiceRegistry::new();
    /// registry.register("greeting", String::from("hello")).unwrap();
    /// let resolver: Arc<dyn ServiceResolver> = Arc::new(registry);
    /// let greeting = resolver.resolve::<String>("greeting").unwrap();
    /// assert_eq!(greeting.as_str(), "hello");
    /// ```
    pub fn resolve<T: Any + Send + Sync>(&self, token: &str) -> Result<Arc<T>, ServiceError> {
        let service = self
            .resolve_any(token)
            .ok_or_else(|| ServiceError::NotFound(token.to_owned()))?;
        service
            .downcast::<T>()
            .map_err(|_| ServiceError::TypeMismatch {
                token: token.to_owned(),
                expected: type_name::<T>(),
            })
    }
}

/// Map-backed [`ServiceResolver`] populated at startup.
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<String, SharedService>,
}

impl ServiceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an owned service under `token`.
    pub fn register<T: Any + Send + Sync>(
        &mut self,
        token: impl Into<String>,
        service: T,
    ) -> Result<(), ServiceError> {
        self.register_arc(token, Arc::new(service))
    }

    /// Register an already shared service under `token`.
    pub fn register_arc<T: Any + Send + Sync>(
        &mut self,
        token: impl Into<String>,
        service: Arc<T>,
    ) -> Result<(), ServiceError> {
        let token = token.into();
        if self.services.contains_key(&token) {
            return Err(ServiceError::Duplicate(token));
        }
        self.services.insert(token, service);
        Ok(())
    }

    /// Sorted list of registered tokens.
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.services.keys().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceResolver for ServiceRegistry {
    fn resolve_any(&self, token: &str) -> Option<SharedService> {
        self.services.get(token).cloned()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("tokens", &self.tokens())
            .finish()
    }
}

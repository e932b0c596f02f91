use std::collections::HashMap;

use std::sync::Arc;

use actroute_core::{ActionDescriptor, BodyValidator, HttpVerb, PermissionSet};
use actroute_executor::ActionFactory;
use serde::Serialize;
use tracing::debug;

use crate::error::RouterError;
use crate::pattern::{self, PathPattern};
use crate::source::ActionSource;

/// One routable action: its descriptor, parsed pattern, compiled body
/// schema, and factory.
#[derive(Debug, Clone)]
pub struct DispatchEntry {
    descriptor: ActionDescriptor,
    pattern: PathPattern,
    key: String,
    validator: Option<Arc<BodyValidator>>,
    factory: ActionFactory,
    source: String,
}

impl DispatchEntry {
    #[must_use]
    pub fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The descriptor's schema, compiled at discovery.
    #[must_use]
    pub fn validator(&self) -> Option<&BodyValidator> {
        self.validator.as_deref()
    }

    #[must_use]
    pub fn factory(&self) -> &ActionFactory {
        &self.factory
    }

    /// Name of the source the entry was discovered from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// A matched entry plus the captured path segments.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub entry: &'a DispatchEntry,
    pub params: HashMap<String, String>,
}

/// Result of looking a request up in the table.
#[derive(Debug)]
pub enum RouteLookup<'a> {
    Found(RouteMatch<'a>),
    /// The path matches, but only under other verbs.
    MethodNotAllowed(Vec<HttpVerb>),
    NotFound,
}

/// Serializable summary of one route, for introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub verb: HttpVerb,
    pub pattern: String,
    pub permissions: PermissionSet,
    pub source: String,
    pub validated: bool,
}

/// The immutable mapping from `(verb, path)` to executable actions.
///
/// Built once at startup by [`DispatchTable::discover`] or a
/// [`DispatchTableBuilder`]; there is no way to add or remove routes
/// afterwards. Lookups take `&self` and are safe from any number of tasks.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    entries: Vec<DispatchEntry>,
}

impl DispatchTable {
    /// Discover `sources` at the root, without a prefix.
    ///
    /// ```
    /// use actroute_core::{ActionDescriptor, ActionError, ActionResult, HttpVerb};
    /// use actroute_executor::{Action, ActionFactory};
    /// use actroute_router::{ActionSource, DispatchTable};
    ///
    /// struct Ping;
    ///
    /// impl Action for Ping {
    ///     type Output = ();
    ///     async fn do_action(&mut self) -> Result<(), ActionError> { Ok(()) }
    ///     async fn get_result(self, _: ()) -> Result<ActionResult, ActionError> {
    ///         Ok(ActionResult::json(serde_json::json!("pong")))
    ///     }
    /// }
    ///
    /// let table = DispatchTable::discover([ActionSource::new(
    ///     "ping",
    ///     ActionDescriptor::new(HttpVerb::Get, "/ping"),
    ///     ActionFactory::new(|_, _| Ping),
    /// )])
    /// .unwrap();
    /// assert!(table.match_route(HttpVerb::Get, "/ping").is_some());
    /// ```
    pub fn discover<I>(sources: I) -> Result<Self, RouterError>
    where
        I: IntoIterator<Item = ActionSource>,
    {
        Ok(Self::builder().discover(sources)?.build())
    }

    #[must_use]
    pub fn builder() -> DispatchTableBuilder {
        DispatchTableBuilder::default()
    }

    /// Find the entry for `verb` and `path`, distinguishing an unknown path
    /// from a known path requested with the wrong verb. The first
    /// registered pattern that matches wins.
    #[must_use]
    pub fn lookup(&self, verb: HttpVerb, path: &str) -> RouteLookup<'_> {
        let mut allowed = Vec::new();
        for entry in &self.entries {
            let Some(params) = entry.pattern.matches(path) else {
                continue;
            };
            let entry_verb = entry.descriptor.verb();
            if entry_verb == verb {
                return RouteLookup::Found(RouteMatch { entry, params });
            }
            if !allowed.contains(&entry_verb) {
                allowed.push(entry_verb);
            }
        }

        if allowed.is_empty() {
            RouteLookup::NotFound
        } else {
            allowed.sort_unstable();
            RouteLookup::MethodNotAllowed(allowed)
        }
    }

    /// Find the entry for `verb` and `path`, if any.
    #[must_use]
    pub fn match_route(&self, verb: HttpVerb, path: &str) -> Option<RouteMatch<'_>> {
        match self.lookup(verb, path) {
            RouteLookup::Found(m) => Some(m),
            RouteLookup::MethodNotAllowed(_) | RouteLookup::NotFound => None,
        }
    }

    /// All routes in registration order.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.entries
            .iter()
            .map(|e| RouteInfo {
                verb: e.descriptor.verb(),
                pattern: e.pattern.as_str().to_owned(),
                permissions: e.descriptor.permissions().clone(),
                source: e.source.clone(),
                validated: e.descriptor.schema().is_some(),
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulates source sets, optionally under path prefixes, into a
/// [`DispatchTable`].
#[derive(Debug, Default)]
pub struct DispatchTableBuilder {
    entries: Vec<DispatchEntry>,
}

impl DispatchTableBuilder {
    /// Discover `sources` without a prefix.
    pub fn discover<I>(self, sources: I) -> Result<Self, RouterError>
    where
        I: IntoIterator<Item = ActionSource>,
    {
        self.mount("", sources)
    }

    /// Discover `sources` with every path placed under `prefix`.
    ///
    /// `prefix` must be empty or start with `/`, and must not end with `/`.
    /// Sources without a route are skipped. Re-discovering a source that is
    /// already registered with an identical descriptor is a no-op; any
    /// other clash on `(verb, pattern)` is an error naming both sources, as
    /// is a route that an earlier route with the same verb fully shadows.
    pub fn mount<I>(mut self, prefix: &str, sources: I) -> Result<Self, RouterError>
    where
        I: IntoIterator<Item = ActionSource>,
    {
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            return Err(RouterError::InvalidPrefix(prefix.to_owned()));
        }
        for source in sources {
            self.register(prefix, source)?;
        }
        Ok(self)
    }

    fn register(&mut self, prefix: &str, source: ActionSource) -> Result<(), RouterError> {
        let Some(declared) = source.descriptor().filter(|_| source.is_routable()) else {
            debug!(source = source.name(), "skipping source without a route");
            return Ok(());
        };

        let path = pattern::join(prefix, declared.path());
        let pattern = PathPattern::parse(&path).map_err(|reason| RouterError::InvalidPattern {
            source_name: source.name().to_owned(),
            pattern: path.clone(),
            reason,
        })?;
        let descriptor = if prefix.is_empty() {
            declared.clone()
        } else {
            declared.rebased(path)
        };
        let key = pattern.key();

        if let Some(existing) = self
            .entries
            .iter()
            .find(|e| e.descriptor.verb() == descriptor.verb() && e.key == key)
        {
            if existing.source == source.name() && existing.descriptor == descriptor {
                debug!(source = source.name(), pattern = %pattern, "route already registered");
                return Ok(());
            }
            return Err(RouterError::DuplicateRoute {
                verb: descriptor.verb(),
                pattern: pattern.as_str().to_owned(),
                first: existing.source.clone(),
                second: source.name().to_owned(),
            });
        }

        if let Some(earlier) = self
            .entries
            .iter()
            .find(|e| e.descriptor.verb() == descriptor.verb() && e.pattern.covers(&pattern))
        {
            return Err(RouterError::ShadowedRoute {
                verb: descriptor.verb(),
                pattern: pattern.as_str().to_owned(),
                shadowed_by: earlier.pattern.as_str().to_owned(),
                first: earlier.source.clone(),
                second: source.name().to_owned(),
            });
        }

        let validator = descriptor
            .schema()
            .map(|schema| {
                BodyValidator::compile(schema).map_err(|reason| RouterError::InvalidSchema {
                    source_name: source.name().to_owned(),
                    reason,
                })
            })
            .transpose()?
            .map(Arc::new);

        debug!(
            source = source.name(),
            verb = %descriptor.verb(),
            pattern = %pattern,
            "registered route"
        );
        self.entries.push(DispatchEntry {
            factory: source.factory().clone(),
            source: source.name().to_owned(),
            descriptor,
            pattern,
            key,
            validator,
        });
        Ok(())
    }

    pub fn build(self) -> DispatchTable {
        DispatchTable {
            entries: self.entries,
        }
    }
}

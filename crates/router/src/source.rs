use actroute_core::ActionDescriptor;
use actroute_executor::ActionFactory;

/// One candidate for discovery: a named action definition with an optional
/// route declaration.
///
/// A source without a descriptor (or with an empty path) is not routable
/// and is skipped during discovery without error. This allows a source set
/// to carry helpers or work-in-progress actions that have no route yet.
#[derive(Debug, Clone)]
pub struct ActionSource {
    name: String,
    descriptor: Option<ActionDescriptor>,
    factory: ActionFactory,
}

impl ActionSource {
    /// A routable source.
    pub fn new(name: impl Into<String>, descriptor: ActionDescriptor, factory: ActionFactory) -> Self {
        Self {
            name: name.into(),
            descriptor: Some(descriptor),
            factory,
        }
    }

    /// A source that declares no route.
    pub fn unrouted(name: impl Into<String>, factory: ActionFactory) -> Self {
        Self {
            name: name.into(),
            descriptor: None,
            factory,
        }
    }

    /// Identifier used in diagnostics, e.g. `orders::create`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn descriptor(&self) -> Option<&ActionDescriptor> {
        self.descriptor.as_ref()
    }

    #[must_use]
    pub fn factory(&self) -> &ActionFactory {
        &self.factory
    }

    /// Whether the source declares at least a verb and a non-empty path.
    #[must_use]
    pub fn is_routable(&self) -> bool {
        self.descriptor.as_ref().is_some_and(|d| !d.path().is_empty())
    }
}

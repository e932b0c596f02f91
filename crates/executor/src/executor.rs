use std::sync::Arc;

use actroute_core::{ActionResult, RequestContext};
use tracing::{debug, instrument};

use crate::action::ActionFactory;
use crate::lifecycle::{LifecycleFailure, RunTracker};
use crate::services::ServiceResolver;

/// Drives action instances through their lifecycle.
///
/// The executor holds only the service resolver it was built with; every
/// call to [`execute`](Self::execute) constructs a fresh instance, so
/// concurrent executions never share per-request state.
#[derive(Clone)]
pub struct ActionExecutor {
    services: Arc<dyn ServiceResolver>,
}

impl ActionExecutor {
    /// Create an executor that hands `services` to every action it builds.
    pub fn new(services: Arc<dyn ServiceResolver>) -> Self {
        Self { services }
    }

    /// Run one lifecycle to completion.
    ///
    /// Steps run strictly in order; the first failing step ends the run and
    /// later steps are never invoked. No timeout is applied here. If the
    /// returned future is dropped mid-run, no further steps run and the
    /// action instance (with anything it owns) is dropped.
    #[instrument(
        name = "lifecycle",
        level = "debug",
        skip_all,
        fields(action = factory.name(), request_id = %ctx.request_id)
    )]
    pub async fn execute(
        &self,
        factory: &ActionFactory,
        ctx: RequestContext,
    ) -> Result<ActionResult, LifecycleFailure> {
        let mut tracker = RunTracker::new(factory.name(), ctx.request_id.clone());
        let mut instance = factory.instantiate(ctx, &self.services);

        tracker.advance();
        if let Err(e) = instance.pre_action().await {
            return Err(tracker.fail(e));
        }

        tracker.advance();
        if let Err(e) = instance.do_action().await {
            return Err(tracker.fail(e));
        }

        tracker.advance();
        if let Err(e) = instance.post_action().await {
            return Err(tracker.fail(e));
        }

        tracker.advance();
        let result = match instance.get_result().await {
            Ok(result) => result,
            Err(e) => return Err(tracker.fail(e)),
        };

        tracker.advance();
        debug!(state = %tracker.state(), "lifecycle finished");
        Ok(result)
    }
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor").finish_non_exhaustive()
    }
}

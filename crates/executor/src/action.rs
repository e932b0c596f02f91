use std::fmt;
use std::sync::Arc;

use actroute_core::{ActionError, ActionResult, RequestContext};
use async_trait::async_trait;

use crate::services::ServiceResolver;

/// The four-step lifecycle every routable action implements.
///
/// An instance is constructed per request with its [`RequestContext`] and
/// driven exactly once through `pre_action → do_action → post_action →
/// get_result`. Steps may suspend on external calls; a step that returns an
/// error ends the lifecycle and later steps never run.
///
/// This trait is **not** object-safe because it uses native `async fn`
/// methods. The executor drives actions through [`DynLifecycle`], which
/// [`ActionFactory::new`] wires up automatically.
///
/// Resources an action acquires (connections, file handles, permits) must
/// be owned by the action so they are released on drop, including when the
/// surrounding request is cancelled between steps.
pub trait Action: Send + 'static {
    /// Intermediate value produced by `do_action` and handed to
    /// `post_action` and `get_result`.
    type Output: Send + Sync + 'static;

    /// Request-scoped setup, e.g. loading related entities.
    fn pre_action(
        &mut self,
    ) -> impl std::future::Future<Output = Result<(), ActionError>> + Send {
        async { Ok(()) }
    }

    /// The action's primary effect.
    fn do_action(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Self::Output, ActionError>> + Send;

    /// Side effects on the intermediate result (auditing, notifications).
    /// Cannot replace the result.
    fn post_action(
        &mut self,
        _output: &Self::Output,
    ) -> impl std::future::Future<Output = Result<(), ActionError>> + Send {
        async { Ok(()) }
    }

    /// Transform the intermediate result into the final [`ActionResult`].
    fn get_result(
        self,
        output: Self::Output,
    ) -> impl std::future::Future<Output = Result<ActionResult, ActionError>> + Send;
}

/// Object-safe view of an action instance, used by the executor.
///
/// Each method runs one lifecycle step. The intermediate output is held
/// inside the implementation, so callers only sequence the calls. You
/// generally should not implement this trait directly; implement [`Action`]
/// and build an [`ActionFactory`].
#[async_trait]
pub trait DynLifecycle: Send {
    /// Name of the concrete action type, for logging.
    fn action_name(&self) -> &'static str;

    async fn pre_action(&mut self) -> Result<(), ActionError>;

    async fn do_action(&mut self) -> Result<(), ActionError>;

    async fn post_action(&mut self) -> Result<(), ActionError>;

    async fn get_result(&mut self) -> Result<ActionResult, ActionError>;
}

/// Adapter holding a typed [`Action`] and its pending output.
struct Lifecycle<A: Action> {
    action: Option<A>,
    output: Option<A::Output>,
}

fn out_of_order(step: &str) -> ActionError {
    ActionError::internal(format!("lifecycle step '{step}' invoked out of order"))
}

#[async_trait]
impl<A: Action> DynLifecycle for Lifecycle<A> {
    fn action_name(&self) -> &'static str {
        std::any::type_name::<A>()
    }

    async fn pre_action(&mut self) -> Result<(), ActionError> {
        let action = self.action.as_mut().ok_or_else(|| out_of_order("pre_action"))?;
        action.pre_action().await
    }

    async fn do_action(&mut self) -> Result<(), ActionError> {
        if self.output.is_some() {
            return Err(out_of_order("do_action"));
        }
        let action = self.action.as_mut().ok_or_else(|| out_of_order("do_action"))?;
        let output = action.do_action().await?;
        self.output = Some(output);
        Ok(())
    }

    async fn post_action(&mut self) -> Result<(), ActionError> {
        let (Some(action), Some(output)) = (self.action.as_mut(), self.output.as_ref()) else {
            return Err(out_of_order("post_action"));
        };
        action.post_action(output).await
    }

    async fn get_result(&mut self) -> Result<ActionResult, ActionError> {
        match (self.action.take(), self.output.take()) {
            (Some(action), Some(output)) => action.get_result(output).await,
            (action, output) => {
                self.action = action;
                self.output = output;
                Err(out_of_order("get_result"))
            }
        }
    }
}

type BuildFn =
    dyn Fn(RequestContext, &Arc<dyn ServiceResolver>) -> Box<dyn DynLifecycle> + Send + Sync;

/// Produces a fresh action instance for each request.
///
/// Factories are cheap to clone and are stored in the dispatch table next to
/// the action's descriptor.
#[derive(Clone)]
pub struct ActionFactory {
    name: &'static str,
    build: Arc<BuildFn>,
}

impl ActionFactory {
    /// Wrap a constructor for action type `A`.
    ///
    /// The constructor receives the request context and the service resolver
    /// the executor was built with; no I/O should happen here.
    pub fn new<A, F>(build: F) -> Self
    where
        A: Action,
        F: Fn(RequestContext, &Arc<dyn ServiceResolver>) -> A + Send + Sync + 'static,
    {
        Self {
            name: std::any::type_name::<A>(),
            build: Arc::new(
                move |ctx: RequestContext,
                      services: &Arc<dyn ServiceResolver>|
                      -> Box<dyn DynLifecycle> {
                    Box::new(Lifecycle {
                        action: Some(build(ctx, services)),
                        output: None,
                    })
                },
            ),
        }
    }

    /// Name of the action type this factory builds.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Construct a new instance bound to `ctx`.
    pub fn instantiate(
        &self,
        ctx: RequestContext,
        services: &Arc<dyn ServiceResolver>,
    ) -> Box<dyn DynLifecycle> {
        (self.build)(ctx, services)
    }
}

impl fmt::Debug for ActionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionFactory")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use actroute_core::HttpVerb;

    use super::*;
    use crate::services::ServiceRegistry;

    struct Echo {
        ctx: RequestContext,
    }

    impl Action for Echo {
        type Output = String;

        async fn do_action(&mut self) -> Result<String, ActionError> {
            Ok(self.ctx.path.clone())
        }

        async fn get_result(self, output: String) -> Result<ActionResult, ActionError> {
            Ok(ActionResult::json(serde_json::json!({ "path": output })))
        }
    }

    fn services() -> Arc<dyn ServiceResolver> {
        Arc::new(ServiceRegistry::new())
    }

    #[tokio::test]
    async fn adapter_runs_steps_in_sequence() {
        let factory = ActionFactory::new(|ctx, _| Echo { ctx });
        let mut instance =
            factory.instantiate(RequestContext::new(HttpVerb::Get, "/echo"), &services());

        instance.pre_action().await.unwrap();
        instance.do_action().await.unwrap();
        instance.post_action().await.unwrap();
        let result = instance.get_result().await.unwrap();
        assert_eq!(result, ActionResult::json(serde_json::json!({"path": "/echo"})));
    }

    #[tokio::test]
    async fn adapter_rejects_out_of_order_steps() {
        let factory = ActionFactory::new(|ctx, _| Echo { ctx });
        let mut instance =
            factory.instantiate(RequestContext::new(HttpVerb::Get, "/echo"), &services());

        assert!(instance.post_action().await.is_err());
        assert!(instance.get_result().await.is_err());

        instance.do_action().await.unwrap();
        assert!(instance.do_action().await.is_err());
        instance.get_result().await.unwrap();
        assert!(instance.pre_action().await.is_err());
    }

    #[tokio::test]
    async fn early_get_result_keeps_instance_usable() {
        let factory = ActionFactory::new(|ctx, _| Echo { ctx });
        let mut instance =
            factory.instantiate(RequestContext::new(HttpVerb::Get, "/echo"), &services());

        assert!(instance.get_result().await.is_err());
        instance.pre_action().await.unwrap();
        instance.do_action().await.unwrap();
        instance.post_action().await.unwrap();
        assert_eq!(
            instance.get_result().await.unwrap(),
            ActionResult::json(serde_json::json!({"path": "/echo"}))
        );
    }

    #[test]
    fn factory_reports_action_type_name() {
        let factory = ActionFactory::new(|ctx, _| Echo { ctx });
        assert!(factory.name().ends_with("Echo"));
        let instance = factory.instantiate(RequestContext::new(HttpVerb::Get, "/"), &services());
        assert_eq!(instance.action_name(), factory.name());
    }
}

//! Sample order-management actions backed by an in-memory [`OrderStore`].

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use actroute_core::{
    ActionDescriptor, ActionError, ActionResult, HttpVerb, PropertyType, RequestContext, Schema,
};
use actroute_executor::{Action, ActionFactory, ServiceError, ServiceRegistry, ServiceResolver};
use actroute_router::ActionSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

/// Service token the store is registered under.
pub const ORDER_STORE: &str = "orders.store";

pub const CREATE: &str = "CREATE";
pub const READ: &str = "READ";
pub const MANAGE: &str = "MANAGE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub order_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Thread-safe in-memory order storage.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: RwLock<BTreeMap<String, Order>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `order`. Returns `false` without changing anything if the id
    /// is taken.
    pub async fn insert(&self, order: Order) -> bool {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.order_id) {
            return false;
        }
        orders.insert(order.order_id.clone(), order);
        true
    }

    pub async fn get(&self, id: &str) -> Option<Order> {
        self.orders.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<Order> {
        self.orders.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

/// Register the services the order actions resolve.
pub fn register_services(registry: &mut ServiceRegistry) -> Result<(), ServiceError> {
    registry.register(ORDER_STORE, OrderStore::new())
}

/// The order action set, ready for discovery.
pub fn sources() -> Vec<ActionSource> {
    vec![
        ActionSource::new(
            "orders::create",
            ActionDescriptor::new(HttpVerb::Post, "/orders")
                .with_permission(CREATE)
                .with_schema(create_schema()),
            ActionFactory::new(|ctx, services| CreateOrder {
                scope: Scope::new(ctx, services),
                pending: None,
            }),
        ),
        ActionSource::new(
            "orders::get",
            ActionDescriptor::new(HttpVerb::Get, "/orders/:id").with_permission(READ),
            ActionFactory::new(|ctx, services| GetOrder {
                scope: Scope::new(ctx, services),
            }),
        ),
        ActionSource::new(
            "orders::label",
            ActionDescriptor::new(HttpVerb::Get, "/orders/:id/label").with_permission(READ),
            ActionFactory::new(|ctx, services| OrderLabel {
                scope: Scope::new(ctx, services),
            }),
        ),
        ActionSource::new(
            "orders::delete",
            ActionDescriptor::new(HttpVerb::Delete, "/orders/:id").with_permission(MANAGE),
            ActionFactory::new(|ctx, services| DeleteOrder {
                scope: Scope::new(ctx, services),
            }),
        ),
    ]
}

fn create_schema() -> Schema {
    Schema::new()
        .field("orderId", PropertyType::string_not_empty())
        .field("orderName", PropertyType::string_required())
        .field("description", PropertyType::string_limited(500))
        .field(
            "tags",
            PropertyType::array(PropertyType::string_not_empty()),
        )
}

/// Request context plus the resolved store.
struct Scope {
    ctx: RequestContext,
    store: Result<Arc<OrderStore>, ServiceError>,
}

impl Scope {
    fn new(ctx: RequestContext, services: &Arc<dyn ServiceResolver>) -> Self {
        Self {
            ctx,
            store: services.resolve::<OrderStore>(ORDER_STORE),
        }
    }

    fn store(&self) -> Result<&OrderStore, ActionError> {
        self.store
            .as_deref()
            .map_err(|e| ActionError::internal(e.to_string()))
    }

    fn order_id(&self) -> Result<&str, ActionError> {
        self.ctx.require_param("id")
    }

    async fn load(&self) -> Result<Order, ActionError> {
        let id = self.order_id()?;
        self.store()?
            .get(id)
            .await
            .ok_or_else(|| ActionError::not_found(format!("order '{id}' not found")))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewOrder {
    order_id: String,
    order_name: String,
    description: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

struct CreateOrder {
    scope: Scope,
    pending: Option<NewOrder>,
}

impl Action for CreateOrder {
    type Output = Order;

    async fn pre_action(&mut self) -> Result<(), ActionError> {
        let new: NewOrder = self.scope.ctx.body_as()?;
        if self.scope.store()?.get(&new.order_id).await.is_some() {
            return Err(ActionError::conflict(format!(
                "order '{}' already exists",
                new.order_id
            )));
        }
        self.pending = Some(new);
        Ok(())
    }

    async fn do_action(&mut self) -> Result<Order, ActionError> {
        let new = self
            .pending
            .take()
            .ok_or_else(|| ActionError::internal("order body was not prepared"))?;
        let order = Order {
            order_id: new.order_id,
            order_name: new.order_name,
            description: new.description,
            tags: new.tags.unwrap_or_default(),
            created_at: self.scope.ctx.received_at,
        };
        if !self.scope.store()?.insert(order.clone()).await {
            return Err(ActionError::conflict(format!(
                "order '{}' already exists",
                order.order_id
            )));
        }
        Ok(order)
    }

    async fn post_action(&mut self, order: &Order) -> Result<(), ActionError> {
        info!(
            order_id = %order.order_id,
            request_id = %self.scope.ctx.request_id,
            "order created"
        );
        Ok(())
    }

    async fn get_result(self, order: Order) -> Result<ActionResult, ActionError> {
        Ok(ActionResult::json(serde_json::to_value(order)?).with_status(201))
    }
}

struct GetOrder {
    scope: Scope,
}

impl Action for GetOrder {
    type Output = Order;

    async fn do_action(&mut self) -> Result<Order, ActionError> {
        self.scope.load().await
    }

    async fn get_result(self, order: Order) -> Result<ActionResult, ActionError> {
        Ok(ActionResult::json(serde_json::to_value(order)?))
    }
}

/// Plain-text shipping label, served as a download.
struct OrderLabel {
    scope: Scope,
}

impl Action for OrderLabel {
    type Output = Order;

    async fn do_action(&mut self) -> Result<Order, ActionError> {
        self.scope.load().await
    }

    async fn get_result(self, order: Order) -> Result<ActionResult, ActionError> {
        Ok(ActionResult::binary(render_label(&order), "text/plain; charset=utf-8"))
    }
}

fn render_label(order: &Order) -> String {
    let mut label = String::new();
    let _ = writeln!(label, "ORDER {}", order.order_id);
    let _ = writeln!(label, "{}", order.order_name);
    if let Some(description) = &order.description {
        let _ = writeln!(label, "{description}");
    }
    if !order.tags.is_empty() {
        let _ = writeln!(label, "tags: {}", order.tags.join(", "));
    }
    label
}

struct DeleteOrder {
    scope: Scope,
}

impl Action for DeleteOrder {
    type Output = Order;

    async fn do_action(&mut self) -> Result<Order, ActionError> {
        let id = self.scope.order_id()?;
        self.scope
            .store()?
            .remove(id)
            .await
            .ok_or_else(|| ActionError::not_found(format!("order '{id}' not found")))
    }

    async fn post_action(&mut self, order: &Order) -> Result<(), ActionError> {
        info!(
            order_id = %order.order_id,
            request_id = %self.scope.ctx.request_id,
            "order deleted"
        );
        Ok(())
    }

    async fn get_result(self, _order: Order) -> Result<ActionResult, ActionError> {
        Ok(ActionResult::no_content())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use actroute_core::{Fault, Payload};
    use actroute_executor::ActionExecutor;
    use serde_json::json;

    use super::*;

    fn executor() -> ActionExecutor {
        let mut registry = ServiceRegistry::new();
        register_services(&mut registry).unwrap();
        ActionExecutor::new(Arc::new(registry))
    }

    fn factory(name: &str) -> ActionFactory {
        sources()
            .into_iter()
            .find(|s| s.name() == name)
            .map(|s| s.factory().clone())
            .unwrap()
    }

    fn with_id(verb: HttpVerb, id: &str) -> RequestContext {
        RequestContext::new(verb, format!("/orders/{id}"))
            .with_params(HashMap::from([("id".to_owned(), id.to_owned())]))
    }

    async fn create(executor: &ActionExecutor, body: serde_json::Value) -> ActionResult {
        let ctx = RequestContext::new(HttpVerb::Post, "/orders").with_body(body);
        executor
            .execute(&factory("orders::create"), ctx)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_get() {
        let executor = executor();
        let created = create(
            &executor,
            json!({"orderId": "o-1", "orderName": "Desk", "tags": ["office"]}),
        )
        .await;
        assert_eq!(created.status, Some(201));

        let fetched = executor
            .execute(&factory("orders::get"), with_id(HttpVerb::Get, "o-1"))
            .await
            .unwrap();
        let Payload::Json(body) = fetched.payload else {
            panic!("expected json");
        };
        assert_eq!(body["orderName"], "Desk");
        assert_eq!(body["tags"], json!(["office"]));
        assert!(body.get("description").is_none());
    }

    #[tokio::test]
    async fn null_optional_fields_are_treated_as_absent() {
        let created = create(
            &executor(),
            json!({"orderId": "o-2", "orderName": "Shelf", "description": null, "tags": null}),
        )
        .await;
        let Payload::Json(body) = created.payload else {
            panic!("expected json");
        };
        assert_eq!(body["tags"], json!([]));
        assert!(body.get("description").is_none());
    }

    #[tokio::test]
    async fn duplicate_create_conflicts_before_do_action() {
        let executor = executor();
        create(&executor, json!({"orderId": "o-1", "orderName": "Desk"})).await;

        let ctx = RequestContext::new(HttpVerb::Post, "/orders")
            .with_body(json!({"orderId": "o-1", "orderName": "Chair"}));
        let failure = executor
            .execute(&factory("orders::create"), ctx)
            .await
            .unwrap_err();
        assert_eq!(failure.state, actroute_executor::LifecycleState::PreAction);
        assert_eq!(failure.error.status(), 409);
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let failure = executor()
            .execute(&factory("orders::get"), with_id(HttpVerb::Get, "nope"))
            .await
            .unwrap_err();
        assert_eq!(failure.fault(), Fault::Caller);
        assert_eq!(failure.error.status(), 404);
    }

    #[tokio::test]
    async fn label_is_plain_text() {
        let executor = executor();
        create(
            &executor,
            json!({"orderId": "o-7", "orderName": "Lamp", "description": "fragile", "tags": ["a", "b"]}),
        )
        .await;

        let result = executor
            .execute(&factory("orders::label"), with_id(HttpVerb::Get, "o-7"))
            .await
            .unwrap();
        let Payload::Binary { data, content_type } = result.payload else {
            panic!("expected binary");
        };
        assert_eq!(content_type, "text/plain; charset=utf-8");
        assert_eq!(&data[..], b"ORDER o-7\nLamp\nfragile\ntags: a, b\n");
    }

    #[tokio::test]
    async fn delete_removes_order() {
        let executor = executor();
        create(&executor, json!({"orderId": "o-1", "orderName": "Desk"})).await;

        let result = executor
            .execute(&factory("orders::delete"), with_id(HttpVerb::Delete, "o-1"))
            .await
            .unwrap();
        assert_eq!(result.status, Some(204));

        let again = executor
            .execute(&factory("orders::delete"), with_id(HttpVerb::Delete, "o-1"))
            .await
            .unwrap_err();
        assert_eq!(again.error.status(), 404);
    }

    #[tokio::test]
    async fn missing_store_is_internal_fault() {
        let executor = ActionExecutor::new(Arc::new(ServiceRegistry::new()));
        let failure = executor
            .execute(&factory("orders::get"), with_id(HttpVerb::Get, "o-1"))
            .await
            .unwrap_err();
        assert_eq!(failure.fault(), Fault::Internal);
    }

    #[tokio::test]
    async fn store_rejects_duplicate_ids() {
        let store = OrderStore::new();
        let order = Order {
            order_id: "o-1".into(),
            order_name: "Desk".into(),
            description: None,
            tags: vec![],
            created_at: Utc::now(),
        };
        assert!(store.insert(order.clone()).await);
        assert!(!store.insert(order).await);
        assert_eq!(store.len().await, 1);
    }
}

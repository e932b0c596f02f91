use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use bytes::Bytes;
use serde_json::{Value, json};
use tower::ServiceExt;

use actroute_core::{ActionDescriptor, ActionError, ActionResult, HttpVerb, PermissionSet};
use actroute_executor::{Action, ActionExecutor, ActionFactory, ServiceRegistry};
use actroute_router::{ActionSource, DispatchTable, Dispatcher};
use actroute_server::actions::orders::{self, ORDER_STORE, OrderStore};
use actroute_server::api::{self, AppState, CallerPermissions};
use actroute_server::config::{PermissionsConfig, ServerConfig};

// -- Fixtures -------------------------------------------------------------

/// Fails in `do_action` with an error whose details must not leak.
struct Explode;

impl Action for Explode {
    type Output = ();

    async fn do_action(&mut self) -> Result<(), ActionError> {
        Err(ActionError::internal("db password is hunter2"))
    }

    async fn get_result(self, (): ()) -> Result<ActionResult, ActionError> {
        Ok(ActionResult::no_content())
    }
}

fn explode_source() -> ActionSource {
    ActionSource::new(
        "test::explode",
        ActionDescriptor::new(HttpVerb::Post, "/explode"),
        ActionFactory::new(|_ctx, _services| Explode),
    )
}

// -- Helpers --------------------------------------------------------------

struct TestApp {
    router: Router,
    store: Arc<OrderStore>,
}

fn header_permissions() -> PermissionsConfig {
    PermissionsConfig {
        header: Some("x-permissions".into()),
        anonymous: vec![],
    }
}

fn build_app(prefix: &str, permissions: PermissionsConfig, extra: Vec<ActionSource>) -> TestApp {
    let store = Arc::new(OrderStore::new());
    let mut services = ServiceRegistry::new();
    services
        .register_arc(ORDER_STORE, Arc::clone(&store))
        .expect("store should register");

    let table = DispatchTable::builder()
        .mount(prefix, orders::sources())
        .and_then(|b| b.mount(prefix, extra))
        .expect("sources should mount")
        .build();
    let dispatcher = Dispatcher::new(table, ActionExecutor::new(Arc::new(services)));

    let state = AppState::new(dispatcher)
        .with_permissions(permissions)
        .with_limits(&ServerConfig::default());

    TestApp {
        router: api::router(state),
        store,
    }
}

fn test_app() -> TestApp {
    build_app("", header_permissions(), vec![])
}

fn request(method: &str, uri: &str, permissions: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(p) = permissions {
        builder = builder.header("x-permissions", p);
    }
    builder.body(body).unwrap()
}

fn json_request(method: &str, uri: &str, permissions: Option<&str>, body: &Value) -> Request<Body> {
    request(method, uri, permissions, Body::from(body.to_string()))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(app, req).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn sample_order() -> Value {
    json!({
        "orderId": "o-1",
        "orderName": "Coffee beans",
        "description": "dark roast",
        "tags": ["food", "weekly"]
    })
}

async fn create_sample(app: &TestApp) {
    let (status, _) = send_json(
        &app.router,
        json_request("POST", "/orders", Some("CREATE"), &sample_order()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

// -- Introspection --------------------------------------------------------

#[tokio::test]
async fn health_reports_routes_and_metrics() {
    let app = test_app();
    let (status, body) = send_json(&app.router, request("GET", "/health", None, Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["routes"], 4);
    assert_eq!(body["metrics"]["dispatched"], 0);
}

#[tokio::test]
async fn routes_lists_table_in_registration_order() {
    let app = test_app();
    let (status, body) = send_json(&app.router, request("GET", "/routes", None, Body::empty())).await;
    assert_eq!(status, StatusCode::OK);

    let routes = body.as_array().unwrap();
    let summary: Vec<(String, String)> = routes
        .iter()
        .map(|r| {
            (
                r["verb"].as_str().unwrap().to_owned(),
                r["pattern"].as_str().unwrap().to_owned(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        [
            ("POST".to_owned(), "/orders".to_owned()),
            ("GET".to_owned(), "/orders/:id".to_owned()),
            ("GET".to_owned(), "/orders/:id/label".to_owned()),
            ("DELETE".to_owned(), "/orders/:id".to_owned()),
        ]
    );
    assert_eq!(routes[0]["permissions"], json!(["CREATE"]));
    assert_eq!(routes[0]["validated"], true);
}

// -- Create ---------------------------------------------------------------

#[tokio::test]
async fn create_with_permission_returns_created() {
    let app = test_app();
    let (status, body) = send_json(
        &app.router,
        json_request("POST", "/orders", Some("CREATE"), &sample_order()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["orderId"], "o-1");
    assert_eq!(body["orderName"], "Coffee beans");
    assert!(body["createdAt"].is_string());
    assert_eq!(app.store.len().await, 1);
}

#[tokio::test]
async fn create_without_permission_is_forbidden_and_has_no_effect() {
    let app = test_app();
    let (status, body) = send_json(
        &app.router,
        json_request("POST", "/orders", Some("READ"), &sample_order()),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "forbidden"}));
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn create_missing_field_lists_exactly_that_violation() {
    let app = test_app();
    let (status, body) = send_json(
        &app.router,
        json_request(
            "POST",
            "/orders",
            Some("CREATE"),
            &json!({"orderId": "o-1", "tags": ["a"]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation failed");
    let violations = body["violations"].as_array().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0]["path"], "orderName");
    assert_eq!(violations[0]["code"], "required");
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn malformed_json_is_a_validation_failure() {
    let app = test_app();
    let (status, body) = send_json(
        &app.router,
        request("POST", "/orders", Some("CREATE"), Body::from("{\"orderId\": ")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["violations"][0]["code"], "invalid_json");
    assert_eq!(body["violations"][0]["path"], "");
}

#[tokio::test]
async fn permission_gate_runs_before_body_parsing() {
    let app = test_app();
    let (status, _) = send_json(
        &app.router,
        request("POST", "/orders", None, Body::from("not json")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_create_conflicts() {
    let app = test_app();
    create_sample(&app).await;

    let (status, body) = send_json(
        &app.router,
        json_request("POST", "/orders", Some("CREATE"), &sample_order()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "order 'o-1' already exists");
    assert_eq!(app.store.len().await, 1);
}

// -- Read, label, delete --------------------------------------------------

#[tokio::test]
async fn get_returns_stored_order() {
    let app = test_app();
    create_sample(&app).await;

    let (status, body) = send_json(
        &app.router,
        request("GET", "/orders/o-1", Some("READ"), Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tags"], json!(["food", "weekly"]));
}

#[tokio::test]
async fn get_unknown_order_is_not_found() {
    let app = test_app();
    let (status, body) = send_json(
        &app.router,
        request("GET", "/orders/missing", Some("READ"), Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "order 'missing' not found");
}

#[tokio::test]
async fn label_is_returned_byte_exact() {
    let app = test_app();
    create_sample(&app).await;

    let (status, headers, body) = send(
        &app.router,
        request("GET", "/orders/o-1/label", Some("READ"), Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(
        &body[..],
        b"ORDER o-1\nCoffee beans\ndark roast\ntags: food, weekly\n"
    );
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = test_app();
    create_sample(&app).await;

    let (status, _, body) = send(
        &app.router,
        request("DELETE", "/orders/o-1", Some("MANAGE"), Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = send_json(
        &app.router,
        request("GET", "/orders/o-1", Some("READ"), Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_without_manage_is_forbidden() {
    let app = test_app();
    create_sample(&app).await;

    let (status, _) = send_json(
        &app.router,
        request("DELETE", "/orders/o-1", Some("READ, CREATE"), Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.len().await, 1);
}

// -- Routing --------------------------------------------------------------

#[tokio::test]
async fn unknown_path_is_not_found() {
    let app = test_app();
    let (status, body) = send_json(
        &app.router,
        request("GET", "/customers", Some("READ"), Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "not found"}));
}

#[tokio::test]
async fn wrong_verb_is_method_not_allowed_with_allow_header() {
    let app = test_app();
    let (status, headers, _) = send(
        &app.router,
        request("PUT", "/orders/o-1", Some("MANAGE"), Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers.get(header::ALLOW).unwrap(), "GET, DELETE");
}

#[tokio::test]
async fn unsupported_method_on_known_path_is_method_not_allowed() {
    let app = test_app();
    let (status, headers, _) = send(
        &app.router,
        request("OPTIONS", "/orders", None, Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers.get(header::ALLOW).unwrap(), "POST");

    let (status, _, _) = send(&app.router, request("OPTIONS", "/nowhere", None, Body::empty())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for method in ["TRACE", "HEAD"] {
        let (status, headers, _) = send(
            &app.router,
            request(method, "/orders", None, Body::empty()),
        )
        .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(headers.get(header::ALLOW).unwrap(), "POST", "{method}");
    }
}

#[tokio::test]
async fn cors_preflight_is_answered_only_when_enabled() {
    let preflight = || {
        Request::builder()
            .method("OPTIONS")
            .uri("/orders")
            .header(header::ORIGIN, "https://shop.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let (status, headers, _) = send(&test_app().router, preflight()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

    let table = DispatchTable::discover(orders::sources()).unwrap();
    let mut services = ServiceRegistry::new();
    services.register(ORDER_STORE, OrderStore::new()).unwrap();
    let state = AppState::new(Dispatcher::new(table, ActionExecutor::new(Arc::new(services))))
        .with_limits(&ServerConfig {
            cors: true,
            ..ServerConfig::default()
        });
    let router = api::router(state);

    let (status, headers, _) = send(&router, preflight()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
}

#[tokio::test]
async fn trailing_slash_matches_the_same_route() {
    let app = test_app();
    create_sample(&app).await;

    let (status, _) = send_json(
        &app.router,
        request("GET", "/orders/o-1/", Some("READ"), Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn actions_are_served_under_the_api_prefix() {
    let app = build_app("/api/v1", header_permissions(), vec![]);
    let (status, _) = send_json(
        &app.router,
        json_request("POST", "/api/v1/orders", Some("CREATE"), &sample_order()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send_json(
        &app.router,
        request("GET", "/orders/o-1", Some("READ"), Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Permissions sources --------------------------------------------------

#[tokio::test]
async fn anonymous_grants_apply_without_header() {
    let app = build_app(
        "",
        PermissionsConfig {
            header: None,
            anonymous: vec!["READ".into()],
        },
        vec![],
    );
    app.store
        .insert(orders::Order {
            order_id: "o-9".into(),
            order_name: "Tea".into(),
            description: None,
            tags: vec![],
            created_at: chrono::Utc::now(),
        })
        .await;

    let (status, _) = send_json(
        &app.router,
        request("GET", "/orders/o-9", None, Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &app.router,
        request("DELETE", "/orders/o-9", None, Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn caller_permissions_extension_is_honoured() {
    let app = test_app();
    let mut req = json_request("POST", "/orders", None, &sample_order());
    let granted: PermissionSet = ["CREATE"].into_iter().collect();
    req.extensions_mut().insert(CallerPermissions(granted));

    let (status, _) = send_json(&app.router, req).await;
    assert_eq!(status, StatusCode::CREATED);
}

// -- Faults ---------------------------------------------------------------

#[tokio::test]
async fn internal_fault_is_rendered_generically() {
    let app = build_app("", header_permissions(), vec![explode_source()]);
    let (status, _, body) = send(
        &app.router,
        request("POST", "/explode", None, Body::empty()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text, r#"{"error":"internal server error"}"#);
    assert!(!text.contains("hunter2"));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let store = Arc::new(OrderStore::new());
    let mut services = ServiceRegistry::new();
    services.register_arc(ORDER_STORE, Arc::clone(&store)).unwrap();
    let table = DispatchTable::discover(orders::sources()).unwrap();
    let state = AppState::new(Dispatcher::new(table, ActionExecutor::new(Arc::new(services))))
        .with_permissions(header_permissions())
        .with_limits(&ServerConfig {
            max_body_bytes: 16,
            ..ServerConfig::default()
        });
    let router = api::router(state);

    let (status, _, _) = send(
        &router,
        json_request("POST", "/orders", Some("CREATE"), &sample_order()),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(store.is_empty().await);
}

use actroute_router::RouteInfo;
use axum::Json;
use axum::extract::State;

use super::AppState;

/// `GET /routes`: the dispatch table in registration order.
pub async fn list_routes(State(state): State<AppState>) -> Json<Vec<RouteInfo>> {
    Json(state.dispatcher.table().routes())
}

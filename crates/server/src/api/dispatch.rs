use std::collections::HashMap;

use actroute_core::HttpVerb;
use actroute_router::{DispatchRequest, RouteLookup};
use axum::extract::State;
use axum::http::{Extensions, HeaderMap, Method, Uri};
use axum::response::Response;
use bytes::Bytes;
use tracing::debug;

use crate::encoder::{self, render_outcome};

use super::{AppState, caller};

/// Fallback handler: every request not claimed by a built-in endpoint goes
/// through the dispatch pipeline and yields exactly one response.
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
) -> Response {
    let path = uri.path();

    let Ok(verb) = method.as_str().parse::<HttpVerb>() else {
        debug!(method = %method, path, "unsupported method");
        return unsupported_method(&state, path);
    };

    let query = uri.query().map(decode_query).unwrap_or_default();

    let granted = caller::resolve(&state.permissions, &state.anonymous, &headers, &extensions);

    let request = DispatchRequest::new(verb, path)
        .with_query(query)
        .with_body(body)
        .with_caller_permissions(granted);

    render_outcome(state.dispatcher.dispatch(request).await)
}

/// Decode `a=1&b=2` into a map. Repeated keys keep the last value.
fn decode_query(raw: &str) -> HashMap<String, String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(raw)
        .unwrap_or_default()
        .into_iter()
        .collect()
}

/// Answer a method outside the supported verbs: `405` if the path exists
/// under some verb, `404` otherwise.
fn unsupported_method(state: &AppState, path: &str) -> Response {
    let table = state.dispatcher.table();
    let allowed: Vec<HttpVerb> = HttpVerb::ALL
        .into_iter()
        .filter(|verb| matches!(table.lookup(*verb, path), RouteLookup::Found(_)))
        .collect();

    if allowed.is_empty() {
        encoder::not_found()
    } else {
        encoder::method_not_allowed(&allowed)
    }
}

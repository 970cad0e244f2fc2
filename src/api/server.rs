//! Router assembly for the administrative HTTP surface plus the `/ws`
//! session endpoint (spec.md §6).

use std::any::Any;
use std::sync::Arc;

use axum::extract::MatchedPath;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::Shutdown;
use crate::kernel::Registry;

use super::{middleware, routes, ws};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub shutdown: Shutdown,
    pub dev: bool,
}

pub fn build_router(state: AppState) -> Router {
    let dev = state.dev;

    Router::new()
        .route("/", get(routes::root::root))
        .route("/health", get(routes::health::health))
        .route("/stats", get(routes::stats::stats))
        .route(
            "/topics",
            get(routes::topics::list_topics).post(routes::topics::create_topic),
        )
        .route("/topics/{name}", delete(routes::topics::delete_topic))
        .route("/ws", get(ws::ws_handler))
        .fallback(middleware::not_found)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str)
                    .unwrap_or(request.uri().path());
                tracing::info_span!("request", method = %request.method(), path)
            }),
        )
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::custom(move |err| handle_panic(dev, err)))
        .with_state(state)
}

/// Any unmapped panic in a handler becomes a 500 (spec.md §6, §7); detail is
/// only included when the development flag is set.
fn handle_panic(dev: bool, err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = dev.then(|| panic_message(&err));
    let mut body = json!({ "error": "Internal server error" });
    if let Some(detail) = detail {
        body["detail"] = json!(detail);
    }
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

fn panic_message(err: &(dyn Any + Send + 'static)) -> String {
    if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

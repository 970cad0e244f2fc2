//! `GET /ws`: upgrade to a session WebSocket (spec.md §6's session transport,
//! bound here since transport choice was left external by the kernel spec).

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::IntoResponse;

use super::server::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.clone();
    let shutdown = state.shutdown.subscribe();
    ws.on_upgrade(move |socket| async move {
        crate::session::run(registry, socket, shutdown).await;
    })
}

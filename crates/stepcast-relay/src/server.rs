//! HTTP routing.

use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::connection::handle_client;
use crate::RelayState;

/// Create the relay router: the WebSocket endpoint at `/` plus `/health`.
pub fn create_router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<RelayState>>) -> Response {
    ws.on_upgrade(move |socket| handle_client(socket, state))
}

async fn health_check(State(state): State<Arc<RelayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "clients": state.client_count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_router() {
        let state = Arc::new(RelayState::default());
        let _router = create_router(state);
    }
}

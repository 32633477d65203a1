use std::sync::Arc;

use axum::{Json, Router, middleware, routing::get};

use crate::{
    auth::{Caller, resolve_identity},
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/required-auth/whoami", get(whoami))
        .route_layer(middleware::from_fn_with_state(state.clone(), resolve_identity))
        .with_state(state)
}

async fn whoami(caller: Caller) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "subject": caller.subject,
        "capabilities": caller.permissions.len()
    }))
}

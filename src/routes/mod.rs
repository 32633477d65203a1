use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod posts;
pub mod protected;
pub mod public;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(public::router())
        .merge(posts::router(state.clone()))
        .merge(protected::router(state.clone()))
        .merge(admin::router(state))
}

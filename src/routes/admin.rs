use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get},
};
use sea_orm::{ColumnTrait, Condition, Set, prelude::DateTimeWithTimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{Caller, RequireCapabilityLayer, resolve_identity, resolver::now_unix},
    db::entities::api_key,
    error::AppError,
    permissions::ADMIN_CAPABILITY,
    state::AppState,
};

const DEFAULT_KEY_TTL_SECS: i64 = 60 * 60 * 24 * 30;

#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    pub owner_email: String,
    pub ttl_secs: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub id: Uuid,
    pub key: String,
    pub owner_email: String,
    pub expires_at: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/admin/api-keys", get(list_keys).post(create_key))
        .route("/admin/api-keys/{key_id}", delete(delete_key))
        .layer(RequireCapabilityLayer::new(
            Arc::clone(&state.permissions),
            ADMIN_CAPABILITY,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), resolve_identity))
        .with_state(state)
}

async fn list_keys(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<ApiKeyResponse>>, AppError> {
    let repo = state.repos.api_keys()?;
    let keys = repo
        .find(&caller.permissions, None, Condition::all())
        .collect_all()
        .await?;
    Ok(Json(keys.into_iter().map(ApiKeyResponse::from).collect()))
}

async fn create_key(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<ApiKeyResponse>), AppError> {
    let owner_email = normalize_email(&body.owner_email)?;
    let ttl = body.ttl_secs.unwrap_or(DEFAULT_KEY_TTL_SECS);
    if ttl <= 0 {
        return Err(AppError::bad_request("ttl_secs must be positive"));
    }

    let repo = state.repos.api_keys()?;
    let key = api_key::ActiveModel {
        key: Set(generate_key()),
        owner_email: Set(owner_email.to_string()),
        expires_at: Set(now_unix() as i64 + ttl),
        ..Default::default()
    };
    let created = repo.create(&caller.permissions, key).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn delete_key(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(key_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let repo = state.repos.api_keys()?;
    let removed = repo
        .delete(
            &caller.permissions,
            Condition::all().add(api_key::Column::Id.eq(key_id)),
        )
        .await?;
    if removed == 0 {
        return Err(AppError::not_found("Api key not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn generate_key() -> String {
    let mut key = Uuid::new_v4().simple().to_string();
    key.push_str(&Uuid::new_v4().simple().to_string());
    key
}

fn normalize_email(email: &str) -> Result<&str, AppError> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(AppError::bad_request("Valid owner_email required"));
    }
    Ok(trimmed)
}

impl From<api_key::Model> for ApiKeyResponse {
    fn from(model: api_key::Model) -> Self {
        Self {
            id: model.id,
            key: model.key,
            owner_email: model.owner_email,
            expires_at: model.expires_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

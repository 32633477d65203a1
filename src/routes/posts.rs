use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use sea_orm::{ColumnTrait, Condition, prelude::DateTimeWithTimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::entities::post, db::repo::PaginatedResponse, error::AppError,
    permissions::PermissionSet, state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListPostsParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub author_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/{post_id}", get(get_post))
        .with_state(state)
}

async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListPostsParams>,
) -> Result<Json<PaginatedResponse<PostResponse>>, AppError> {
    let repo = state.repos.posts()?;
    let anon = PermissionSet::empty();

    let mut filter = Condition::all();
    if let Some(kind) = params.kind {
        filter = filter.add(post::Column::Kind.eq(kind));
    }

    let page = repo
        .find_page(
            &anon,
            params.page.unwrap_or(1),
            params.page_size.unwrap_or(20),
            filter,
        )
        .await?;

    Ok(Json(PaginatedResponse {
        data: page.data.into_iter().map(PostResponse::from).collect(),
        page: page.page,
        page_size: page.page_size,
        has_next: page.has_next,
        total: page.total,
    }))
}

async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostResponse>, AppError> {
    let repo = state.repos.posts()?;
    let post = repo.get_by_id(&PermissionSet::empty(), post_id).await?;
    Ok(Json(post.into()))
}

impl From<post::Model> for PostResponse {
    fn from(model: post::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            title: model.title,
            body: model.body,
            author_id: model.author_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

use axum::{extract::{Path, Query, State}, Extension, Json};
use uuid::Uuid;

use common::types::{ApiResponse, Page};
use models::knowledge_article as article;
use service::{context::Operator, knowledge_service::{self, ArticleInput, ArticleQuery}};

use super::{auth::ServerState, ApiResult};

#[utoipa::path(
    get, path = "/api/v1/knowledge/articles", tag = "knowledge",
    params(
        ("search" = Option<String>, Query, description = "title, author or content contains"),
        ("sort_order" = Option<String>, Query, description = "by created_at, asc or desc"),
    ),
    responses((status = 200, description = "Page of articles"))
)]
pub async fn list(State(state): State<ServerState>, Query(q): Query<ArticleQuery>) -> ApiResult<Page<article::Model>> {
    Ok(Json(ApiResponse::success(knowledge_service::list(&state.db, &q).await?)))
}

#[utoipa::path(
    get, path = "/api/v1/knowledge/articles/{id}", tag = "knowledge",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses((status = 200, description = "Article"), (status = 404, description = "Not Found"))
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<Uuid>) -> ApiResult<article::Model> {
    Ok(Json(ApiResponse::success(knowledge_service::get(&state.db, id).await?)))
}

#[utoipa::path(
    post, path = "/api/v1/knowledge/articles", tag = "knowledge",
    request_body = crate::openapi::ArticleRequest,
    responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"))
)]
pub async fn create(State(state): State<ServerState>, Extension(op): Extension<Operator>, Json(input): Json<ArticleInput>) -> ApiResult<article::Model> {
    Ok(Json(ApiResponse::success(knowledge_service::create(&state.db, &op, input).await?)))
}

#[utoipa::path(
    put, path = "/api/v1/knowledge/articles/{id}", tag = "knowledge",
    params(("id" = Uuid, Path, description = "Article ID")),
    request_body = crate::openapi::ArticleRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(op): Extension<Operator>,
    Path(id): Path<Uuid>,
    Json(input): Json<ArticleInput>,
) -> ApiResult<article::Model> {
    Ok(Json(ApiResponse::success(knowledge_service::update(&state.db, &op, id, input).await?)))
}

#[utoipa::path(
    delete, path = "/api/v1/knowledge/articles/{id}", tag = "knowledge",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete(State(state): State<ServerState>, Extension(op): Extension<Operator>, Path(id): Path<Uuid>) -> ApiResult<()> {
    knowledge_service::delete(&state.db, &op, id).await?;
    Ok(Json(ApiResponse::ok("删除成功")))
}

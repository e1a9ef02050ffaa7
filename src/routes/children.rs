use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::child::{Child, CreateChildRequest, TokenBalance},
    services::children::ChildService,
    AppState,
};

use super::extract::{AppJson, AppPath};

pub async fn create_child(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateChildRequest>,
) -> Result<(StatusCode, Json<Child>), AppError> {
    ChildService::create(state.store.as_ref(), &body)
        .await
        .map(|child| (StatusCode::CREATED, Json(child)))
}

pub async fn get_child(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Child>, AppError> {
    ChildService::get(state.store.as_ref(), id).await.map(Json)
}

pub async fn get_tokens(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<TokenBalance>, AppError> {
    ChildService::tokens(state.store.as_ref(), id).await.map(Json)
}

pub async fn list_completions(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let completions = ChildService::completions(state.store.as_ref(), id).await?;
    Ok(Json(json!({ "child_id": id, "completions": completions })))
}

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::{
        activity::{Activity, ActivityQuery, CreateActivityRequest, GenerateActivitiesRequest},
        completion::{PhotoValidationResponse, SubmitPhotoQuery},
    },
    services::{
        activities::ActivityService, photos::PhotoUpload, submissions::SubmissionService,
    },
    AppState,
};

use super::extract::{AppJson, AppPath, AppQuery};

pub async fn list_activities(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ActivityQuery>,
) -> Result<Json<Vec<Activity>>, AppError> {
    ActivityService::list(state.store.as_ref(), &query)
        .await
        .map(Json)
}

/// Admin insert of a single, hand-written activity.
pub async fn create_activity(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateActivityRequest>,
) -> Result<(StatusCode, Json<Activity>), AppError> {
    ActivityService::create(state.store.as_ref(), body)
        .await
        .map(|activity| (StatusCode::CREATED, Json(activity)))
}

pub async fn generate_activities(
    State(state): State<AppState>,
    AppJson(body): AppJson<GenerateActivitiesRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let activities =
        ActivityService::generate(state.store.as_ref(), state.ai.as_deref(), &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "generated": activities.len(), "activities": activities })),
    ))
}

/// Multipart upload with a `photo` field; `child_id` comes from the query string.
pub async fn submit_photo(
    State(state): State<AppState>,
    AppPath(activity_id): AppPath<i64>,
    AppQuery(query): AppQuery<SubmitPhotoQuery>,
    multipart: Multipart,
) -> Result<Json<PhotoValidationResponse>, AppError> {
    let upload = PhotoUpload::from_multipart(multipart).await?;
    SubmissionService::submit(
        state.store.as_ref(),
        state.ai.as_deref(),
        &state.photos,
        &state.capture_rules,
        activity_id,
        query.child_id,
        upload,
    )
    .await
    .map(Json)
}

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use langdrill_core::engine::{AttemptSubmission, NextBatch};
use langdrill_core::model::{ExerciseKind, Progress};

use crate::response::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AttemptResponse {
    pub ok: bool,
    pub progress: Progress,
}

pub async fn record_attempt(
    State(state): State<AppState>,
    payload: Result<Json<AttemptSubmission>, JsonRejection>,
) -> Result<Json<AttemptResponse>, AppError> {
    let Json(submission) = payload?;
    let progress = state.engine().record_attempt(submission).await?;
    Ok(Json(AttemptResponse { ok: true, progress }))
}

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub user_id: String,
    pub progress: Vec<Progress>,
}

pub async fn progress(
    State(state): State<AppState>,
    query: Result<Query<ProgressQuery>, QueryRejection>,
) -> Result<Json<ProgressResponse>, AppError> {
    let Query(query) = query?;
    let progress = state.engine().progress(&query.user_id).await?;
    Ok(Json(ProgressResponse {
        user_id: query.user_id,
        progress,
    }))
}

#[derive(Debug, Deserialize)]
pub struct NextRequest {
    pub user_id: String,
    pub exercise: ExerciseKind,
    #[serde(default)]
    pub options: Map<String, Value>,
}

pub async fn next_batch(
    State(state): State<AppState>,
    payload: Result<Json<NextRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload?;
    let batch = state
        .engine()
        .next_batch(&request.user_id, request.exercise, request.options)
        .await?;
    next_payload(batch).map(Json)
}

/// The content object with a `meta` block describing how it was generated.
fn next_payload(batch: NextBatch) -> Result<Value, AppError> {
    let encode = |e: serde_json::Error| AppError::internal(format!("encode /next payload: {e}"));

    let mut meta = match serde_json::to_value(&batch.params).map_err(encode)? {
        Value::Object(map) => map,
        other => return Err(AppError::internal(format!("params encoded as {other}"))),
    };
    meta.insert("level".into(), Value::from(batch.level));
    meta.insert("provider".into(), Value::from(batch.provider));

    let mut payload = match serde_json::to_value(&batch.content).map_err(encode)? {
        Value::Object(map) => map,
        other => return Err(AppError::internal(format!("content encoded as {other}"))),
    };
    payload.insert("meta".into(), Value::Object(meta));
    Ok(Value::Object(payload))
}

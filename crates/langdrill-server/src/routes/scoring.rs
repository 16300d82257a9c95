use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Deserialize;

use langdrill_core::params::Strictness;
use langdrill_core::scoring::{score_against_target, SpeechScore};

use crate::response::AppError;

#[derive(Debug, Deserialize)]
pub struct SpeechScoreRequest {
    pub transcript: String,
    pub target: String,
    #[serde(default = "default_strictness")]
    pub strictness: Strictness,
}

fn default_strictness() -> Strictness {
    Strictness::Normal
}

pub async fn score_speech(
    payload: Result<Json<SpeechScoreRequest>, JsonRejection>,
) -> Result<Json<SpeechScore>, AppError> {
    let Json(request) = payload?;
    if request.target.trim().is_empty() {
        return Err(AppError::validation("target must not be empty"));
    }
    Ok(Json(score_against_target(
        &request.transcript,
        &request.target,
        request.strictness,
    )))
}

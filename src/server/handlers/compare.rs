use std::sync::Arc;

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::State;
use axum::{Form, Json};
use tracing::Instrument;
use uuid::Uuid;

use crate::compare::{AnswerResult, CompareForm};
use crate::core::errors::ApiError;
use crate::state::AppState;

/// `POST /compare` with the page's form fields.
pub async fn compare_form(
    State(state): State<Arc<AppState>>,
    payload: Result<Form<CompareForm>, FormRejection>,
) -> Result<Json<AnswerResult>, ApiError> {
    let Form(form) = payload.map_err(|rejection| {
        tracing::warn!("Rejected compare form: {}", rejection.body_text());
        ApiError::BadRequest(rejection.body_text())
    })?;
    run_comparison(&state, form).await
}

/// `POST /api/compare` with the same fields as JSON.
pub async fn compare_json(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CompareForm>, JsonRejection>,
) -> Result<Json<AnswerResult>, ApiError> {
    let Json(form) = payload.map_err(|rejection| {
        tracing::warn!("Rejected compare payload: {}", rejection.body_text());
        ApiError::BadRequest(rejection.body_text())
    })?;
    run_comparison(&state, form).await
}

async fn run_comparison(state: &AppState, form: CompareForm) -> Result<Json<AnswerResult>, ApiError> {
    let span = tracing::info_span!(
        "compare",
        request_id = %Uuid::new_v4(),
        comparison = %form.comparison
    );
    let result = state.comparison.compare(form).instrument(span).await?;
    Ok(Json(result))
}

//! HTTP request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;
use axum::Json;

use super::{AppState, RequestId};
use crate::error::Error;
use crate::gemini::{TextGenerationRequest, TextGenerationResponse};

/// Handle POST /predict.
///
/// Validation runs before any upstream activity; every adapter failure is
/// logged with its kind and collapsed to the fixed 502 envelope.
pub async fn predict(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<TextGenerationRequest>, JsonRejection>,
) -> Result<Json<TextGenerationResponse>, Error> {
    let Json(request) = payload.map_err(|rejection| Error::Validation {
        field: "body".to_string(),
        message: rejection.body_text(),
    })?;

    if let Err(error) = request.validate() {
        tracing::warn!(
            request_id = %request_id.0,
            error = %error,
            "Rejected invalid prediction request"
        );
        return Err(error);
    }

    tracing::info!(
        request_id = %request_id.0,
        prompt_chars = request.prompt.chars().count(),
        "Received prediction request"
    );

    match state.gemini.predict(&request).await {
        Ok(response) => {
            tracing::info!(
                request_id = %request_id.0,
                input_chars = response.input_chars,
                output_chars = response.output_chars,
                "Gemini response prepared"
            );
            Ok(Json(response))
        }
        Err(error) => {
            tracing::error!(
                request_id = %request_id.0,
                kind = error.kind(),
                error = %error,
                prompt_chars = request.prompt.chars().count(),
                "Gemini prediction failed"
            );
            Err(error)
        }
    }
}

/// Handle GET /health.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "gemini-relay"
    }))
}

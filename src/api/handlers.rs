use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{RecommendationRequest, RecommendationResult},
};

use super::AppState;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Personalized restaurant recommendations
///
/// A body that does not deserialize is reported as a 400 in the same `{"error": ...}`
/// shape as every other failure.
pub async fn personalized_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> AppResult<Json<RecommendationResult>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(request_id = %request_id, error = %rejection.body_text(), "Rejected request body");
        AppError::InvalidInput(rejection.body_text())
    })?;

    let query = request.apply_defaults()?;

    tracing::info!(
        request_id = %request_id,
        location = ?query.location,
        max_distance_km = query.profile.max_distance_km,
        cuisines = ?query.profile.cuisine_preferences,
        "Handling recommendation request"
    );

    let result = state.engine.get_recommendations(query).await?;
    Ok(Json(result))
}

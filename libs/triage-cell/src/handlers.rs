// libs/triage-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::MAX_SYMPTOM_TEXT_CHARS;
use crate::services::analyzer::SymptomAnalyzer;

/// Handler state carrying the injected analyzer so tests can substitute a
/// deterministic stub.
#[derive(Clone)]
pub struct TriageState {
    pub analyzer: Arc<dyn SymptomAnalyzer>,
}

#[derive(Debug, Deserialize)]
pub struct SymptomCheckRequest {
    pub symptoms: String,
}

/// One-shot symptom triage. Always answers 200 with a usable assessment,
/// even when the AI dependency is down; only malformed input is rejected.
#[axum::debug_handler]
pub async fn symptom_check(
    State(state): State<TriageState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<SymptomCheckRequest>,
) -> Result<Json<Value>, AppError> {
    let symptoms = request.symptoms.trim();

    if symptoms.is_empty() {
        return Err(AppError::ValidationError("Symptoms are required".to_string()));
    }

    if symptoms.chars().count() > MAX_SYMPTOM_TEXT_CHARS {
        return Err(AppError::ValidationError(format!(
            "Symptom description must be at most {} characters",
            MAX_SYMPTOM_TEXT_CHARS
        )));
    }

    info!("Symptom check requested by {}", user.medical_id);

    let result = state.analyzer.analyze_symptoms(symptoms).await;

    Ok(Json(json!({
        "message": result.formatted_message,
        "severity_score": result.severity_score,
        "urgency": result.urgency,
        "recommended_action": result.recommended_action
    })))
}

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use axum::extract::{Extension, State};
use axum::Json;

use shared_models::error::AppError;
use shared_utils::test_utils::TestUser;
use triage_cell::handlers::{symptom_check, SymptomCheckRequest, TriageState};
use triage_cell::models::{TriageResult, UrgencyLevel, MAX_SYMPTOM_TEXT_CHARS};
use triage_cell::services::analyzer::SymptomAnalyzer;

/// Deterministic stand-in for the external AI service.
struct StubAnalyzer {
    result: TriageResult,
}

#[async_trait]
impl SymptomAnalyzer for StubAnalyzer {
    async fn analyze_symptoms(&self, _symptoms: &str) -> TriageResult {
        self.result.clone()
    }
}

fn stub_state(result: TriageResult) -> State<TriageState> {
    State(TriageState {
        analyzer: Arc::new(StubAnalyzer { result }),
    })
}

fn patient_extension() -> Extension<shared_models::auth::AuthUser> {
    Extension(TestUser::patient("PAT001").to_auth_user())
}

fn sample_result() -> TriageResult {
    TriageResult {
        severity_score: 4.0,
        urgency: UrgencyLevel::NonUrgent,
        recommended_action: "Book a routine appointment".to_string(),
        formatted_message: "AI Symptom Assessment\n\nSeverity: 4/10".to_string(),
    }
}

#[tokio::test]
async fn test_symptom_check_returns_normalized_result() {
    let response = symptom_check(
        stub_state(sample_result()),
        patient_extension(),
        Json(SymptomCheckRequest {
            symptoms: "sore throat for two days".to_string(),
        }),
    )
    .await
    .expect("symptom check should succeed");

    let body = response.0;
    assert_eq!(body["severity_score"], 4.0);
    assert_eq!(body["urgency"], "Non-Urgent");
    assert_eq!(body["recommended_action"], "Book a routine appointment");
    assert!(body["message"].as_str().unwrap().contains("AI Symptom Assessment"));
}

#[tokio::test]
async fn test_symptom_check_rejects_blank_symptoms() {
    let result = symptom_check(
        stub_state(sample_result()),
        patient_extension(),
        Json(SymptomCheckRequest {
            symptoms: "   ".to_string(),
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_symptom_check_rejects_overlong_symptoms() {
    let result = symptom_check(
        stub_state(sample_result()),
        patient_extension(),
        Json(SymptomCheckRequest {
            symptoms: "a".repeat(MAX_SYMPTOM_TEXT_CHARS + 1),
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::ValidationError(_)));
}

// libs/triage-cell/src/services/analyzer.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::models::{TriageResult, TriageServiceError};
use crate::services::parser::{parse_ai_response, service_failure_result};

/// Bounded timeout for the one-shot AI call. No retries: a failed call
/// degrades to the fallback assessment instead.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

const SYSTEM_PROMPT: &str = "You are a careful medical triage assistant. You assess \
    free-text symptom descriptions and respond with a single JSON object. You never \
    diagnose; you classify urgency and suggest a next step.";

/// Injected triage dependency. Handlers hold this behind a trait object so
/// tests can substitute a deterministic stub.
#[async_trait]
pub trait SymptomAnalyzer: Send + Sync {
    async fn analyze_symptoms(&self, symptoms: &str) -> TriageResult;
}

pub struct OpenAiAnalyzer {
    api_key: String,
    base_url: String,
    model: String,
    http_client: Client,
}

impl OpenAiAnalyzer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
            model: config.openai_model.clone(),
            http_client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to construct HTTP client"),
        }
    }

    fn build_user_prompt(symptoms: &str) -> String {
        format!(
            "A patient reports the following symptoms: {}\n\n\
             Respond with a single JSON object with these fields:\n\
             - severity_score: number from 1 to 10\n\
             - urgency: one of \"Routine\", \"Non-Urgent\", \"Urgent\", \"Emergency\"\n\
             - assessment: short plain-language summary of the likely issue\n\
             - care_tips: array of short self-care suggestions\n\
             - warning_signs: array of symptoms that would require immediate care\n\
             - recommended_action: one-sentence next step for the patient\n\
             - disclaimer: one-sentence reminder that this is not a diagnosis",
            symptoms
        )
    }

    async fn request_completion(&self, symptoms: &str) -> Result<String, TriageServiceError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": Self::build_user_prompt(symptoms)
                }
            ],
            "temperature": 0.3
        });

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status, &error_text));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| TriageServiceError::Unavailable(e.to_string()))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| TriageServiceError::Unavailable("invalid AI response format".to_string()))
    }
}

#[async_trait]
impl SymptomAnalyzer for OpenAiAnalyzer {
    async fn analyze_symptoms(&self, symptoms: &str) -> TriageResult {
        debug!("Requesting triage assessment ({} chars of symptom text)", symptoms.len());

        match self.request_completion(symptoms).await {
            Ok(raw) => parse_ai_response(symptoms, &raw),
            Err(e) => {
                // Absorbed here: the caller always receives a usable result.
                warn!("Triage service call failed, returning fallback assessment: {}", e);
                service_failure_result(symptoms, &e)
            }
        }
    }
}

/// Classify an HTTP-level failure, in priority order: quota, missing model,
/// credentials, then everything else.
fn classify_api_error(status: StatusCode, body: &str) -> TriageServiceError {
    let lower = body.to_lowercase();

    if status == StatusCode::TOO_MANY_REQUESTS
        || lower.contains("quota")
        || lower.contains("rate limit")
    {
        TriageServiceError::QuotaExceeded
    } else if status == StatusCode::NOT_FOUND
        || lower.contains("model_not_found")
        || lower.contains("does not exist")
    {
        TriageServiceError::ModelUnavailable
    } else if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || lower.contains("api key")
    {
        TriageServiceError::AuthenticationFailed
    } else {
        TriageServiceError::Unavailable(format!("status {}", status))
    }
}

fn classify_transport_error(err: reqwest::Error) -> TriageServiceError {
    if err.is_timeout() {
        TriageServiceError::Unavailable("request timed out".to_string())
    } else {
        TriageServiceError::Unavailable(err.to_string())
    }
}

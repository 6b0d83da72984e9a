// libs/triage-cell/src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum accepted length for free-text symptom descriptions.
pub const MAX_SYMPTOM_TEXT_CHARS: usize = 2000;

// ==============================================================================
// URGENCY VOCABULARY
// ==============================================================================

/// Triage urgency classification, ordered from least to most pressing.
///
/// "Same Day" is the fixed classification returned whenever the AI response
/// cannot be used, so a degraded assessment still tells the patient to act.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UrgencyLevel {
    #[serde(rename = "Routine")]
    Routine,
    #[serde(rename = "Non-Urgent")]
    NonUrgent,
    #[serde(rename = "Same Day")]
    SameDay,
    #[serde(rename = "Urgent")]
    Urgent,
    #[serde(rename = "Emergency")]
    Emergency,
}

impl Default for UrgencyLevel {
    fn default() -> Self {
        UrgencyLevel::Routine
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrgencyLevel::Routine => write!(f, "Routine"),
            UrgencyLevel::NonUrgent => write!(f, "Non-Urgent"),
            UrgencyLevel::SameDay => write!(f, "Same Day"),
            UrgencyLevel::Urgent => write!(f, "Urgent"),
            UrgencyLevel::Emergency => write!(f, "Emergency"),
        }
    }
}

impl UrgencyLevel {
    /// Lenient parse for values coming out of model text. Unknown or
    /// misspelled levels degrade to Routine rather than failing the parse.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "routine" => UrgencyLevel::Routine,
            "non-urgent" | "non urgent" | "nonurgent" => UrgencyLevel::NonUrgent,
            "same day" | "same-day" => UrgencyLevel::SameDay,
            "urgent" => UrgencyLevel::Urgent,
            "emergency" => UrgencyLevel::Emergency,
            _ => UrgencyLevel::Routine,
        }
    }

    pub fn is_routine(&self) -> bool {
        matches!(self, UrgencyLevel::Routine)
    }
}

// ==============================================================================
// TRIAGE RESULT MODELS
// ==============================================================================

/// Normalized triage outcome. Always well-formed: the parser and the
/// analyzer both degrade to fixed fallback values instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageResult {
    pub severity_score: f64,
    pub urgency: UrgencyLevel,
    pub recommended_action: String,
    pub formatted_message: String,
}

/// The duck-typed JSON payload embedded in the AI text response. Every
/// field is optional; absent fields are defaulted at normalization time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTriageAssessment {
    #[serde(default)]
    pub severity_score: Option<f64>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub assessment: Option<String>,
    #[serde(default)]
    pub care_tips: Vec<String>,
    #[serde(default)]
    pub warning_signs: Vec<String>,
    #[serde(default)]
    pub recommended_action: Option<String>,
    #[serde(default)]
    pub disclaimer: Option<String>,
}

// ==============================================================================
// SERVICE ERRORS
// ==============================================================================

/// Failure classification for the external AI call. Never leaves the
/// analyzer: every variant is absorbed into a fallback `TriageResult`.
#[derive(Debug, thiserror::Error)]
pub enum TriageServiceError {
    #[error("AI service quota exceeded")]
    QuotaExceeded,

    #[error("AI model temporarily unavailable")]
    ModelUnavailable,

    #[error("AI service authentication failed")]
    AuthenticationFailed,

    #[error("AI service temporarily unavailable: {0}")]
    Unavailable(String),
}

impl TriageServiceError {
    /// The user-visible message embedded in the degraded report.
    pub fn user_message(&self) -> &'static str {
        match self {
            TriageServiceError::QuotaExceeded => "AI service quota exceeded",
            TriageServiceError::ModelUnavailable => "AI model temporarily unavailable",
            TriageServiceError::AuthenticationFailed => "AI service authentication failed",
            TriageServiceError::Unavailable(_) => "AI service temporarily unavailable",
        }
    }
}

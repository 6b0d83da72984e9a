// libs/triage-cell/src/services/parser.rs
use tracing::debug;

use crate::models::{RawTriageAssessment, TriageResult, TriageServiceError, UrgencyLevel};

/// Fixed fallback values used whenever the AI response cannot be parsed or
/// the service call failed. The patient always gets an actionable answer.
pub const FALLBACK_SEVERITY_SCORE: f64 = 5.0;
pub const FALLBACK_URGENCY: UrgencyLevel = UrgencyLevel::SameDay;
pub const FALLBACK_RECOMMENDED_ACTION: &str = "Book an appointment soon";

/// Turn raw AI text into a normalized triage result.
///
/// Pure text-to-structure transform: no network, no retry, and it never
/// fails. Malformed input degrades to the fixed fallback branch.
pub fn parse_ai_response(symptoms: &str, raw: &str) -> TriageResult {
    let parsed = extract_json_span(raw)
        .and_then(|span| serde_json::from_str::<RawTriageAssessment>(span).ok());

    match parsed {
        Some(assessment) => normalize(assessment),
        None => {
            debug!("AI response carried no usable JSON payload, using fallback assessment");
            fallback_result(symptoms, raw)
        }
    }
}

/// Greedy span extraction: first `{` through the last `}` of the text.
fn extract_json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

fn normalize(assessment: RawTriageAssessment) -> TriageResult {
    let severity_score = assessment.severity_score.unwrap_or(0.0);
    let urgency = assessment
        .urgency
        .as_deref()
        .map(UrgencyLevel::parse_lenient)
        .unwrap_or_default();
    let recommended_action = assessment.recommended_action.clone().unwrap_or_default();
    let formatted_message = build_report(&assessment, severity_score, urgency);

    TriageResult {
        severity_score,
        urgency,
        recommended_action,
        formatted_message,
    }
}

/// Multi-section plain-text report assembled from whichever fields the
/// model actually returned.
fn build_report(assessment: &RawTriageAssessment, severity_score: f64, urgency: UrgencyLevel) -> String {
    let mut sections: Vec<String> = Vec::new();

    sections.push("AI Symptom Assessment".to_string());

    if let Some(summary) = assessment.assessment.as_deref() {
        sections.push(format!("Assessment: {}", summary));
    }

    sections.push(format!("Severity: {}/10\nUrgency: {}", severity_score, urgency));

    if !assessment.care_tips.is_empty() {
        let tips = assessment
            .care_tips
            .iter()
            .map(|tip| format!("- {}", tip))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("What you can do now:\n{}", tips));
    }

    if !assessment.warning_signs.is_empty() {
        let signs = assessment
            .warning_signs
            .iter()
            .map(|sign| format!("- {}", sign))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Seek immediate care if:\n{}", signs));
    }

    if let Some(action) = assessment.recommended_action.as_deref() {
        sections.push(format!("Recommended action: {}", action));
    }

    if let Some(disclaimer) = assessment.disclaimer.as_deref() {
        sections.push(disclaimer.to_string());
    }

    sections.join("\n\n")
}

/// Fallback for responses with no parseable JSON: echo the patient's query
/// and the raw model text verbatim so nothing they were told is lost.
pub fn fallback_result(symptoms: &str, raw: &str) -> TriageResult {
    let formatted_message = format!(
        "AI Symptom Assessment\n\nYour symptoms: {}\n\n{}\n\nRecommended action: {}",
        symptoms, raw, FALLBACK_RECOMMENDED_ACTION
    );

    TriageResult {
        severity_score: FALLBACK_SEVERITY_SCORE,
        urgency: FALLBACK_URGENCY,
        recommended_action: FALLBACK_RECOMMENDED_ACTION.to_string(),
        formatted_message,
    }
}

/// Canned report for the error path: the service never answered, so the
/// report embeds the classified failure message instead of model text.
pub fn service_failure_result(symptoms: &str, error: &TriageServiceError) -> TriageResult {
    let formatted_message = format!(
        "AI Symptom Assessment\n\nYour symptoms: {}\n\nWe could not generate an automatic \
         assessment right now: {}. A doctor can review your symptoms directly.\n\n\
         Recommended action: {}",
        symptoms,
        error.user_message(),
        FALLBACK_RECOMMENDED_ACTION
    );

    TriageResult {
        severity_score: FALLBACK_SEVERITY_SCORE,
        urgency: FALLBACK_URGENCY,
        recommended_action: FALLBACK_RECOMMENDED_ACTION.to_string(),
        formatted_message,
    }
}

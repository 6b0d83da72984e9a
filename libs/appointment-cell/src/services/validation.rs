// libs/appointment-cell/src/services/validation.rs
//
// Explicit pre-persist validators. Every write path calls these
// synchronously before touching the store, so each rule is independently
// unit-testable.
use triage_cell::models::{UrgencyLevel, MAX_SYMPTOM_TEXT_CHARS};

use crate::models::{Appointment, AppointmentError};

pub const MIN_URGENCY_SCORE: f64 = 0.0;
pub const MAX_URGENCY_SCORE: f64 = 10.0;
pub const MIN_FEEDBACK_RATING: i32 = 1;
pub const MAX_FEEDBACK_RATING: i32 = 5;

/// Urgency gating: a non-Routine urgency is legal only on records whose
/// triage fields came from the symptom checker.
pub fn validate_urgency_gate(
    urgency_level: UrgencyLevel,
    from_symptom_checker: bool,
) -> Result<(), AppointmentError> {
    if !urgency_level.is_routine() && !from_symptom_checker {
        return Err(AppointmentError::ValidationError(
            "Non-routine urgency requires a symptom checker assessment".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_urgency_score(score: f64) -> Result<(), AppointmentError> {
    if !(MIN_URGENCY_SCORE..=MAX_URGENCY_SCORE).contains(&score) {
        return Err(AppointmentError::ValidationError(format!(
            "Urgency score must be between {} and {}",
            MIN_URGENCY_SCORE, MAX_URGENCY_SCORE
        )));
    }
    Ok(())
}

pub fn validate_symptoms(symptoms: &str) -> Result<(), AppointmentError> {
    if symptoms.trim().is_empty() {
        return Err(AppointmentError::ValidationError(
            "Symptoms are required".to_string(),
        ));
    }
    if symptoms.chars().count() > MAX_SYMPTOM_TEXT_CHARS {
        return Err(AppointmentError::ValidationError(format!(
            "Symptom description must be at most {} characters",
            MAX_SYMPTOM_TEXT_CHARS
        )));
    }
    Ok(())
}

pub fn validate_feedback_rating(rating: i32) -> Result<(), AppointmentError> {
    if !(MIN_FEEDBACK_RATING..=MAX_FEEDBACK_RATING).contains(&rating) {
        return Err(AppointmentError::ValidationError(format!(
            "Rating must be between {} and {}",
            MIN_FEEDBACK_RATING, MAX_FEEDBACK_RATING
        )));
    }
    Ok(())
}

/// Creation-time coercion: client-supplied urgency values are only honored
/// when the submission came through the symptom checker. Everything else
/// lands as Routine/0, whatever the client sent.
pub fn coerce_client_urgency(
    urgency_level: Option<UrgencyLevel>,
    urgency_score: Option<f64>,
    from_symptom_checker: bool,
) -> (UrgencyLevel, f64) {
    if from_symptom_checker {
        (urgency_level.unwrap_or_default(), urgency_score.unwrap_or(0.0))
    } else {
        (UrgencyLevel::Routine, 0.0)
    }
}

/// Field-level invariants checked before every persist, create or update.
pub fn validate_appointment(appointment: &Appointment) -> Result<(), AppointmentError> {
    validate_symptoms(&appointment.symptoms)?;
    validate_urgency_score(appointment.urgency_score)?;
    validate_urgency_gate(appointment.urgency_level, appointment.from_symptom_checker)?;
    Ok(())
}

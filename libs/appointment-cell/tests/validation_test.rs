use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentError, AppointmentStatus, MeetingType};
use appointment_cell::services::validation::{
    coerce_client_urgency, validate_appointment, validate_feedback_rating, validate_symptoms,
    validate_urgency_gate, validate_urgency_score,
};
use triage_cell::models::{UrgencyLevel, MAX_SYMPTOM_TEXT_CHARS};

fn routine_appointment() -> Appointment {
    let now = Utc::now();
    Appointment {
        id: Uuid::new_v4(),
        doctor_medical_id: "DOC001".to_string(),
        patient_medical_id: "PAT001".to_string(),
        doctor_name: "Dr. Test".to_string(),
        patient_name: "Test Patient".to_string(),
        doctor_email: None,
        patient_email: None,
        preferred_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        preferred_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        scheduled_date: None,
        scheduled_time: None,
        meeting_type: MeetingType::Offline,
        video_call_link: None,
        symptoms: "itchy rash on both arms".to_string(),
        urgency_level: UrgencyLevel::Routine,
        urgency_score: 0.0,
        from_symptom_checker: false,
        messages: Vec::new(),
        doctor_response: None,
        status: AppointmentStatus::Pending,
        cancelled_by: None,
        created_at: now,
        updated_at: now,
    }
}

// ==============================================================================
// URGENCY GATE
// ==============================================================================

#[test]
fn test_gate_blocks_unprovenance_urgency() {
    for level in [
        UrgencyLevel::NonUrgent,
        UrgencyLevel::SameDay,
        UrgencyLevel::Urgent,
        UrgencyLevel::Emergency,
    ] {
        assert_matches!(
            validate_urgency_gate(level, false),
            Err(AppointmentError::ValidationError(_))
        );
    }
}

#[test]
fn test_gate_allows_routine_without_provenance() {
    assert!(validate_urgency_gate(UrgencyLevel::Routine, false).is_ok());
}

#[test]
fn test_gate_allows_any_level_with_provenance() {
    for level in [
        UrgencyLevel::Routine,
        UrgencyLevel::NonUrgent,
        UrgencyLevel::SameDay,
        UrgencyLevel::Urgent,
        UrgencyLevel::Emergency,
    ] {
        assert!(validate_urgency_gate(level, true).is_ok());
    }
}

// ==============================================================================
// CREATION COERCION
// ==============================================================================

#[test]
fn test_coercion_ignores_client_urgency_without_provenance() {
    let (level, score) =
        coerce_client_urgency(Some(UrgencyLevel::Emergency), Some(9.5), false);
    assert_eq!(level, UrgencyLevel::Routine);
    assert_eq!(score, 0.0);
}

#[test]
fn test_coercion_passes_through_symptom_checker_values() {
    let (level, score) = coerce_client_urgency(Some(UrgencyLevel::SameDay), Some(5.0), true);
    assert_eq!(level, UrgencyLevel::SameDay);
    assert_eq!(score, 5.0);
}

#[test]
fn test_coercion_defaults_missing_values() {
    let (level, score) = coerce_client_urgency(None, None, true);
    assert_eq!(level, UrgencyLevel::Routine);
    assert_eq!(score, 0.0);
}

// ==============================================================================
// FIELD RANGES
// ==============================================================================

#[test]
fn test_urgency_score_bounds() {
    assert!(validate_urgency_score(0.0).is_ok());
    assert!(validate_urgency_score(10.0).is_ok());
    assert_matches!(
        validate_urgency_score(10.5),
        Err(AppointmentError::ValidationError(_))
    );
    assert_matches!(
        validate_urgency_score(-0.1),
        Err(AppointmentError::ValidationError(_))
    );
}

#[test]
fn test_symptoms_must_be_present_and_bounded() {
    assert!(validate_symptoms("persistent cough").is_ok());
    assert_matches!(
        validate_symptoms("   "),
        Err(AppointmentError::ValidationError(_))
    );
    assert_matches!(
        validate_symptoms(&"a".repeat(MAX_SYMPTOM_TEXT_CHARS + 1)),
        Err(AppointmentError::ValidationError(_))
    );
}

#[test]
fn test_feedback_rating_bounds() {
    for rating in 1..=5 {
        assert!(validate_feedback_rating(rating).is_ok());
    }
    assert_matches!(
        validate_feedback_rating(0),
        Err(AppointmentError::ValidationError(_))
    );
    assert_matches!(
        validate_feedback_rating(6),
        Err(AppointmentError::ValidationError(_))
    );
}

// ==============================================================================
// COMPOSITE PRE-PERSIST CHECK
// ==============================================================================

#[test]
fn test_validate_appointment_accepts_routine_record() {
    assert!(validate_appointment(&routine_appointment()).is_ok());
}

#[test]
fn test_validate_appointment_rejects_gate_violation_on_update() {
    // Update-time enforcement: a record whose urgency was bumped without
    // symptom checker provenance must fail before persisting.
    let mut appointment = routine_appointment();
    appointment.urgency_level = UrgencyLevel::Urgent;
    appointment.urgency_score = 8.0;

    assert_matches!(
        validate_appointment(&appointment),
        Err(AppointmentError::ValidationError(_))
    );
}

#[test]
fn test_validate_appointment_accepts_symptom_checker_urgency() {
    let mut appointment = routine_appointment();
    appointment.urgency_level = UrgencyLevel::SameDay;
    appointment.urgency_score = 5.0;
    appointment.from_symptom_checker = true;

    assert!(validate_appointment(&appointment).is_ok());
}

#[test]
fn test_validate_appointment_rejects_out_of_range_score() {
    let mut appointment = routine_appointment();
    appointment.from_symptom_checker = true;
    appointment.urgency_level = UrgencyLevel::Urgent;
    appointment.urgency_score = 11.0;

    assert_matches!(
        validate_appointment(&appointment),
        Err(AppointmentError::ValidationError(_))
    );
}

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use appointment_cell::models::{
    AppendMessageRequest, Appointment, AppointmentError, AppointmentStatus,
    ApproveAppointmentRequest, CancelledBy, MeetingType, RejectAppointmentRequest,
};
use appointment_cell::services::workflow::AppointmentWorkflowService;
use shared_models::auth::AuthUser;
use shared_utils::test_utils::TestUser;
use triage_cell::models::UrgencyLevel;

fn doctor() -> AuthUser {
    TestUser::doctor("DOC001").to_auth_user()
}

fn patient() -> AuthUser {
    TestUser::patient("PAT001").to_auth_user()
}

fn stranger() -> AuthUser {
    TestUser::patient("PAT999").to_auth_user()
}

fn sample_appointment(status: AppointmentStatus) -> Appointment {
    let now = Utc::now();
    Appointment {
        id: Uuid::new_v4(),
        doctor_medical_id: "DOC001".to_string(),
        patient_medical_id: "PAT001".to_string(),
        doctor_name: "Dr. Test".to_string(),
        patient_name: "Test Patient".to_string(),
        doctor_email: Some("doc001@example.com".to_string()),
        patient_email: Some("pat001@example.com".to_string()),
        preferred_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        preferred_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        scheduled_date: None,
        scheduled_time: None,
        meeting_type: MeetingType::Offline,
        video_call_link: None,
        symptoms: "persistent cough".to_string(),
        urgency_level: UrgencyLevel::Routine,
        urgency_score: 0.0,
        from_symptom_checker: false,
        messages: Vec::new(),
        doctor_response: None,
        status,
        cancelled_by: None,
        created_at: now,
        updated_at: now,
    }
}

// ==============================================================================
// APPROVAL
// ==============================================================================

#[test]
fn test_approve_pending_sets_schedule_and_response() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Pending);
    let before = appointment.updated_at;

    let decision = ApproveAppointmentRequest {
        message: Some("See you then".to_string()),
        scheduled_date: Some(NaiveDate::from_ymd_opt(2026, 9, 2).unwrap()),
        scheduled_time: Some(NaiveTime::from_hms_opt(14, 0, 0).unwrap()),
        video_call_link: None,
    };

    let updated = workflow
        .approve(&appointment, &doctor(), &decision)
        .expect("approval should succeed");

    assert_eq!(updated.status, AppointmentStatus::Approved);
    assert_eq!(updated.scheduled_date, decision.scheduled_date);
    assert_eq!(updated.scheduled_time, decision.scheduled_time);

    let response = updated.doctor_response.expect("doctor response should be set");
    assert_eq!(response.message, "See you then");
    assert!(response.responded_at >= before);
    assert!(updated.updated_at >= before);
}

#[test]
fn test_approve_defaults_schedule_to_patient_preference() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Pending);

    let updated = workflow
        .approve(&appointment, &doctor(), &ApproveAppointmentRequest::default())
        .expect("approval should succeed");

    assert_eq!(updated.scheduled_date, Some(appointment.preferred_date));
    assert_eq!(updated.scheduled_time, Some(appointment.preferred_time));
}

#[test]
fn test_approve_online_requires_video_link() {
    let workflow = AppointmentWorkflowService::new();
    let mut appointment = sample_appointment(AppointmentStatus::Pending);
    appointment.meeting_type = MeetingType::Online;

    let result = workflow.approve(&appointment, &doctor(), &ApproveAppointmentRequest::default());
    assert_matches!(result, Err(AppointmentError::ValidationError(_)));

    let decision = ApproveAppointmentRequest {
        video_call_link: Some("https://meet.example.com/abc".to_string()),
        ..Default::default()
    };
    let updated = workflow
        .approve(&appointment, &doctor(), &decision)
        .expect("approval with link should succeed");
    assert_eq!(
        updated.video_call_link.as_deref(),
        Some("https://meet.example.com/abc")
    );
}

#[test]
fn test_approve_requires_the_assigned_doctor() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Pending);

    let result = workflow.approve(&appointment, &patient(), &ApproveAppointmentRequest::default());
    assert_matches!(result, Err(AppointmentError::Unauthorized));

    let result = workflow.approve(&appointment, &stranger(), &ApproveAppointmentRequest::default());
    assert_matches!(result, Err(AppointmentError::Unauthorized));
}

#[test]
fn test_second_approval_is_rejected() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Pending);

    let approved = workflow
        .approve(&appointment, &doctor(), &ApproveAppointmentRequest::default())
        .expect("first approval should succeed");

    let result = workflow.approve(&approved, &doctor(), &ApproveAppointmentRequest::default());
    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::Approved,
            to: AppointmentStatus::Approved,
        })
    );
}

// ==============================================================================
// REJECTION, CANCELLATION, COMPLETION
// ==============================================================================

#[test]
fn test_reject_pending_records_message() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Pending);

    let updated = workflow
        .reject(
            &appointment,
            &doctor(),
            &RejectAppointmentRequest {
                message: "No availability this week".to_string(),
            },
        )
        .expect("rejection should succeed");

    assert_eq!(updated.status, AppointmentStatus::Rejected);
    assert_eq!(
        updated.doctor_response.unwrap().message,
        "No availability this week"
    );
}

#[test]
fn test_reject_requires_message() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Pending);

    let result = workflow.reject(
        &appointment,
        &doctor(),
        &RejectAppointmentRequest {
            message: "  ".to_string(),
        },
    );
    assert_matches!(result, Err(AppointmentError::ValidationError(_)));
}

#[test]
fn test_cancel_records_cancelling_party() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Pending);

    let by_patient = workflow.cancel(&appointment, &patient()).unwrap();
    assert_eq!(by_patient.status, AppointmentStatus::Cancelled);
    assert_eq!(by_patient.cancelled_by, Some(CancelledBy::Patient));

    let approved = sample_appointment(AppointmentStatus::Approved);
    let by_doctor = workflow.cancel(&approved, &doctor()).unwrap();
    assert_eq!(by_doctor.cancelled_by, Some(CancelledBy::Doctor));
}

#[test]
fn test_cancel_by_third_party_is_rejected() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Pending);

    let result = workflow.cancel(&appointment, &stranger());
    assert_matches!(result, Err(AppointmentError::Unauthorized));
}

#[test]
fn test_complete_approved_appointment() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Approved);

    let updated = workflow.complete(&appointment, &doctor()).unwrap();
    assert_eq!(updated.status, AppointmentStatus::Completed);
}

#[test]
fn test_complete_requires_doctor_and_approved_status() {
    let workflow = AppointmentWorkflowService::new();

    let pending = sample_appointment(AppointmentStatus::Pending);
    assert_matches!(
        workflow.complete(&pending, &doctor()),
        Err(AppointmentError::InvalidStatusTransition { .. })
    );

    let approved = sample_appointment(AppointmentStatus::Approved);
    assert_matches!(
        workflow.complete(&approved, &patient()),
        Err(AppointmentError::Unauthorized)
    );
}

// ==============================================================================
// TRANSITION MATRIX
// ==============================================================================

#[test]
fn test_terminal_states_allow_no_transitions() {
    let workflow = AppointmentWorkflowService::new();

    for status in [
        AppointmentStatus::Rejected,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Completed,
    ] {
        assert!(workflow.get_valid_transitions(&status).is_empty());
    }
}

#[test]
fn test_completed_to_approved_is_rejected_and_record_unchanged() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Completed);
    let snapshot = appointment.clone();

    let result = workflow.approve(&appointment, &doctor(), &ApproveAppointmentRequest::default());
    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Approved,
        })
    );

    assert_eq!(appointment.status, snapshot.status);
    assert_eq!(appointment.updated_at, snapshot.updated_at);
    assert!(appointment.doctor_response.is_none());
}

#[test]
fn test_rejected_cannot_be_approved() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Rejected);

    assert_matches!(
        workflow.approve(&appointment, &doctor(), &ApproveAppointmentRequest::default()),
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
}

// ==============================================================================
// NEGOTIATION THREAD
// ==============================================================================

#[test]
fn test_thread_append_is_monotonic_and_preserves_entries() {
    let workflow = AppointmentWorkflowService::new();
    let mut appointment = sample_appointment(AppointmentStatus::Pending);

    let senders = [patient(), doctor(), patient()];
    for (i, sender) in senders.iter().enumerate() {
        appointment = workflow
            .append_message(
                &appointment,
                sender,
                &AppendMessageRequest {
                    message: format!("message {}", i),
                },
            )
            .expect("append should succeed");

        assert_eq!(appointment.messages.len(), i + 1);
    }

    // Prior entries unchanged, in insertion order.
    for (i, entry) in appointment.messages.iter().enumerate() {
        assert_eq!(entry.message, format!("message {}", i));
        assert_eq!(entry.sender_medical_id, senders[i].medical_id);
    }
}

#[test]
fn test_thread_append_does_not_change_status() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Approved);

    let updated = workflow
        .append_message(
            &appointment,
            &patient(),
            &AppendMessageRequest {
                message: "running ten minutes late".to_string(),
            },
        )
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Approved);
}

#[test]
fn test_thread_append_rejected_on_terminal_records() {
    let workflow = AppointmentWorkflowService::new();

    for status in [
        AppointmentStatus::Completed,
        AppointmentStatus::Rejected,
        AppointmentStatus::Cancelled,
    ] {
        let appointment = sample_appointment(status);
        let result = workflow.append_message(
            &appointment,
            &patient(),
            &AppendMessageRequest {
                message: "hello?".to_string(),
            },
        );
        assert_matches!(result, Err(AppointmentError::ValidationError(_)));
        assert!(appointment.messages.is_empty());
    }
}

#[test]
fn test_thread_append_rejected_for_third_party() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Pending);

    let result = workflow.append_message(
        &appointment,
        &stranger(),
        &AppendMessageRequest {
            message: "let me in".to_string(),
        },
    );
    assert_matches!(result, Err(AppointmentError::Unauthorized));
}

#[test]
fn test_thread_append_advances_updated_at() {
    let workflow = AppointmentWorkflowService::new();
    let appointment = sample_appointment(AppointmentStatus::Pending);
    let before = appointment.updated_at;

    let updated = workflow
        .append_message(
            &appointment,
            &doctor(),
            &AppendMessageRequest {
                message: "could we do Tuesday instead?".to_string(),
            },
        )
        .unwrap();

    assert!(updated.updated_at >= before);
    assert_eq!(updated.messages[0].timestamp, updated.updated_at);
}

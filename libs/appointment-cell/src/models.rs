// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use triage_cell::models::UrgencyLevel;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// Appointment request aggregate. Party display names and emails are
/// denormalized at creation time and never re-synced from the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_medical_id: String,
    pub patient_medical_id: String,
    pub doctor_name: String,
    pub patient_name: String,
    pub doctor_email: Option<String>,
    pub patient_email: Option<String>,
    pub preferred_date: NaiveDate,
    pub preferred_time: NaiveTime,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub meeting_type: MeetingType,
    pub video_call_link: Option<String>,
    pub symptoms: String,
    pub urgency_level: UrgencyLevel,
    pub urgency_score: f64,
    pub from_symptom_checker: bool,
    pub messages: Vec<ThreadMessage>,
    pub doctor_response: Option<DoctorResponse>,
    pub status: AppointmentStatus,
    pub cancelled_by: Option<CancelledBy>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Whether `medical_id` is one of the two parties on this request.
    pub fn is_party(&self, medical_id: &str) -> bool {
        self.doctor_medical_id == medical_id || self.patient_medical_id == medical_id
    }

    pub fn party_of(&self, medical_id: &str) -> Option<CancelledBy> {
        if self.doctor_medical_id == medical_id {
            Some(CancelledBy::Doctor)
        } else if self.patient_medical_id == medical_id {
            Some(CancelledBy::Patient)
        } else {
            None
        }
    }
}

/// One entry of the negotiation thread. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadMessage {
    pub sender_medical_id: String,
    pub sender_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Doctor's decision note, set once on the transition into approved or
/// rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorResponse {
    pub message: String,
    pub responded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Terminal records accept no further transitions or thread messages.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Rejected | AppointmentStatus::Cancelled | AppointmentStatus::Completed
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Approved => write!(f, "approved"),
            AppointmentStatus::Rejected => write!(f, "rejected"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeetingType {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    Patient,
    Doctor,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_medical_id: String,
    pub patient_medical_id: String,
    pub preferred_date: NaiveDate,
    pub preferred_time: NaiveTime,
    pub symptoms: String,
    pub meeting_type: MeetingType,
    pub video_call_link: Option<String>,
    pub urgency_level: Option<UrgencyLevel>,
    pub urgency_score: Option<f64>,
    pub from_symptom_checker: Option<bool>,
}

/// Doctor's approval payload. Omitted schedule fields fall back to the
/// patient's preferred date and time (a counter-offer overrides them).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApproveAppointmentRequest {
    pub message: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub video_call_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectAppointmentRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendMessageRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitFeedbackRequest {
    pub rating: i32,
    pub comment: Option<String>,
}

/// Directory row for a patient or doctor, looked up by medical id at
/// creation time to capture the denormalized display fields.
#[derive(Debug, Clone, Deserialize)]
pub struct PartyRecord {
    pub medical_id: String,
    pub name: String,
    pub email: Option<String>,
}

// ==============================================================================
// FEEDBACK MODELS
// ==============================================================================

/// At most one feedback row per appointment, accepted only once the
/// appointment is completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Not authorized to perform this action on the appointment")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Feedback already submitted for this appointment")]
    FeedbackAlreadySubmitted,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

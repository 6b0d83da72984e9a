// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AuthUser;

use crate::models::{
    AppendMessageRequest, Appointment, AppointmentError, AppointmentStatus,
    ApproveAppointmentRequest, BookAppointmentRequest, Feedback, PartyRecord,
    RejectAppointmentRequest, SubmitFeedbackRequest,
};
use crate::services::validation::{
    coerce_client_urgency, validate_appointment, validate_feedback_rating, validate_symptoms,
};
use crate::services::workflow::AppointmentWorkflowService;

const APPOINTMENTS_TABLE: &str = "appointment_requests";
const FEEDBACK_TABLE: &str = "appointment_feedback";

/// Store-backed appointment operations. Each mutation is one row-scoped
/// write; the workflow service decides legality, the validators guard the
/// field invariants, and this service only talks to the store.
pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    workflow: AppointmentWorkflowService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            workflow: AppointmentWorkflowService::new(),
        }
    }

    /// Create a new appointment request in `pending` state. Party existence
    /// is verified up front and the display fields are captured from the
    /// directory rows; urgency values pass through the gate coercion.
    pub async fn create_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with doctor {}",
            request.patient_medical_id, request.doctor_medical_id
        );

        validate_symptoms(&request.symptoms)?;

        let patient = self
            .fetch_party("patients", &request.patient_medical_id, auth_token)
            .await?
            .ok_or(AppointmentError::PatientNotFound)?;

        let doctor = self
            .fetch_party("doctors", &request.doctor_medical_id, auth_token)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;

        let from_symptom_checker = request.from_symptom_checker.unwrap_or(false);
        let (urgency_level, urgency_score) = coerce_client_urgency(
            request.urgency_level,
            request.urgency_score,
            from_symptom_checker,
        );

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_medical_id: doctor.medical_id,
            patient_medical_id: patient.medical_id,
            doctor_name: doctor.name,
            patient_name: patient.name,
            doctor_email: doctor.email,
            patient_email: patient.email,
            preferred_date: request.preferred_date,
            preferred_time: request.preferred_time,
            scheduled_date: None,
            scheduled_time: None,
            meeting_type: request.meeting_type,
            video_call_link: request.video_call_link,
            symptoms: request.symptoms,
            urgency_level,
            urgency_score,
            from_symptom_checker,
            messages: Vec::new(),
            doctor_response: None,
            status: AppointmentStatus::Pending,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
        };

        validate_appointment(&appointment)?;

        let row = serde_json::to_value(&appointment)
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        self.supabase
            .insert::<Appointment>(APPOINTMENTS_TABLE, row, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let filter = format!("id=eq.{}&limit=1", appointment_id);
        let mut rows: Vec<Appointment> = self
            .supabase
            .select(APPOINTMENTS_TABLE, &filter, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        rows.pop().ok_or(AppointmentError::NotFound)
    }

    pub async fn get_patient_appointments(
        &self,
        patient_medical_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let filter = format!(
            "patient_medical_id=eq.{}&order=created_at.desc",
            patient_medical_id
        );
        self.supabase
            .select(APPOINTMENTS_TABLE, &filter, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    pub async fn get_doctor_appointments(
        &self,
        doctor_medical_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let filter = format!(
            "doctor_medical_id=eq.{}&order=created_at.desc",
            doctor_medical_id
        );
        self.supabase
            .select(APPOINTMENTS_TABLE, &filter, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    pub async fn approve_appointment(
        &self,
        appointment_id: Uuid,
        actor: &AuthUser,
        decision: ApproveAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id, auth_token).await?;
        let updated = self.workflow.approve(&current, actor, &decision)?;
        self.persist_transition(&updated, auth_token).await
    }

    pub async fn reject_appointment(
        &self,
        appointment_id: Uuid,
        actor: &AuthUser,
        decision: RejectAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id, auth_token).await?;
        let updated = self.workflow.reject(&current, actor, &decision)?;
        self.persist_transition(&updated, auth_token).await
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        actor: &AuthUser,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id, auth_token).await?;
        let updated = self.workflow.cancel(&current, actor)?;
        self.persist_transition(&updated, auth_token).await
    }

    pub async fn complete_appointment(
        &self,
        appointment_id: Uuid,
        actor: &AuthUser,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id, auth_token).await?;
        let updated = self.workflow.complete(&current, actor)?;
        self.persist_transition(&updated, auth_token).await
    }

    pub async fn append_message(
        &self,
        appointment_id: Uuid,
        actor: &AuthUser,
        request: AppendMessageRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id, auth_token).await?;
        let updated = self.workflow.append_message(&current, actor, &request)?;
        self.persist_transition(&updated, auth_token).await
    }

    /// Patient feedback on a completed appointment; one row per appointment.
    pub async fn submit_feedback(
        &self,
        appointment_id: Uuid,
        actor: &AuthUser,
        request: SubmitFeedbackRequest,
        auth_token: &str,
    ) -> Result<Feedback, AppointmentError> {
        validate_feedback_rating(request.rating)?;

        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        if actor.medical_id != appointment.patient_medical_id {
            return Err(AppointmentError::Unauthorized);
        }

        if appointment.status != AppointmentStatus::Completed {
            return Err(AppointmentError::ValidationError(
                "Feedback is allowed only after the appointment is completed".to_string(),
            ));
        }

        let filter = format!("appointment_id=eq.{}", appointment_id);
        let existing: Vec<Feedback> = self
            .supabase
            .select(FEEDBACK_TABLE, &filter, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if !existing.is_empty() {
            return Err(AppointmentError::FeedbackAlreadySubmitted);
        }

        let feedback = Feedback {
            id: Uuid::new_v4(),
            appointment_id,
            rating: request.rating,
            comment: request.comment,
            created_at: Utc::now(),
        };

        let row = serde_json::to_value(&feedback)
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        self.supabase
            .insert::<Feedback>(FEEDBACK_TABLE, row, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    async fn fetch_party(
        &self,
        table: &str,
        medical_id: &str,
        auth_token: &str,
    ) -> Result<Option<PartyRecord>, AppointmentError> {
        let filter = format!("medical_id=eq.{}&limit=1", medical_id);
        let mut rows: Vec<PartyRecord> = self
            .supabase
            .select(table, &filter, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(rows.pop())
    }

    /// Single PATCH carrying every workflow-mutable field. Relies on the
    /// store's per-row atomicity; no multi-document coordination.
    async fn persist_transition(
        &self,
        updated: &Appointment,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        validate_appointment(updated)?;

        debug!("Persisting appointment {} as {}", updated.id, updated.status);

        let patch = Self::transition_patch(updated);

        self.supabase
            .update_by_id::<Appointment>(
                APPOINTMENTS_TABLE,
                &updated.id.to_string(),
                patch,
                auth_token,
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    fn transition_patch(updated: &Appointment) -> Value {
        json!({
            "status": updated.status,
            "scheduled_date": updated.scheduled_date,
            "scheduled_time": updated.scheduled_time,
            "video_call_link": updated.video_call_link,
            "doctor_response": updated.doctor_response,
            "messages": updated.messages,
            "cancelled_by": updated.cancelled_by,
            "updated_at": updated.updated_at
        })
    }
}

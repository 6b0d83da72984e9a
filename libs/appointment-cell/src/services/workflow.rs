// libs/appointment-cell/src/services/workflow.rs
use chrono::Utc;
use tracing::{debug, info, warn};

use shared_models::auth::AuthUser;

use crate::models::{
    AppendMessageRequest, Appointment, AppointmentError, AppointmentStatus,
    ApproveAppointmentRequest, DoctorResponse, MeetingType, RejectAppointmentRequest,
    ThreadMessage,
};

/// The appointment state machine. All transition appliers are pure: they
/// take the current record by reference and return the mutated clone, so a
/// rejected operation leaves the stored record untouched by construction.
pub struct AppointmentWorkflowService;

impl AppointmentWorkflowService {
    pub fn new() -> Self {
        Self
    }

    /// Get all valid next statuses for a given current status.
    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Approved,
                AppointmentStatus::Rejected,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Approved => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Rejected => vec![],
            AppointmentStatus::Cancelled => vec![],
            AppointmentStatus::Completed => vec![],
        }
    }

    /// Validate that a status transition is allowed.
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        let valid_transitions = self.get_valid_transitions(current_status);

        if !valid_transitions.contains(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: *current_status,
                to: *new_status,
            });
        }

        Ok(())
    }

    /// Doctor approves a pending request. Sets the doctor response, confirms
    /// the schedule (counter-offer wins over the patient's preference), and
    /// requires a video link before an online appointment can be approved.
    pub fn approve(
        &self,
        appointment: &Appointment,
        actor: &AuthUser,
        decision: &ApproveAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        self.validate_status_transition(&appointment.status, &AppointmentStatus::Approved)?;
        self.require_doctor(appointment, actor)?;

        let mut updated = appointment.clone();

        if let Some(link) = &decision.video_call_link {
            updated.video_call_link = Some(link.clone());
        }

        if updated.meeting_type == MeetingType::Online
            && updated.video_call_link.as_deref().map_or(true, str::is_empty)
        {
            return Err(AppointmentError::ValidationError(
                "An online appointment requires a video call link before approval".to_string(),
            ));
        }

        let now = Utc::now();
        updated.status = AppointmentStatus::Approved;
        updated.scheduled_date = Some(decision.scheduled_date.unwrap_or(appointment.preferred_date));
        updated.scheduled_time = Some(decision.scheduled_time.unwrap_or(appointment.preferred_time));
        updated.doctor_response = Some(DoctorResponse {
            message: decision
                .message
                .clone()
                .unwrap_or_else(|| "Appointment approved".to_string()),
            responded_at: now,
        });
        updated.updated_at = now;

        info!("Appointment {} approved by {}", appointment.id, actor.medical_id);
        Ok(updated)
    }

    /// Doctor rejects a pending request with a mandatory message.
    pub fn reject(
        &self,
        appointment: &Appointment,
        actor: &AuthUser,
        decision: &RejectAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        self.validate_status_transition(&appointment.status, &AppointmentStatus::Rejected)?;
        self.require_doctor(appointment, actor)?;

        if decision.message.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "A rejection message is required".to_string(),
            ));
        }

        let now = Utc::now();
        let mut updated = appointment.clone();
        updated.status = AppointmentStatus::Rejected;
        updated.doctor_response = Some(DoctorResponse {
            message: decision.message.clone(),
            responded_at: now,
        });
        updated.updated_at = now;

        info!("Appointment {} rejected by {}", appointment.id, actor.medical_id);
        Ok(updated)
    }

    /// Either party cancels a pending or approved request. The cancelling
    /// party is recorded on the document.
    pub fn cancel(
        &self,
        appointment: &Appointment,
        actor: &AuthUser,
    ) -> Result<Appointment, AppointmentError> {
        self.validate_status_transition(&appointment.status, &AppointmentStatus::Cancelled)?;

        let party = appointment
            .party_of(&actor.medical_id)
            .ok_or(AppointmentError::Unauthorized)?;

        let mut updated = appointment.clone();
        updated.status = AppointmentStatus::Cancelled;
        updated.cancelled_by = Some(party);
        updated.updated_at = Utc::now();

        info!("Appointment {} cancelled by {}", appointment.id, actor.medical_id);
        Ok(updated)
    }

    /// Doctor marks an approved appointment as held. Completion is what
    /// makes the record eligible for patient feedback.
    pub fn complete(
        &self,
        appointment: &Appointment,
        actor: &AuthUser,
    ) -> Result<Appointment, AppointmentError> {
        self.validate_status_transition(&appointment.status, &AppointmentStatus::Completed)?;
        self.require_doctor(appointment, actor)?;

        let mut updated = appointment.clone();
        updated.status = AppointmentStatus::Completed;
        updated.updated_at = Utc::now();

        info!("Appointment {} completed by {}", appointment.id, actor.medical_id);
        Ok(updated)
    }

    /// Append one message to the negotiation thread. Does not change the
    /// status; rejected on terminal records. Existing entries are never
    /// touched.
    pub fn append_message(
        &self,
        appointment: &Appointment,
        actor: &AuthUser,
        request: &AppendMessageRequest,
    ) -> Result<Appointment, AppointmentError> {
        if appointment.status.is_terminal() {
            return Err(AppointmentError::ValidationError(format!(
                "Cannot add messages to a {} appointment",
                appointment.status
            )));
        }

        if !appointment.is_party(&actor.medical_id) {
            return Err(AppointmentError::Unauthorized);
        }

        if request.message.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "Message text is required".to_string(),
            ));
        }

        let now = Utc::now();
        let mut updated = appointment.clone();
        updated.messages.push(ThreadMessage {
            sender_medical_id: actor.medical_id.clone(),
            sender_name: actor.display_name(),
            message: request.message.clone(),
            timestamp: now,
        });
        updated.updated_at = now;

        debug!(
            "Message appended to appointment {} by {} (thread length {})",
            appointment.id,
            actor.medical_id,
            updated.messages.len()
        );
        Ok(updated)
    }

    fn require_doctor(
        &self,
        appointment: &Appointment,
        actor: &AuthUser,
    ) -> Result<(), AppointmentError> {
        if actor.medical_id != appointment.doctor_medical_id {
            warn!(
                "{} attempted a doctor-only action on appointment {}",
                actor.medical_id, appointment.id
            );
            return Err(AppointmentError::Unauthorized);
        }
        Ok(())
    }
}

impl Default for AppointmentWorkflowService {
    fn default() -> Self {
        Self::new()
    }
}

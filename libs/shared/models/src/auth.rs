use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub medical_id: Option<String>,
    pub name: Option<String>,
    pub iat: Option<u64>,
}

/// Authenticated caller, decoded from a verified bearer token.
///
/// `medical_id` is the business-logic key ("DOC001" / "PAT020"), distinct
/// from the auth subject in `id`. Token issuance happens outside this
/// service; we only verify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub medical_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub authenticated_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    pub fn is_doctor(&self) -> bool {
        self.role.as_deref() == Some("doctor")
    }

    pub fn is_patient(&self) -> bool {
        self.role.as_deref() == Some("patient")
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.medical_id.clone())
    }
}

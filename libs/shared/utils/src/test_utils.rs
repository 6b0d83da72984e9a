use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::AuthUser;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            openai_api_key: "test-openai-key".to_string(),
            openai_base_url: "http://localhost:18080/v1".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
        }
    }
}

impl TestConfig {
    /// Point the store at a wiremock server.
    pub fn with_store_url(mut self, url: &str) -> Self {
        self.supabase_url = url.to_string();
        self
    }

    /// Point the AI endpoint at a wiremock server.
    pub fn with_ai_url(mut self, url: &str) -> Self {
        self.openai_base_url = url.to_string();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            openai_api_key: self.openai_api_key.clone(),
            openai_base_url: self.openai_base_url.clone(),
            openai_model: self.openai_model.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub medical_id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl TestUser {
    pub fn new(medical_id: &str, name: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            medical_id: medical_id.to_string(),
            email: format!("{}@example.com", medical_id.to_lowercase()),
            name: name.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(medical_id: &str) -> Self {
        Self::new(medical_id, "Dr. Test", "doctor")
    }

    pub fn patient(medical_id: &str) -> Self {
        Self::new(medical_id, "Test Patient", "patient")
    }

    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id.clone(),
            medical_id: self.medical_id.clone(),
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            authenticated_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "medical_id": user.medical_id,
            "name": user.name,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }
}

/// Canned PostgREST rows for wiremock-backed tests.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn patient_row(medical_id: &str, email: &str, name: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "medical_id": medical_id,
            "email": email,
            "name": name,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_row(medical_id: &str, email: &str, name: &str, specialization: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "medical_id": medical_id,
            "email": email,
            "name": name,
            "specialization": specialization,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    /// A chat-completions body whose assistant message is `content`.
    pub fn chat_completion(content: &str) -> Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": content
                    },
                    "finish_reason": "stop"
                }
            ]
        })
    }
}

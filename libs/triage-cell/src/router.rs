// libs/triage-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::post, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, TriageState};
use crate::services::analyzer::{OpenAiAnalyzer, SymptomAnalyzer};

pub fn triage_routes(state: Arc<AppConfig>) -> Router {
    let analyzer: Arc<dyn SymptomAnalyzer> = Arc::new(OpenAiAnalyzer::new(&state));
    triage_routes_with_analyzer(state, analyzer)
}

/// Router construction with an explicit analyzer, used by tests to inject
/// a stub in place of the external AI service.
pub fn triage_routes_with_analyzer(
    state: Arc<AppConfig>,
    analyzer: Arc<dyn SymptomAnalyzer>,
) -> Router {
    let triage_state = TriageState { analyzer };

    Router::new()
        .route("/symptom-check", post(handlers::symptom_check))
        .layer(middleware::from_fn_with_state(state, auth_middleware))
        .with_state(triage_state)
}

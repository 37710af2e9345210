//! Health endpoint: liveness plus which remote services are configured.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub ok: bool,
    #[serde(rename = "hasOpenAI")]
    pub has_openai: bool,
    #[serde(rename = "hasAssemblyAI")]
    pub has_assemblyai: bool,
}

/// Handler for `GET /health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    Json(HealthReport {
        ok: true,
        has_openai: state.has_openai,
        has_assemblyai: state.pipeline.has_transcriber(),
    })
}

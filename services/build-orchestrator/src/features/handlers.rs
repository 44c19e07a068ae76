use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use shared::utilities::channel_names::ChannelNames;
use shared::utilities::errors::AppError;
use tracing::info;
use validator::Validate;

use crate::features::schemas::{CreateJobRequest, JobAcceptedResponse};
use crate::services::job_spec::BuildJobParams;
use crate::utilities::app_state::AppState;

/// Accept a deployment request and hand it to the orchestrator. The request
/// is in PENDING state the moment we return 202; everything after that is
/// observable through the log channel and the status endpoint.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let params: BuildJobParams = req.into();
    let deployment_id = params.deployment_id.clone();
    let channel = ChannelNames::deployment_logs(&deployment_id);

    info!("📦 Accepted deployment {}", deployment_id);

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        orchestrator.run_deployment(params).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAcceptedResponse {
            deployment_id,
            channel,
        }),
    ))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "build-orchestrator"
    }))
}

use async_trait::async_trait;
use serde_json::json;
use shared::models::DeploymentStatus;
use shared::utilities::errors::AppError;
use tracing::info;

/// Authoritative persistence for deployment state, owned by the API service.
/// The orchestrator is the sole writer during a run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeploymentBackend: Send + Sync {
    async fn update_status(
        &self,
        deployment_id: &str,
        status: DeploymentStatus,
    ) -> Result<(), AppError>;

    async fn persist_logs(&self, deployment_id: &str, logs: &[String]) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct ApiBackend {
    pub http: reqwest::Client,
    pub endpoint: String,
    pub api_key: String,
}

#[async_trait]
impl DeploymentBackend for ApiBackend {
    async fn update_status(
        &self,
        deployment_id: &str,
        status: DeploymentStatus,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}/deployment?deploymentIdWithStatus={}-{}",
            self.endpoint, deployment_id, status
        );

        let response = self
            .http
            .patch(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::PersistenceError(e.to_string()))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(AppError::PersistenceError(format!(
                "status update for {deployment_id} returned {}",
                response.status()
            )));
        }

        info!("Deployment {} status persisted: {}", deployment_id, status);
        Ok(())
    }

    async fn persist_logs(&self, deployment_id: &str, logs: &[String]) -> Result<(), AppError> {
        let url = format!("{}/logs", self.endpoint);

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&json!({
                "logs": logs,
                "deploymentId": deployment_id,
            }))
            .send()
            .await
            .map_err(|e| AppError::PersistenceError(e.to_string()))?;

        if response.status() != reqwest::StatusCode::CREATED {
            return Err(AppError::PersistenceError(format!(
                "log persistence for {deployment_id} returned {}",
                response.status()
            )));
        }

        info!(
            "Persisted {} log entries for deployment {}",
            logs.len(),
            deployment_id
        );
        Ok(())
    }
}

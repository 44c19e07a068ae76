use async_trait::async_trait;
use serde_json::json;
use shared::models::DeploymentStatus;
use shared::utilities::errors::AppError;
use tracing::info;

/// Terminal-status notification. Strictly best-effort: the run's status has
/// already been recorded by the time this fires, so callers log and swallow
/// any failure here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, email: &str, status: DeploymentStatus) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct WebhookNotifier {
    pub http: reqwest::Client,
    pub webhook_url: String,
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, email: &str, status: DeploymentStatus) -> Result<(), AppError> {
        let (subject, body) = match status {
            DeploymentStatus::Success => (
                "Your deployment is live",
                "The build finished and your site has been deployed.",
            ),
            DeploymentStatus::Failed => (
                "Your deployment failed",
                "The build did not complete. Check the deployment logs for details.",
            ),
            _ => ("Deployment update", "Your deployment status changed."),
        };

        let response = self
            .http
            .post(&self.webhook_url)
            .json(&json!({
                "status": status,
                "email": email,
                "subject": subject,
                "body": body,
            }))
            .send()
            .await
            .map_err(|e| AppError::NotificationError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::NotificationError(format!(
                "notification webhook returned {}",
                response.status()
            )));
        }

        info!("Notification sent to {} ({})", email, status);
        Ok(())
    }
}

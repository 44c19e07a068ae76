use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::job_spec::BuildJobParams;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[validate(length(min = 1, message = "gitUrl is required"))]
    pub git_url: String,

    #[validate(length(min = 1, message = "projectId is required"))]
    pub project_id: String,

    #[validate(length(min = 1, message = "sourceDirectory is required"))]
    pub source_directory: String,

    #[validate(length(min = 1, message = "deploymentId is required"))]
    pub deployment_id: String,

    #[validate(email)]
    pub email: String,

    pub branch: Option<String>,
    pub access_token: Option<String>,
    pub build_command: Option<String>,
    pub install_command: Option<String>,
    pub commit_sha: Option<String>,
    pub name: Option<String>,

    #[serde(default)]
    pub environment_variables: Vec<EnvironmentVariable>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

impl From<CreateJobRequest> for BuildJobParams {
    fn from(req: CreateJobRequest) -> Self {
        BuildJobParams {
            git_url: req.git_url,
            project_id: req.project_id,
            source_directory: req.source_directory,
            branch: req.branch,
            access_token: req.access_token,
            build_command: req.build_command,
            install_command: req.install_command,
            commit_sha: req.commit_sha,
            deployment_id: req.deployment_id,
            email: req.email,
            environment_variables: req
                .environment_variables
                .into_iter()
                .map(|var| (var.name, var.value))
                .collect(),
            name: req.name,
        }
    }
}

/// Returned with 202: the run continues in the background, and the caller
/// subscribes to `channel` to follow it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAcceptedResponse {
    pub deployment_id: String,
    pub channel: String,
}

use std::collections::BTreeMap;

use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{Container, EnvVar, PodSpec, PodTemplateSpec};
use kube::api::ObjectMeta;
use shared::utilities::errors::AppError;
use uuid::Uuid;

/// Everything the caller knows about one deployment request. Assembled by the
/// submission handler and carried through the whole run.
#[derive(Debug, Clone)]
pub struct BuildJobParams {
    pub git_url: String,
    pub project_id: String,
    pub source_directory: String,
    pub branch: Option<String>,
    pub access_token: Option<String>,
    pub build_command: Option<String>,
    pub install_command: Option<String>,
    pub commit_sha: Option<String>,
    pub deployment_id: String,
    pub email: String,
    pub environment_variables: Vec<(String, String)>,
    pub name: Option<String>,
}

/// Static inputs to job construction, lifted out of `Config` once at startup.
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub image: String,
    pub namespace: String,
    pub backoff_limit: i32,
    pub ttl_seconds_after_finished: Option<i32>,
    pub s3_region: Option<String>,
    pub s3_access_key_id: Option<String>,
    pub s3_secret_key: Option<String>,
    pub s3_bucket_name: Option<String>,
}

/// Immutable description of one build job. Created once per deployment
/// request and handed to the cluster as-is.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    pub job_name: String,
    pub container_name: String,
    pub namespace: String,
    pub image: String,
    pub env: Vec<(String, String)>,
    pub backoff_limit: i32,
    pub ttl_seconds_after_finished: Option<i32>,
}

/// Pure construction: no network, no disk. Fails only on missing required
/// fields; everything else is the caller's validation problem.
pub fn build_job_spec(
    params: &BuildJobParams,
    settings: &JobSettings,
) -> Result<JobDescriptor, AppError> {
    for (field, value) in [
        ("gitUrl", &params.git_url),
        ("projectId", &params.project_id),
        ("sourceDirectory", &params.source_directory),
        ("deploymentId", &params.deployment_id),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::ValidationError(format!("{field} is required")));
        }
    }

    let unique_id = Uuid::new_v4();
    let prefix = params
        .name
        .as_deref()
        .map(sanitize_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "build-job".to_string());
    let job_name = format!("{prefix}-{unique_id}");
    let container_name = format!("build-container-{unique_id}");

    let mut env: Vec<(String, String)> = vec![
        ("GIT_REPOSITORY_URL".to_string(), params.git_url.clone()),
        ("PROJECT_ID".to_string(), params.project_id.clone()),
        (
            "SOURCE_DIRECTORY".to_string(),
            params.source_directory.clone(),
        ),
    ];

    if let Some(branch) = &params.branch {
        env.push(("BRANCH".to_string(), branch.clone()));
    }
    if let Some(access_token) = &params.access_token {
        env.push(("ACCESS_TOKEN".to_string(), access_token.clone()));
    }
    if let Some(build_command) = &params.build_command {
        env.push(("BUILD_COMMAND".to_string(), build_command.clone()));
    }
    if let Some(install_command) = &params.install_command {
        env.push(("INSTALL_COMMAND".to_string(), install_command.clone()));
    }
    if let Some(commit_sha) = &params.commit_sha {
        env.push(("COMMIT_SHA".to_string(), commit_sha.clone()));
    }
    env.push(("DEPLOYMENT_ID".to_string(), params.deployment_id.clone()));

    if let Some(s3_region) = &settings.s3_region {
        env.push(("S3_REGION".to_string(), s3_region.clone()));
    }
    if let Some(s3_access_key_id) = &settings.s3_access_key_id {
        env.push(("S3_ACCESS_KEY".to_string(), s3_access_key_id.clone()));
    }
    if let Some(s3_secret_key) = &settings.s3_secret_key {
        env.push(("S3_SECRET_ACCESS_KEY".to_string(), s3_secret_key.clone()));
    }
    if let Some(s3_bucket_name) = &settings.s3_bucket_name {
        env.push(("S3_BUCKET_NAME".to_string(), s3_bucket_name.clone()));
    }

    for (name, value) in &params.environment_variables {
        env.push((name.clone(), value.clone()));
    }

    Ok(JobDescriptor {
        job_name,
        container_name,
        namespace: settings.namespace.clone(),
        image: settings.image.clone(),
        env,
        backoff_limit: settings.backoff_limit,
        ttl_seconds_after_finished: settings.ttl_seconds_after_finished,
    })
}

impl JobDescriptor {
    /// Render into the batch/v1 Job object the cluster accepts. One pod,
    /// restartPolicy Never; retries stay on the orchestrator side via the
    /// backoff limit.
    pub fn to_job(&self) -> Job {
        let mut labels = BTreeMap::new();
        labels.insert("job-name".to_string(), self.job_name.clone());

        let container_env: Vec<EnvVar> = self
            .env
            .iter()
            .map(|(name, value)| EnvVar {
                name: name.clone(),
                value: Some(value.clone()),
                ..Default::default()
            })
            .collect();

        Job {
            metadata: ObjectMeta {
                name: Some(self.job_name.clone()),
                namespace: Some(self.namespace.clone()),
                ..Default::default()
            },
            spec: Some(JobSpec {
                backoff_limit: Some(self.backoff_limit),
                ttl_seconds_after_finished: self.ttl_seconds_after_finished,
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![Container {
                            name: self.container_name.clone(),
                            image: Some(self.image.clone()),
                            env: if container_env.is_empty() {
                                None
                            } else {
                                Some(container_env)
                            },
                            ..Default::default()
                        }],
                        restart_policy: Some("Never".to_string()),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .replace(['_', ' ', '.'], "-")
        .trim_matches('-')
        .to_string()
}

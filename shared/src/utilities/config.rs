use std::{path::Path, str::FromStr};

use tokio::fs;

use crate::utilities::errors::AppError;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_address: String,
    pub gateway_address: String,

    // KUBERNETES
    pub k8s_in_cluster: bool,
    pub k8s_config_path: Option<String>,
    pub k8s_namespace: String,
    pub builder_image: String,

    // REDIS
    pub redis_url: String,

    // BACKEND API (status + log persistence)
    pub api_endpoint: String,
    pub api_key: String,

    // NOTIFICATIONS
    pub notify_webhook_url: String,

    // S3 (credentials handed to build jobs)
    pub s3_region: Option<String>,
    pub s3_access_key_id: Option<String>,
    pub s3_secret_key: Option<String>,
    pub s3_bucket_name: Option<String>,

    // ORCHESTRATION
    pub pod_retry_attempts: u32,
    pub pod_retry_delay_secs: u64,
    pub pod_poll_interval_secs: u64,
    pub log_chunk_size: usize,
    pub log_tail_lines: i64,
    pub run_timeout_secs: u64,
}

impl Config {
    pub async fn init() -> Result<Self, AppError> {
        let server_address = get_config_value(
            "SERVER_ADDRESS",
            Some("SERVER_ADDRESS"),
            Some("0.0.0.0:8010".to_string()),
        )
        .await?;

        let gateway_address = get_config_value(
            "GATEWAY_ADDRESS",
            Some("GATEWAY_ADDRESS"),
            Some("0.0.0.0:8011".to_string()),
        )
        .await?;

        let k8s_in_cluster =
            get_config_value("K8S_IN_CLUSTER", Some("K8S_IN_CLUSTER"), Some(false)).await?;
        let k8s_config_path =
            get_optional_config_value("K8S_KUBECONFIG", Some("K8S_KUBECONFIG")).await?;
        let k8s_namespace = get_config_value(
            "K8S_NAMESPACE",
            Some("K8S_NAMESPACE"),
            Some("default".to_string()),
        )
        .await?;

        let builder_image = get_config_value("BUILDER_IMAGE", Some("BUILDER_IMAGE"), None).await?;

        let redis_url = get_config_value(
            "REDIS_URL",
            Some("REDIS_URL"),
            Some("redis://localhost:6379/0".to_string()),
        )
        .await?;

        let api_endpoint = get_config_value(
            "API_ENDPOINT",
            Some("API_ENDPOINT"),
            Some("http://localhost:3000/api".to_string()),
        )
        .await?;
        let api_key = get_config_value("API_KEY", Some("API_KEY"), None).await?;

        let notify_webhook_url =
            get_config_value("NOTIFY_WEBHOOK_URL", Some("NOTIFY_WEBHOOK_URL"), None).await?;

        let s3_region = get_optional_config_value("S3_REGION", Some("S3_REGION")).await?;
        let s3_access_key_id =
            get_optional_config_value("S3_ACCESS_KEY_ID", Some("S3_ACCESS_KEY_ID")).await?;
        let s3_secret_key =
            get_optional_config_value("S3_SECRET_KEY", Some("S3_SECRET_KEY")).await?;
        let s3_bucket_name =
            get_optional_config_value("S3_BUCKET_NAME", Some("S3_BUCKET_NAME")).await?;

        let pod_retry_attempts =
            get_config_value("POD_RETRY_ATTEMPTS", Some("POD_RETRY_ATTEMPTS"), Some(5)).await?;
        let pod_retry_delay_secs = get_config_value(
            "POD_RETRY_DELAY_SECS",
            Some("POD_RETRY_DELAY_SECS"),
            Some(5),
        )
        .await?;
        let pod_poll_interval_secs = get_config_value(
            "POD_POLL_INTERVAL_SECS",
            Some("POD_POLL_INTERVAL_SECS"),
            Some(5),
        )
        .await?;
        let log_chunk_size =
            get_config_value("LOG_CHUNK_SIZE", Some("LOG_CHUNK_SIZE"), Some(1024)).await?;
        let log_tail_lines =
            get_config_value("LOG_TAIL_LINES", Some("LOG_TAIL_LINES"), Some(10)).await?;
        let run_timeout_secs =
            get_config_value("RUN_TIMEOUT_SECS", Some("RUN_TIMEOUT_SECS"), Some(1800)).await?;

        Ok(Config {
            server_address,
            gateway_address,
            k8s_in_cluster,
            k8s_config_path,
            k8s_namespace,
            builder_image,
            redis_url,
            api_endpoint,
            api_key,
            notify_webhook_url,
            s3_region,
            s3_access_key_id,
            s3_secret_key,
            s3_bucket_name,
            pod_retry_attempts,
            pod_retry_delay_secs,
            pod_poll_interval_secs,
            log_chunk_size,
            log_tail_lines,
            run_timeout_secs,
        })
    }
}

/// Docker secret -> env var lookup, parsed into the requested type.
pub async fn get_optional_config_value<T>(
    secret_name: &str,
    env_name: Option<&str>,
) -> Result<Option<T>, AppError>
where
    T: FromStr,
{
    let docker_secret = Path::new("/run/secrets").join(secret_name);
    if docker_secret.exists()
        && let Ok(content) = fs::read_to_string(&docker_secret).await
        && let Ok(parsed) = T::from_str(content.trim())
    {
        return Ok(Some(parsed));
    }

    if let Some(env_key) = env_name
        && let Ok(val) = std::env::var(env_key)
        && let Ok(parsed) = T::from_str(val.trim())
    {
        return Ok(Some(parsed));
    }

    Ok(None)
}

pub async fn get_config_value<T>(
    secret_name: &str,
    env_name: Option<&str>,
    fallback: Option<T>,
) -> Result<T, AppError>
where
    T: FromStr + Clone,
{
    if let Some(value) = get_optional_config_value::<T>(secret_name, env_name).await? {
        return Ok(value);
    }

    fallback.ok_or_else(|| {
        AppError::EnvironmentVariableNotSetError(env_name.unwrap_or(secret_name).to_string())
    })
}

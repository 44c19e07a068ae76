use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{ListParams, LogParams, PostParams};
use kube::{Api, Client};
use shared::utilities::errors::AppError;
use tokio_util::compat::FuturesAsyncReadCompatExt;
use tokio_util::io::ReaderStream;

use crate::services::job_spec::JobDescriptor;

/// Live follow-tail of one container's stdout.
pub type LogStream = BoxStream<'static, std::io::Result<Bytes>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl From<&str> for PodPhase {
    fn from(phase: &str) -> Self {
        match phase {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PodState {
    pub phase: PodPhase,
    pub containers_ready: bool,
}

impl PodState {
    pub fn is_ready(&self) -> bool {
        self.phase == PodPhase::Running && self.containers_ready
    }
}

/// Seam between the orchestration pipeline and the cluster. One long-lived
/// implementation per process; every method is independently safe under
/// concurrent calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Submit the job. Success means the cluster accepted the descriptor,
    /// not that anything is running yet.
    async fn create_job(&self, descriptor: &JobDescriptor) -> Result<(), AppError>;

    /// Look up the single worker pod scheduled for a job, by label selector.
    async fn find_job_pod(
        &self,
        namespace: &str,
        job_name: &str,
    ) -> Result<Option<String>, AppError>;

    async fn pod_state(&self, namespace: &str, pod_name: &str) -> Result<PodState, AppError>;

    async fn tail_container_logs(
        &self,
        namespace: &str,
        pod_name: &str,
        container_name: &str,
        tail_lines: i64,
    ) -> Result<LogStream, AppError>;
}

#[derive(Clone)]
pub struct KubeCluster {
    pub client: Client,
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn create_job(&self, descriptor: &JobDescriptor) -> Result<(), AppError> {
        let jobs: Api<Job> = Api::namespaced(self.client.clone(), &descriptor.namespace);

        jobs.create(&PostParams::default(), &descriptor.to_job())
            .await
            .map_err(|e| AppError::SubmissionError(e.to_string()))?;

        Ok(())
    }

    async fn find_job_pod(
        &self,
        namespace: &str,
        job_name: &str,
    ) -> Result<Option<String>, AppError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let selector = format!("job-name={job_name}");

        let list = pods.list(&ListParams::default().labels(&selector)).await?;

        Ok(list
            .items
            .into_iter()
            .find_map(|pod| pod.metadata.name))
    }

    async fn pod_state(&self, namespace: &str, pod_name: &str) -> Result<PodState, AppError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = pods.get(pod_name).await?;

        let status = pod.status.unwrap_or_default();
        let phase = status
            .phase
            .as_deref()
            .map(PodPhase::from)
            .unwrap_or(PodPhase::Unknown);
        let containers_ready = status
            .container_statuses
            .as_ref()
            .map(|statuses| statuses.iter().all(|s| s.ready))
            .unwrap_or(false);

        Ok(PodState {
            phase,
            containers_ready,
        })
    }

    async fn tail_container_logs(
        &self,
        namespace: &str,
        pod_name: &str,
        container_name: &str,
        tail_lines: i64,
    ) -> Result<LogStream, AppError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);

        let params = LogParams {
            follow: true,
            container: Some(container_name.to_string()),
            tail_lines: Some(tail_lines),
            ..Default::default()
        };

        let reader = pods.log_stream(pod_name, &params).await?;

        Ok(ReaderStream::new(reader.compat()).boxed())
    }
}

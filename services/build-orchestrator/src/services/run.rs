use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use shared::models::DeploymentStatus;
use shared::utilities::channel_names::ChannelNames;
use shared::utilities::config::Config;
use shared::utilities::errors::AppError;
use tracing::{error, info, warn};

use crate::services::backend::DeploymentBackend;
use crate::services::cluster::{ClusterApi, PodPhase};
use crate::services::job_spec::{BuildJobParams, JobDescriptor, JobSettings, build_job_spec};
use crate::services::notifier::Notifier;
use crate::services::publisher::{LogPublisher, chunk_logs};

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub job: JobSettings,
    pub pod_retry_attempts: u32,
    pub pod_retry_delay: Duration,
    pub pod_poll_interval: Duration,
    pub log_chunk_size: usize,
    pub log_tail_lines: i64,
    pub run_timeout: Duration,
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            job: JobSettings {
                image: config.builder_image.clone(),
                namespace: config.k8s_namespace.clone(),
                backoff_limit: 4,
                ttl_seconds_after_finished: None,
                s3_region: config.s3_region.clone(),
                s3_access_key_id: config.s3_access_key_id.clone(),
                s3_secret_key: config.s3_secret_key.clone(),
                s3_bucket_name: config.s3_bucket_name.clone(),
            },
            pod_retry_attempts: config.pod_retry_attempts,
            pod_retry_delay: Duration::from_secs(config.pod_retry_delay_secs),
            pod_poll_interval: Duration::from_secs(config.pod_poll_interval_secs),
            log_chunk_size: config.log_chunk_size,
            log_tail_lines: config.log_tail_lines,
            run_timeout: Duration::from_secs(config.run_timeout_secs),
        }
    }
}

/// Per-run state threaded through every phase: the channel all log traffic
/// goes to, the session log buffer, and the status machine's current state.
pub struct RunContext {
    pub deployment_id: String,
    pub channel: String,
    pub email: String,
    pub status: DeploymentStatus,
    pub log_buffer: Vec<String>,
}

impl RunContext {
    fn new(params: &BuildJobParams) -> Self {
        Self {
            deployment_id: params.deployment_id.clone(),
            channel: ChannelNames::deployment_logs(&params.deployment_id),
            email: params.email.clone(),
            status: DeploymentStatus::Pending,
            log_buffer: Vec::new(),
        }
    }
}

/// Drives one deployment request end to end: submit the build job, find its
/// pod, wait for readiness, tail the container output onto the log channel,
/// and settle the deployment status with its side effects.
pub struct Orchestrator {
    cluster: Arc<dyn ClusterApi>,
    publisher: Arc<dyn LogPublisher>,
    backend: Arc<dyn DeploymentBackend>,
    notifier: Arc<dyn Notifier>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        cluster: Arc<dyn ClusterApi>,
        publisher: Arc<dyn LogPublisher>,
        backend: Arc<dyn DeploymentBackend>,
        notifier: Arc<dyn Notifier>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            cluster,
            publisher,
            backend,
            notifier,
            settings,
        }
    }

    /// Entry point for one deployment run. Never returns an error to the
    /// caller: every outcome surfaces through the status endpoint and the
    /// log channel. The whole run sits under a deadline so a pod the
    /// cluster never gets healthy cannot hold a task forever.
    pub async fn run_deployment(&self, params: BuildJobParams) {
        let mut ctx = RunContext::new(&params);
        info!("Starting deployment run {}", ctx.deployment_id);

        let timeout = self.settings.run_timeout;
        let outcome = match tokio::time::timeout(timeout, self.execute(&params, &mut ctx)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::RunTimeout(timeout.as_secs())),
        };

        match outcome {
            Ok(()) => info!("Deployment run {} finished: {}", ctx.deployment_id, ctx.status),
            Err(e) => {
                error!("Deployment run {} failed: {}", ctx.deployment_id, e);
                self.finish_failed(&mut ctx, &e).await;
            }
        }
    }

    async fn execute(&self, params: &BuildJobParams, ctx: &mut RunContext) -> Result<(), AppError> {
        let descriptor = build_job_spec(params, &self.settings.job)?;

        self.cluster.create_job(&descriptor).await?;
        self.publish(ctx, &format!("Job {} created successfully", descriptor.job_name))
            .await;
        self.transition(ctx, DeploymentStatus::Running).await?;

        let pod_name = self.resolve_pod(&descriptor).await?;
        self.wait_for_pod_ready(ctx, &descriptor.namespace, &pod_name)
            .await?;
        self.stream_logs(ctx, &descriptor, &pod_name).await?;

        // The stream closed on its own; the pod's final phase decides the
        // terminal status.
        let state = self
            .cluster
            .pod_state(&descriptor.namespace, &pod_name)
            .await?;
        if state.phase == PodPhase::Failed {
            self.publish(ctx, &format!("Pod {pod_name} failed")).await;
            return Err(AppError::PodFailed(pod_name));
        }

        self.finish_succeeded(ctx).await
    }

    /// Pod scheduling is asynchronous relative to job acceptance; a fixed
    /// retry budget bounds latency instead of polling forever on a cluster
    /// that can never place the pod.
    async fn resolve_pod(&self, descriptor: &JobDescriptor) -> Result<String, AppError> {
        for attempt in 1..=self.settings.pod_retry_attempts {
            if let Some(pod_name) = self
                .cluster
                .find_job_pod(&descriptor.namespace, &descriptor.job_name)
                .await?
            {
                info!("Job {} scheduled pod {}", descriptor.job_name, pod_name);
                return Ok(pod_name);
            }

            info!(
                "No pod for job {} yet (attempt {}/{})",
                descriptor.job_name, attempt, self.settings.pod_retry_attempts
            );
            if attempt < self.settings.pod_retry_attempts {
                tokio::time::sleep(self.settings.pod_retry_delay).await;
            }
        }

        Err(AppError::PodNotFound(descriptor.job_name.clone()))
    }

    async fn wait_for_pod_ready(
        &self,
        ctx: &mut RunContext,
        namespace: &str,
        pod_name: &str,
    ) -> Result<(), AppError> {
        loop {
            let state = self.cluster.pod_state(namespace, pod_name).await?;

            match state.phase {
                PodPhase::Failed => {
                    self.publish(ctx, &format!("Pod {pod_name} failed")).await;
                    return Err(AppError::PodFailed(pod_name.to_string()));
                }
                // A short-lived container can finish before we ever observe
                // it ready; its logs are still readable.
                PodPhase::Succeeded => return Ok(()),
                _ if state.is_ready() => return Ok(()),
                _ => {
                    self.publish(ctx, &format!("Waiting for pod {pod_name} to be ready..."))
                        .await;
                    tokio::time::sleep(self.settings.pod_poll_interval).await;
                }
            }
        }
    }

    async fn stream_logs(
        &self,
        ctx: &mut RunContext,
        descriptor: &JobDescriptor,
        pod_name: &str,
    ) -> Result<(), AppError> {
        let mut stream = self
            .cluster
            .tail_container_logs(
                &descriptor.namespace,
                pod_name,
                &descriptor.container_name,
                self.settings.log_tail_lines,
            )
            .await
            .map_err(|e| AppError::StreamError(e.to_string()))?;

        while let Some(event) = stream.next().await {
            let bytes = event.map_err(|e| AppError::StreamError(e.to_string()))?;
            let text = String::from_utf8_lossy(&bytes);
            for chunk in chunk_logs(&text, self.settings.log_chunk_size) {
                self.publish(ctx, &chunk).await;
            }
        }

        Ok(())
    }

    async fn finish_succeeded(&self, ctx: &mut RunContext) -> Result<(), AppError> {
        self.transition(ctx, DeploymentStatus::Success).await?;

        // Terminal side effects run in a fixed order, each awaited, each
        // failure logged on its own. Logs are persisted on SUCCESS only.
        if let Err(e) = self
            .backend
            .persist_logs(&ctx.deployment_id, &ctx.log_buffer)
            .await
        {
            error!("Failed to persist logs for {}: {}", ctx.deployment_id, e);
        }

        if let Err(e) = self
            .notifier
            .notify(&ctx.email, DeploymentStatus::Success)
            .await
        {
            warn!("Notification failed for {}: {}", ctx.deployment_id, e);
        }

        Ok(())
    }

    async fn finish_failed(&self, ctx: &mut RunContext, cause: &AppError) {
        self.publish(ctx, &format!("Deployment failed: {cause}")).await;

        if ctx.status.is_terminal() {
            warn!(
                "Deployment {} already terminal ({}), keeping status",
                ctx.deployment_id, ctx.status
            );
        } else if let Err(e) = self.transition(ctx, DeploymentStatus::Failed).await {
            error!(
                "Failed to persist FAILED status for {}: {}",
                ctx.deployment_id, e
            );
        }

        if let Err(e) = self
            .notifier
            .notify(&ctx.email, DeploymentStatus::Failed)
            .await
        {
            warn!("Notification failed for {}: {}", ctx.deployment_id, e);
        }
    }

    /// One step of the status machine. Persists first (authoritative), then
    /// updates the in-run state and drops the marker onto the log channel so
    /// viewers see the outcome inline. Backward or out-of-terminal moves are
    /// refused.
    async fn transition(
        &self,
        ctx: &mut RunContext,
        next: DeploymentStatus,
    ) -> Result<(), AppError> {
        if !ctx.status.can_transition_to(next) {
            warn!(
                "Refusing status transition {} -> {} for {}",
                ctx.status, next, ctx.deployment_id
            );
            return Ok(());
        }

        self.backend
            .update_status(&ctx.deployment_id, next)
            .await
            .map_err(|e| {
                error!("Status update {} -> {} failed: {}", ctx.status, next, e);
                e
            })?;

        ctx.status = next;
        self.publish(ctx, &next.to_string()).await;
        Ok(())
    }

    /// Best-effort channel publish; every line also lands in the session
    /// buffer so the persisted log matches what viewers saw.
    async fn publish(&self, ctx: &mut RunContext, line: &str) {
        if let Err(e) = self.publisher.publish(&ctx.channel, line).await {
            warn!("Failed to publish to {}: {}", ctx.channel, e);
        }
        ctx.log_buffer.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::MockDeploymentBackend;
    use crate::services::cluster::{MockClusterApi, PodState};
    use crate::services::notifier::MockNotifier;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Order-preserving publisher double; mockall can't easily assert
    /// sequences across channels.
    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl LogPublisher for RecordingPublisher {
        async fn publish(&self, channel: &str, payload: &str) -> Result<(), AppError> {
            self.events
                .lock()
                .unwrap()
                .push((channel.to_string(), payload.to_string()));
            Ok(())
        }
    }

    impl RecordingPublisher {
        fn on_channel(&self, channel: &str) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|(c, _)| c == channel)
                .map(|(_, p)| p.clone())
                .collect()
        }
    }

    fn settings() -> OrchestratorSettings {
        OrchestratorSettings {
            job: JobSettings {
                image: "dockyard/builder:latest".to_string(),
                namespace: "default".to_string(),
                backoff_limit: 4,
                ttl_seconds_after_finished: None,
                s3_region: None,
                s3_access_key_id: None,
                s3_secret_key: None,
                s3_bucket_name: None,
            },
            pod_retry_attempts: 3,
            pod_retry_delay: Duration::from_millis(1),
            pod_poll_interval: Duration::from_millis(1),
            log_chunk_size: 1024,
            log_tail_lines: 10,
            run_timeout: Duration::from_secs(5),
        }
    }

    fn params(deployment_id: &str) -> BuildJobParams {
        BuildJobParams {
            git_url: "https://github.com/acme/site.git".to_string(),
            project_id: "p9".to_string(),
            source_directory: ".".to_string(),
            branch: Some("main".to_string()),
            access_token: None,
            build_command: None,
            install_command: None,
            commit_sha: None,
            deployment_id: deployment_id.to_string(),
            email: "user@acme.dev".to_string(),
            environment_variables: vec![],
            name: None,
        }
    }

    type StatusLog = Arc<Mutex<Vec<DeploymentStatus>>>;

    fn recording_backend(statuses: StatusLog) -> MockDeploymentBackend {
        let mut backend = MockDeploymentBackend::new();
        backend.expect_update_status().returning(move |_, status| {
            statuses.lock().unwrap().push(status);
            Ok(())
        });
        backend
    }

    fn single_chunk_stream(payload: &'static str) -> crate::services::cluster::LogStream {
        futures::stream::iter(vec![Ok(Bytes::from(payload))]).boxed()
    }

    #[tokio::test]
    async fn happy_path_publishes_in_order_and_persists_success() {
        let mut cluster = MockClusterApi::new();
        cluster.expect_create_job().times(1).returning(|_| Ok(()));
        cluster
            .expect_find_job_pod()
            .times(1)
            .returning(|_, _| Ok(Some("pod-1".to_string())));

        // Two not-ready polls, then ready, then the post-stream re-check.
        let polls = AtomicUsize::new(0);
        cluster.expect_pod_state().returning(move |_, _| {
            let n = polls.fetch_add(1, Ordering::SeqCst);
            Ok(match n {
                0 | 1 => PodState {
                    phase: PodPhase::Pending,
                    containers_ready: false,
                },
                2 => PodState {
                    phase: PodPhase::Running,
                    containers_ready: true,
                },
                _ => PodState {
                    phase: PodPhase::Succeeded,
                    containers_ready: false,
                },
            })
        });
        cluster
            .expect_tail_container_logs()
            .times(1)
            .returning(|_, _, _, _| Ok(single_chunk_stream("build ok\n")));

        let statuses: StatusLog = Arc::default();
        let backend_statuses = statuses.clone();
        let mut backend = recording_backend(backend_statuses);
        backend
            .expect_persist_logs()
            .times(1)
            .withf(|id, logs| {
                id == "dep-1"
                    && logs.iter().any(|l| l == "build ok\n")
                    && logs.last().map(String::as_str) == Some("SUCCESS")
            })
            .returning(|_, _| Ok(()));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .withf(|email, status| email == "user@acme.dev" && *status == DeploymentStatus::Success)
            .returning(|_, _| Ok(()));

        let publisher = Arc::new(RecordingPublisher::default());
        let orchestrator = Orchestrator::new(
            Arc::new(cluster),
            publisher.clone(),
            Arc::new(backend),
            Arc::new(notifier),
            settings(),
        );

        orchestrator.run_deployment(params("dep-1")).await;

        let events = publisher.on_channel("logs:dep-1");
        assert!(events[0].starts_with("Job ") && events[0].ends_with("created successfully"));
        assert_eq!(events[1], "RUNNING");
        assert_eq!(events[2], "Waiting for pod pod-1 to be ready...");
        assert_eq!(events[3], "Waiting for pod pod-1 to be ready...");
        assert_eq!(events[4], "build ok\n");
        assert_eq!(events[5], "SUCCESS");
        assert_eq!(events.len(), 6);

        assert_eq!(
            *statuses.lock().unwrap(),
            vec![DeploymentStatus::Running, DeploymentStatus::Success]
        );
    }

    #[tokio::test]
    async fn submission_failure_skips_pod_resolution() {
        let mut cluster = MockClusterApi::new();
        cluster
            .expect_create_job()
            .times(1)
            .returning(|_| Err(AppError::SubmissionError("orchestrator unreachable".into())));
        cluster.expect_find_job_pod().times(0);

        let statuses: StatusLog = Arc::default();
        let backend = recording_backend(statuses.clone());

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .withf(|_, status| *status == DeploymentStatus::Failed)
            .returning(|_, _| Ok(()));

        let publisher = Arc::new(RecordingPublisher::default());
        let orchestrator = Orchestrator::new(
            Arc::new(cluster),
            publisher.clone(),
            Arc::new(backend),
            Arc::new(notifier),
            settings(),
        );

        orchestrator.run_deployment(params("dep-2")).await;

        assert_eq!(*statuses.lock().unwrap(), vec![DeploymentStatus::Failed]);
        let events = publisher.on_channel("logs:dep-2");
        assert!(events.iter().any(|e| e.starts_with("Deployment failed:")));
        assert!(!events.iter().any(|e| e == "SUCCESS"));
    }

    #[tokio::test]
    async fn resolver_exhaustion_fails_and_notifies_once() {
        let mut cluster = MockClusterApi::new();
        cluster.expect_create_job().returning(|_| Ok(()));
        cluster
            .expect_find_job_pod()
            .times(3)
            .returning(|_, _| Ok(None));
        cluster.expect_pod_state().times(0);

        let statuses: StatusLog = Arc::default();
        let backend = recording_backend(statuses.clone());

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .withf(|_, status| *status == DeploymentStatus::Failed)
            .returning(|_, _| Ok(()));

        let orchestrator = Orchestrator::new(
            Arc::new(cluster),
            Arc::new(RecordingPublisher::default()),
            Arc::new(backend),
            Arc::new(notifier),
            settings(),
        );

        orchestrator.run_deployment(params("dep-3")).await;

        assert_eq!(
            *statuses.lock().unwrap(),
            vec![DeploymentStatus::Running, DeploymentStatus::Failed]
        );
    }

    #[tokio::test]
    async fn failed_pod_phase_never_publishes_a_success_marker() {
        let mut cluster = MockClusterApi::new();
        cluster.expect_create_job().returning(|_| Ok(()));
        cluster
            .expect_find_job_pod()
            .returning(|_, _| Ok(Some("pod-9".to_string())));
        cluster.expect_pod_state().returning(|_, _| {
            Ok(PodState {
                phase: PodPhase::Failed,
                containers_ready: false,
            })
        });
        cluster.expect_tail_container_logs().times(0);

        let statuses: StatusLog = Arc::default();
        let mut backend = recording_backend(statuses.clone());
        backend.expect_persist_logs().times(0);

        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).returning(|_, _| Ok(()));

        let publisher = Arc::new(RecordingPublisher::default());
        let orchestrator = Orchestrator::new(
            Arc::new(cluster),
            publisher.clone(),
            Arc::new(backend),
            Arc::new(notifier),
            settings(),
        );

        orchestrator.run_deployment(params("dep-4")).await;

        let events = publisher.on_channel("logs:dep-4");
        assert!(events.iter().any(|e| e == "Pod pod-9 failed"));
        assert!(!events.iter().any(|e| e == "SUCCESS"));
        assert_eq!(
            statuses.lock().unwrap().last(),
            Some(&DeploymentStatus::Failed)
        );
    }

    #[tokio::test]
    async fn stream_error_forces_failed() {
        let mut cluster = MockClusterApi::new();
        cluster.expect_create_job().returning(|_| Ok(()));
        cluster
            .expect_find_job_pod()
            .returning(|_, _| Ok(Some("pod-5".to_string())));
        cluster.expect_pod_state().returning(|_, _| {
            Ok(PodState {
                phase: PodPhase::Running,
                containers_ready: true,
            })
        });
        cluster.expect_tail_container_logs().returning(|_, _, _, _| {
            Ok(futures::stream::iter(vec![
                Ok(Bytes::from("partial output\n")),
                Err(std::io::Error::other("connection reset")),
            ])
            .boxed())
        });

        let statuses: StatusLog = Arc::default();
        let backend = recording_backend(statuses.clone());

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .withf(|_, status| *status == DeploymentStatus::Failed)
            .returning(|_, _| Ok(()));

        let publisher = Arc::new(RecordingPublisher::default());
        let orchestrator = Orchestrator::new(
            Arc::new(cluster),
            publisher.clone(),
            Arc::new(backend),
            Arc::new(notifier),
            settings(),
        );

        orchestrator.run_deployment(params("dep-5")).await;

        let events = publisher.on_channel("logs:dep-5");
        assert!(events.iter().any(|e| e == "partial output\n"));
        assert_eq!(events.last().map(String::as_str), Some("FAILED"));
        assert_eq!(
            statuses.lock().unwrap().last(),
            Some(&DeploymentStatus::Failed)
        );
    }

    #[tokio::test]
    async fn notification_failure_is_swallowed() {
        let mut cluster = MockClusterApi::new();
        cluster
            .expect_create_job()
            .returning(|_| Err(AppError::SubmissionError("quota".into())));

        let statuses: StatusLog = Arc::default();
        let backend = recording_backend(statuses.clone());

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .returning(|_, _| Err(AppError::NotificationError("smtp down".into())));

        let orchestrator = Orchestrator::new(
            Arc::new(cluster),
            Arc::new(RecordingPublisher::default()),
            Arc::new(backend),
            Arc::new(notifier),
            settings(),
        );

        // Must not panic or retry; FAILED stays recorded.
        orchestrator.run_deployment(params("dep-6")).await;
        assert_eq!(*statuses.lock().unwrap(), vec![DeploymentStatus::Failed]);
    }

    #[tokio::test]
    async fn stuck_pod_hits_the_run_deadline() {
        let mut cluster = MockClusterApi::new();
        cluster.expect_create_job().returning(|_| Ok(()));
        cluster
            .expect_find_job_pod()
            .returning(|_, _| Ok(Some("pod-7".to_string())));
        cluster.expect_pod_state().returning(|_, _| {
            Ok(PodState {
                phase: PodPhase::Pending,
                containers_ready: false,
            })
        });

        let statuses: StatusLog = Arc::default();
        let backend = recording_backend(statuses.clone());

        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).returning(|_, _| Ok(()));

        let mut fast = settings();
        fast.run_timeout = Duration::from_millis(20);

        let orchestrator = Orchestrator::new(
            Arc::new(cluster),
            Arc::new(RecordingPublisher::default()),
            Arc::new(backend),
            Arc::new(notifier),
            fast,
        );

        orchestrator.run_deployment(params("dep-7")).await;

        assert_eq!(
            statuses.lock().unwrap().last(),
            Some(&DeploymentStatus::Failed)
        );
    }

    #[tokio::test]
    async fn concurrent_runs_never_cross_publish() {
        let publisher = Arc::new(RecordingPublisher::default());

        let make_orchestrator = |pod: &'static str, output: &'static str| {
            let mut cluster = MockClusterApi::new();
            cluster.expect_create_job().returning(|_| Ok(()));
            cluster
                .expect_find_job_pod()
                .returning(move |_, _| Ok(Some(pod.to_string())));
            let polls = AtomicUsize::new(0);
            cluster.expect_pod_state().returning(move |_, _| {
                let n = polls.fetch_add(1, Ordering::SeqCst);
                Ok(if n == 0 {
                    PodState {
                        phase: PodPhase::Running,
                        containers_ready: true,
                    }
                } else {
                    PodState {
                        phase: PodPhase::Succeeded,
                        containers_ready: false,
                    }
                })
            });
            cluster
                .expect_tail_container_logs()
                .returning(move |_, _, _, _| Ok(single_chunk_stream(output)));

            let mut backend = MockDeploymentBackend::new();
            backend.expect_update_status().returning(|_, _| Ok(()));
            backend.expect_persist_logs().returning(|_, _| Ok(()));
            let mut notifier = MockNotifier::new();
            notifier.expect_notify().returning(|_, _| Ok(()));

            Orchestrator::new(
                Arc::new(cluster),
                publisher.clone(),
                Arc::new(backend),
                Arc::new(notifier),
                settings(),
            )
        };

        let a = make_orchestrator("pod-a", "output-a\n");
        let b = make_orchestrator("pod-b", "output-b\n");

        tokio::join!(
            a.run_deployment(params("dep-a")),
            b.run_deployment(params("dep-b")),
        );

        let events_a = publisher.on_channel("logs:dep-a");
        let events_b = publisher.on_channel("logs:dep-b");
        assert!(events_a.iter().any(|e| e == "output-a\n"));
        assert!(!events_a.iter().any(|e| e == "output-b\n"));
        assert!(events_b.iter().any(|e| e == "output-b\n"));
        assert!(!events_b.iter().any(|e| e == "output-a\n"));
        assert_eq!(events_a.last().map(String::as_str), Some("SUCCESS"));
        assert_eq!(events_b.last().map(String::as_str), Some("SUCCESS"));
    }

    #[tokio::test]
    async fn terminal_status_is_never_left() {
        let mut backend = MockDeploymentBackend::new();
        backend.expect_update_status().times(0);

        let orchestrator = Orchestrator::new(
            Arc::new(MockClusterApi::new()),
            Arc::new(RecordingPublisher::default()),
            Arc::new(backend),
            Arc::new(MockNotifier::new()),
            settings(),
        );

        let mut ctx = RunContext::new(&params("dep-8"));
        ctx.status = DeploymentStatus::Success;

        orchestrator
            .transition(&mut ctx, DeploymentStatus::Failed)
            .await
            .unwrap();
        assert_eq!(ctx.status, DeploymentStatus::Success);
    }
}

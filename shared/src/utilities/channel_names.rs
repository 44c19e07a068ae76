pub struct ChannelNames;

impl ChannelNames {
    pub fn deployment_logs(deployment_id: &str) -> String {
        format!("logs:{deployment_id}")
    }

    pub fn logs_pattern() -> &'static str {
        "logs:*"
    }

    /// Reverse mapping used by the gateway: pulls the deployment id back out
    /// of a channel name received from PSUBSCRIBE.
    pub fn deployment_id(channel: &str) -> Option<&str> {
        channel
            .strip_prefix("logs:")
            .filter(|id| !id.is_empty())
    }
}

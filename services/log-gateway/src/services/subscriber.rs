use futures::StreamExt;
use shared::services::redis::Redis;
use shared::utilities::channel_names::ChannelNames;
use shared::utilities::errors::AppError;
use tracing::{info, warn};

use crate::services::rooms::RoomRegistry;

/// Bridge from the broker to in-process rooms. One pattern subscription
/// covers every deployment channel, so new deployments need no coordination
/// with the gateway.
pub async fn run_log_subscriber(redis: Redis, rooms: RoomRegistry) -> Result<(), AppError> {
    let mut pubsub = redis.pubsub().await?;
    pubsub.psubscribe(ChannelNames::logs_pattern()).await?;
    info!("📡 Subscribed to {}", ChannelNames::logs_pattern());

    let mut messages = pubsub.on_message();
    while let Some(message) = messages.next().await {
        let channel = message.get_channel_name().to_string();

        let Some(deployment_id) = ChannelNames::deployment_id(&channel) else {
            warn!("Ignoring message on unexpected channel {}", channel);
            continue;
        };

        match message.get_payload::<String>() {
            Ok(payload) => rooms.publish(deployment_id, &payload),
            Err(e) => warn!("Undecodable payload on {}: {}", channel, e),
        }
    }

    Ok(())
}

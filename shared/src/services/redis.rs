use redis::{Client, aio::MultiplexedConnection, aio::PubSub};
use tracing::info;

use crate::utilities::{config::Config, errors::AppError};

#[derive(Clone)]
pub struct Redis {
    pub client: Client,
    pub connection: MultiplexedConnection,
}

impl Redis {
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        let mut redis_url = config.redis_url.clone();

        let protocol = "?protocol=resp3";
        if !redis_url.contains(protocol) {
            redis_url.push_str(protocol);
        }

        let client = Client::open(redis_url)?;

        let connection_info = client.get_connection_info();
        info!("✅ connection info: {connection_info:?}");

        let connection = client.get_multiplexed_tokio_connection().await?;

        Ok(Self { client, connection })
    }

    pub async fn pubsub(&self) -> Result<PubSub, AppError> {
        Ok(self.client.get_async_pubsub().await?)
    }
}

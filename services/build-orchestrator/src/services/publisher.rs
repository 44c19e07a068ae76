use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use shared::utilities::errors::AppError;

/// Fire-and-forget publication onto a deployment's log channel. Each call is
/// atomic at chunk granularity; the broker keeps no history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogPublisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct RedisPublisher {
    pub connection: MultiplexedConnection,
}

#[async_trait]
impl LogPublisher for RedisPublisher {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), AppError> {
        let mut connection = self.connection.clone();
        // Receiver count is irrelevant here; late subscribers miss chunks by design.
        let _: i64 = connection.publish(channel, payload).await?;
        Ok(())
    }
}

/// Split a payload into channel-sized pieces without breaking UTF-8.
/// Concatenating the result reproduces the input exactly; no piece exceeds
/// `chunk_size` bytes.
pub fn chunk_logs(payload: &str, chunk_size: usize) -> Vec<String> {
    assert!(chunk_size > 0, "chunk size must be positive");

    let mut chunks = Vec::new();
    let mut current = String::new();

    for ch in payload.chars() {
        if current.len() + ch.len_utf8() > chunk_size && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

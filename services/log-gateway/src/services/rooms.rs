use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

const ROOM_CAPACITY: usize = 256;

/// In-process fan-out: one broadcast channel per deployment, created when the
/// first viewer joins, dropped once the last viewer is gone. Chunks for a
/// room nobody watches are discarded; the broker keeps no history either.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, deployment_id: &str) -> broadcast::Receiver<String> {
        let mut rooms = self.rooms.lock().unwrap();
        rooms
            .entry(deployment_id.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Deliver one chunk to every current viewer of a deployment, in arrival
    /// order.
    pub fn publish(&self, deployment_id: &str, payload: &str) {
        let mut rooms = self.rooms.lock().unwrap();
        if let Some(sender) = rooms.get(deployment_id)
            && sender.send(payload.to_string()).is_err()
        {
            // Last viewer left; the room goes with it.
            rooms.remove(deployment_id);
        }
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.lock().unwrap().len()
    }
}

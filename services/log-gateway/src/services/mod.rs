pub mod rooms;
pub mod subscriber;

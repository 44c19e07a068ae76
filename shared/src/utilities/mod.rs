pub mod channel_names;
pub mod config;
pub mod errors;

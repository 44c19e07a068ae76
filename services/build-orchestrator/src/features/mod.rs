pub mod handlers;
pub mod schemas;

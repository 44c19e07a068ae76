pub mod backend;
pub mod cluster;
pub mod job_spec;
pub mod notifier;
pub mod publisher;
pub mod run;

pub mod client;
pub mod types;

pub use client::{JobApi, JobClient};
pub use types::{CreateJobRequest, CreateJobResponse, JobStatus, PollMode, StatusResponse, UnknownStatus};

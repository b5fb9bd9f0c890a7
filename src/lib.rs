//! Client for asynchronous job-processing HTTP APIs.
//!
//! Submit a job with [`JobApi::create_job`], check it with
//! [`JobApi::get_status`], or block until it finishes with
//! [`JobClient::await_completion`]. Transient HTTP failures are retried inside
//! the client according to its [`RetryPolicy`]; everything that still fails is
//! reported as a [`JobClientError`].

pub mod api;
pub mod config;
pub mod error;
pub mod poller;
pub mod retry;

pub use api::{CreateJobResponse, JobApi, JobClient, JobStatus, PollMode};
pub use config::ClientConfig;
pub use error::{ErrorKind, JobClientError};
pub use poller::{AwaitOptions, await_completion, await_completion_with_cancel};
pub use retry::RetryPolicy;

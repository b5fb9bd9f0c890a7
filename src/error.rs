//! Error taxonomy surfaced by the job client.
//!
//! Every failure produced by [`JobClient`](crate::api::JobClient) or the
//! poller is exactly one [`JobClientError`] variant. The free functions at the
//! bottom of this module classify raw `reqwest` failures and non-success HTTP
//! responses into that taxonomy; nothing from the transport escapes unmapped.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use thiserror::Error;

/// Discriminator for [`JobClientError`], handy for exhaustive matching
/// without destructuring payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    RateLimited,
    Server,
    NotFound,
    Client,
    Timeout,
    Protocol,
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Network => "NetworkError",
            ErrorKind::RateLimited => "RateLimitError",
            ErrorKind::Server => "ServerError",
            ErrorKind::NotFound => "ResourceNotFound",
            ErrorKind::Client => "ClientError",
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::Protocol => "ProtocolError",
            ErrorKind::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// Errors returned by the job client.
#[derive(Debug, Error)]
pub enum JobClientError {
    /// The request never produced a response (DNS, refused connection,
    /// reset, request timeout).
    #[error("{context}: no response received ({message})")]
    Network {
        context: &'static str,
        message: String,
    },

    /// HTTP 429. `retry_after_secs` is the parsed `retry-after` header, if any.
    #[error("{context}: rate limit exceeded")]
    RateLimited {
        context: &'static str,
        retry_after_secs: Option<u64>,
    },

    /// HTTP 5xx.
    #[error("{context}: server error (status {status})")]
    Server { context: &'static str, status: u16 },

    /// HTTP 404.
    #[error("{context}: resource not found (status {status})")]
    NotFound { context: &'static str, status: u16 },

    /// Any other failure with or without a status code: other 4xx responses,
    /// undecodable bodies, invalid arguments.
    #[error("{context}: {message}")]
    Client {
        context: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// The poll budget ran out before a terminal status was observed.
    #[error("Timeout reached after {timeout_ms}ms waiting for completion")]
    Timeout { timeout_ms: u64 },

    /// The server reported a status string outside `pending|completed|error`.
    #[error("Unknown status '{status}' for job {job_id}")]
    Protocol { job_id: String, status: String },

    /// The caller's cancellation token fired while polling.
    #[error("Polling cancelled for job {job_id}")]
    Cancelled { job_id: String },
}

impl JobClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JobClientError::Network { .. } => ErrorKind::Network,
            JobClientError::RateLimited { .. } => ErrorKind::RateLimited,
            JobClientError::Server { .. } => ErrorKind::Server,
            JobClientError::NotFound { .. } => ErrorKind::NotFound,
            JobClientError::Client { .. } => ErrorKind::Client,
            JobClientError::Timeout { .. } => ErrorKind::Timeout,
            JobClientError::Protocol { .. } => ErrorKind::Protocol,
            JobClientError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// HTTP status code attached to the failure, when one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            JobClientError::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            JobClientError::Server { status, .. } | JobClientError::NotFound { status, .. } => {
                Some(*status)
            }
            JobClientError::Client { status, .. } => *status,
            _ => None,
        }
    }

    /// Server-requested wait before the next attempt (429 only).
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            JobClientError::RateLimited {
                retry_after_secs: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    pub(crate) fn invalid_argument(context: &'static str, message: impl Into<String>) -> Self {
        JobClientError::Client {
            context,
            status: None,
            message: message.into(),
        }
    }
}

/// Map a non-success HTTP status to its variant.
pub(crate) fn classify_status(
    context: &'static str,
    status: StatusCode,
    retry_after_secs: Option<u64>,
    body: String,
) -> JobClientError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => JobClientError::RateLimited {
            context,
            retry_after_secs,
        },
        StatusCode::NOT_FOUND => JobClientError::NotFound {
            context,
            status: status.as_u16(),
        },
        s if s.is_server_error() => JobClientError::Server {
            context,
            status: s.as_u16(),
        },
        s => {
            let message = if body.trim().is_empty() {
                format!("request failed with status {}", s.as_u16())
            } else {
                format!("request failed with status {}: {}", s.as_u16(), body.trim())
            };
            JobClientError::Client {
                context,
                status: Some(s.as_u16()),
                message,
            }
        }
    }
}

/// Consume a non-success response and classify it.
pub(crate) async fn classify_response(context: &'static str, response: Response) -> JobClientError {
    let status = response.status();
    let retry_after = parse_retry_after(response.headers());
    let body = response.text().await.unwrap_or_default();
    classify_status(context, status, retry_after, body)
}

/// Classify a `reqwest` failure raised before (or while) reading a response.
pub(crate) fn classify_transport(context: &'static str, err: reqwest::Error) -> JobClientError {
    if err.is_decode() || err.is_builder() {
        return JobClientError::Client {
            context,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        };
    }
    match err.status() {
        Some(status) => classify_status(context, status, None, String::new()),
        None => JobClientError::Network {
            context,
            message: err.to_string(),
        },
    }
}

/// `retry-after` in delta-seconds form. HTTP-date values are ignored.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    const CTX: &str = "Failed to fetch status";

    #[test]
    fn classify_429_as_rate_limited() {
        let err = classify_status(CTX, StatusCode::TOO_MANY_REQUESTS, Some(2), String::new());
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
        assert_eq!(err.status_code(), Some(429));
    }

    #[test]
    fn classify_5xx_as_server_error() {
        let err = classify_status(CTX, StatusCode::INTERNAL_SERVER_ERROR, None, String::new());
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.status_code(), Some(500));

        let err = classify_status(CTX, StatusCode::SERVICE_UNAVAILABLE, None, String::new());
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.status_code(), Some(503));
    }

    #[test]
    fn classify_404_as_not_found() {
        let err = classify_status(CTX, StatusCode::NOT_FOUND, None, "missing".into());
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn classify_other_4xx_as_client_error_with_body() {
        let err = classify_status(
            CTX,
            StatusCode::UNPROCESSABLE_ENTITY,
            None,
            "bad mode\n".into(),
        );
        assert_eq!(err.kind(), ErrorKind::Client);
        assert_eq!(err.status_code(), Some(422));
        assert_eq!(
            err.to_string(),
            "Failed to fetch status: request failed with status 422: bad mode"
        );
    }

    #[test]
    fn retry_after_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("2"));
        assert_eq!(parse_retry_after(&headers), Some(2));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn display_messages() {
        let err = JobClientError::Timeout { timeout_ms: 5000 };
        assert_eq!(
            err.to_string(),
            "Timeout reached after 5000ms waiting for completion"
        );

        let err = JobClientError::Protocol {
            job_id: "abc".into(),
            status: "unknown".into(),
        };
        assert_eq!(err.to_string(), "Unknown status 'unknown' for job abc");

        let err = JobClientError::RateLimited {
            context: CTX,
            retry_after_secs: None,
        };
        assert_eq!(err.to_string(), "Failed to fetch status: rate limit exceeded");
    }

    #[test]
    fn non_http_variants_have_no_status() {
        assert_eq!(JobClientError::Timeout { timeout_ms: 1 }.status_code(), None);
        let err = JobClientError::Network {
            context: CTX,
            message: "connection refused".into(),
        };
        assert_eq!(err.status_code(), None);
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::RateLimited.to_string(), "RateLimitError");
        assert_eq!(ErrorKind::NotFound.to_string(), "ResourceNotFound");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<JobClientError>();
    }
}

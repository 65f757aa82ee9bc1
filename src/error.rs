//! Error taxonomy for the daemon.
//!
//! Remote calls return [`ApiError`], which the supervisor classifies with
//! [`ApiError::fault_kind`] instead of matching on error sources. Push
//! notification failures are kept separate in [`NotifyError`] because they
//! are never escalated.

use thiserror::Error;

// ---

/// How the supervisor reacts to a fault that ended a connection epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Network or transport trouble: tear down, short backoff, reconnect.
    Transient,
    /// Backend rate limit exhausted: tear down, long backoff, reconnect.
    Quota,
    /// Anything else: alert the admin channel and exit non-zero.
    Fatal,
}

/// Failure of a call to the vehicle telemetry/command backend.
#[derive(Debug, Error)]
pub enum ApiError {
    // ---
    #[error("connection error: {0}")]
    Connection(String),

    #[error("response error: HTTP {status}: {message}")]
    Response { status: u16, message: String },

    #[error("payload error: {0}")]
    Payload(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("rate limit exhausted: {0}")]
    QuotaExceeded(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

impl ApiError {
    pub fn fault_kind(&self) -> FaultKind {
        // ---
        match self {
            ApiError::Connection(_)
            | ApiError::Response { .. }
            | ApiError::Payload(_)
            | ApiError::Timeout(_) => FaultKind::Transient,
            ApiError::QuotaExceeded(_) => FaultKind::Quota,
            ApiError::Auth(_) | ApiError::Other(_) => FaultKind::Fatal,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        // ---
        if e.is_timeout() {
            ApiError::Timeout(e.to_string())
        } else if e.is_decode() {
            ApiError::Payload(e.to_string())
        } else if let Some(status) = e.status() {
            ApiError::Response {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else if e.is_connect() || e.is_request() || e.is_body() {
            ApiError::Connection(e.to_string())
        } else {
            ApiError::Other(e.to_string())
        }
    }
}

/// Failure to deliver a push notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notification rejected with HTTP {0}")]
    Status(u16),
}

/// Why a Running epoch ended. Reaching the join point always means a fault,
/// since healthy monitors never return.
#[derive(Debug, Error)]
pub enum EpochFault {
    // ---
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("command listener failed: {0}")]
    Listener(#[from] std::io::Error),

    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("task '{0}' exited without error")]
    Exited(String),
}

impl EpochFault {
    pub fn fault_kind(&self) -> FaultKind {
        // ---
        match self {
            EpochFault::Api(e) => e.fault_kind(),
            _ => FaultKind::Fatal,
        }
    }
}

/// Terminal outcomes of the supervisor. Both end the process non-zero.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("configured vehicles missing from the account: {}", .0.join(", "))]
    UnknownVehicles(Vec<String>),

    #[error("fatal fault: {0}")]
    Fatal(String),
}

//! Two-armed outcome for every fallible network operation.
//!
//! All failure paths in the crate end up as an [`ErrorInfo`]: the gateway
//! classifies transport and HTTP failures into one, the query cache hands the
//! same value to every waiter of a fetch, and the shell renders its `message`.
//! [`settle`] is the single boundary where a future's error (or panic) is
//! folded into that shape.

use std::fmt;
use std::future::Future;

use thiserror::Error;

/// Where a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// The request never reached the server or no response came back.
    Network,
    /// A response arrived with a non-success status (or an undecodable body).
    HttpStatus(u16),
    /// The client itself misbehaved; nothing was wrong on the wire.
    Internal,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorOrigin::Network => write!(f, "network"),
            ErrorOrigin::HttpStatus(status) => write!(f, "http {}", status),
            ErrorOrigin::Internal => write!(f, "internal"),
        }
    }
}

/// A single user-facing failure message plus its origin.
///
/// Carries no stack trace and no retry metadata: nothing in the crate retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ErrorInfo {
    pub message: String,
    pub origin: ErrorOrigin,
}

impl ErrorInfo {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            origin: ErrorOrigin::Network,
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            origin: ErrorOrigin::HttpStatus(status),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            origin: ErrorOrigin::Internal,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self.origin, ErrorOrigin::Network)
    }

    /// HTTP status code, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self.origin {
            ErrorOrigin::HttpStatus(status) => Some(status),
            ErrorOrigin::Network | ErrorOrigin::Internal => None,
        }
    }
}

/// `Ok(value)` or `Err(error)`: the value/error pair of every network call.
pub type Outcome<T> = Result<T, ErrorInfo>;

/// Run a fallible future to completion and fold its failure into [`ErrorInfo`].
///
/// The future runs on its own task, so it always finishes even if the caller
/// stops waiting, and a panic inside it surfaces as an error value instead of
/// unwinding into the caller.
pub async fn settle<F, T, E>(future: F) -> Outcome<T>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Into<ErrorInfo> + Send + 'static,
{
    match tokio::spawn(future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.into()),
        Err(join_err) => {
            tracing::warn!(error = %join_err, "Operation aborted");
            Err(ErrorInfo::network(format!("Operation aborted: {}", join_err)))
        }
    }
}

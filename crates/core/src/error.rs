use thiserror::Error;

/// Who is at fault for a failed lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The request itself was wrong (maps to a 4xx response).
    Caller,
    /// Something failed on the server side (maps to a 5xx response).
    Internal,
}

/// Errors raised by action lifecycle hooks.
///
/// Hooks classify their own failures by picking a variant. Anything that is
/// not explicitly a caller fault is internal; internal detail is logged but
/// never rendered to the caller.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The caller sent a request the action cannot satisfy.
    #[error("{message}")]
    Caller {
        /// HTTP status in the 4xx range.
        status: u16,
        message: String,
    },

    /// An unexpected failure inside the action or a service it called.
    #[error("internal action failure: {0}")]
    Internal(String),
}

impl ActionError {
    /// A caller fault with an explicit status. Statuses outside 400..=499
    /// are coerced to 400.
    pub fn caller(status: u16, message: impl Into<String>) -> Self {
        let status = if (400..=499).contains(&status) {
            status
        } else {
            400
        };
        Self::Caller {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::caller(400, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::caller(404, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::caller(409, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    #[must_use]
    pub fn fault(&self) -> Fault {
        match self {
            Self::Caller { .. } => Fault::Caller,
            Self::Internal(_) => Fault::Internal,
        }
    }

    /// HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Caller { status, .. } => *status,
            Self::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("serialization error: {e}"))
    }
}

use thiserror::Error;

/// Failure taxonomy surfaced to the presentation layer. Every error is
/// returned to the immediate caller; nothing is swallowed or retried.
#[derive(Debug, Error)]
pub(crate) enum ApiError {
    /// Caller mistake: missing required field, empty filter set, or a value
    /// that should have been numeric.
    #[error("{0}")]
    Validation(String),

    /// A classifier was unreachable, answered non-2xx, or sent a body we
    /// could not parse. Fails the whole create operation.
    #[error("{service} lookup failed: {reason}")]
    Upstream {
        service: &'static str,
        reason: String,
    },

    /// Record-store failure, including not-found on update and delete.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl ApiError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn upstream(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            reason: reason.into(),
        }
    }

    /// HTTP status the presentation layer answers with.
    pub(crate) fn status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Upstream { .. } => 502,
            Self::Store(_) => 500,
        }
    }
}

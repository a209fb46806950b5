/// The four error kinds the HTTP surface maps to status codes.
///
/// `Internal` wraps an [`anyhow::Error`] so lower-level I/O failures keep
/// their context chain; the other three carry a short, single-sentence
/// message suitable for direct display to the caller.
#[derive(thiserror::Error, Debug)]
pub enum ShellSvError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ShellSvError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ShellSvError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ShellSvError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ShellSvError::Conflict(msg.into())
    }

    /// Short kind name used for logging; the HTTP layer owns the status-code mapping.
    pub fn kind(&self) -> &'static str {
        match self {
            ShellSvError::BadRequest(_) => "BAD_REQUEST",
            ShellSvError::NotFound(_) => "NOT_FOUND",
            ShellSvError::Conflict(_) => "CONFLICT",
            ShellSvError::Internal(_) => "INTERNAL",
        }
    }
}

pub type Result<T> = std::result::Result<T, ShellSvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_message_round_trips() {
        let err = ShellSvError::bad_request("command must not be empty");
        assert_eq!(err.to_string(), "command must not be empty");
        assert_eq!(err.kind(), "BAD_REQUEST");
    }

    #[test]
    fn internal_wraps_anyhow_context() {
        let source = anyhow::anyhow!("disk full").context("failed to create log file");
        let err: ShellSvError = source.into();
        assert_eq!(err.kind(), "INTERNAL");
        assert!(err.to_string().contains("failed to create log file"));
    }

    #[test]
    fn conflict_and_not_found_kinds() {
        assert_eq!(ShellSvError::conflict("busy").kind(), "CONFLICT");
        assert_eq!(ShellSvError::not_found("gone").kind(), "NOT_FOUND");
    }
}

//! Error types for port operations.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    /// The request never produced an HTTP response (connect, timeout, TLS)
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    /// The provider answered with a non-success status
    #[error("LLM provider returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Whether the same request may succeed if sent again.
    ///
    /// Timeouts, rate limits and server errors are transient; every other
    /// 4xx (auth, bad request, unsupported parameter) is not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RequestFailed(_) | LlmError::InvalidResponse(_) => true,
            LlmError::Http { status, .. } => matches!(status, 408 | 409 | 429) || *status >= 500,
        }
    }
}

/// Agent session memory errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    /// Database operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// Stored item could not be decoded.
    #[error("Corrupt session item: {0}")]
    Corrupt(String),
}

impl SessionStoreError {
    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    pub fn corrupt(message: impl ToString) -> Self {
        Self::Corrupt(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, body: &str) -> LlmError {
        LlmError::Http {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_transient_classification_uses_status() {
        assert!(http(503, "upstream overloaded, retry after 4000ms").is_transient());
        assert!(http(500, "Invalid state in worker").is_transient());
        assert!(http(429, "rate limited").is_transient());
        assert!(!http(401, "Unauthorized").is_transient());
        assert!(!http(400, "response_format not supported").is_transient());
        assert!(LlmError::RequestFailed("connection reset".into()).is_transient());
    }

    #[test]
    fn test_database_error_names_operation() {
        let err = SessionStoreError::database("load_items", "disk I/O error");
        assert_eq!(
            err.to_string(),
            "Database error in load_items: disk I/O error"
        );
    }
}

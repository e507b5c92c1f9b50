/// Errors raised by storage and authentication providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Backend unreachable or timed out
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    /// Backend answered with something we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Unavailable(format!("Request timeout: {}", err))
        } else if err.is_connect() {
            Self::Unavailable(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl From<sqlx::Error> for ProviderError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(err.to_string())
            }
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                Self::Conflict(db_err.message().to_string())
            }
            e => Self::Internal(e.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for ProviderError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Internal(format!("Migration failed: {}", err))
    }
}

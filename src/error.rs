use thiserror::Error;

use crate::notify::Notification;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad credentials, unknown user type or an expired session.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// An action was attempted without a valid credential.
    #[error("Authorization failed")]
    Unauthorized,

    /// A validation error caught before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A remote call failed or timed out.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote API answered with something we could not decode.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The persisted session entries could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A mutating action for the same enrollment has not completed yet.
    #[error("Action already in flight for enrollment {0}")]
    ActionInFlight(String),

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Network(format!("request timed out: {}", e))
        } else if e.is_connect() {
            AppError::Network(format!("connection failed: {}", e))
        } else {
            AppError::Network(e.to_string())
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<sonic_rs::Error> for AppError {
    fn from(e: sonic_rs::Error) -> Self {
        AppError::InvalidResponse(e.to_string())
    }
}

impl AppError {
    /// Maps the error to the notification shown to the user.
    pub fn notification(&self) -> Notification {
        match self {
            AppError::Authentication(msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                Notification::error(msg.clone())
            }

            AppError::Unauthorized => {
                tracing::warn!("Authorization failed");
                Notification::error("Session expired, please log in again")
            }

            AppError::Validation(msg) => {
                tracing::debug!("Validation error: {}", msg);
                Notification::error(msg.clone())
            }

            AppError::Network(msg) => {
                tracing::error!("Network error: {}", msg);
                Notification::error("Could not reach the server")
            }

            AppError::InvalidResponse(msg) => {
                tracing::error!("Invalid response: {}", msg);
                Notification::error("Unexpected response from the server")
            }

            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                Notification::error("Could not access the saved session")
            }

            AppError::ActionInFlight(id) => {
                tracing::debug!("Action already in flight for {}", id);
                Notification::error("Another action for this participant is still running")
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                Notification::error("Resource not found")
            }
        }
    }
}

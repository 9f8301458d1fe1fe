use garde::Validate;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{AppError, Result};

/// Credentials typed into the login form.
///
/// Wiped from memory when dropped.
#[derive(Validate, Zeroize, ZeroizeOnDrop)]
pub struct LoginCredentials {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1, max = 128))]
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }
}

/// Validates login credentials before anything is sent.
///
/// # Arguments
///
/// * `credentials` - The credentials to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the credentials are well formed.
pub fn validate_credentials(credentials: &LoginCredentials) -> Result<()> {
    credentials
        .validate()
        .map_err(|report| AppError::Validation(report.to_string()))
}

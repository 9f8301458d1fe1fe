use serde::Serialize;
use sonic_rs::JsonValueTrait;

use crate::{
    client::{self, ApiClient},
    error::{AppError, Result},
    models::session::UserType,
};

/// The request payload for `POST /{segment}/login`.
#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// A successful login: the issued credential and the cached profile.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub token: String,
    pub user: sonic_rs::Value,
}

/// Sends credentials to the login endpoint for `user_type`.
///
/// # Returns
///
/// A `Result` containing the `LoginGrant`. Fails with
/// `AppError::Authentication` when the server refuses the credentials or
/// answers without a token.
pub async fn login(
    client: &ApiClient,
    user_type: UserType,
    email: &str,
    password: &str,
) -> Result<LoginGrant> {
    let path = format!("/{}/login", user_type.endpoint_segment());
    let response = client
        .post_json(&path, &LoginRequest { email, password }, None)
        .await?;

    let status = response.status();
    if status.is_client_error() {
        tracing::warn!("❌ Login refused for {} ({})", user_type, status);
        return Err(AppError::Authentication(
            "Invalid email or password".to_string(),
        ));
    }
    let response = client::ensure_success(response)?;

    let body: sonic_rs::Value = client::read_json(response).await?;
    let token = body
        .get("token")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Authentication("Login failed".to_string()))?;

    let user = user_type
        .entity_key()
        .and_then(|key| body.get(key))
        .cloned()
        .unwrap_or_else(|| body.clone());

    Ok(LoginGrant { token, user })
}

/// Asks the API whether `token` is still accepted.
///
/// # Returns
///
/// `Ok(true)` on HTTP 200, `Ok(false)` on any other status. Transport
/// failures are returned as errors for the caller to degrade.
pub async fn authenticate(client: &ApiClient, user_type: UserType, token: &str) -> Result<bool> {
    let path = format!("/{}/authenticate", user_type.endpoint_segment());
    let response = client.get(&path, Some(token)).await?;
    Ok(response.status() == http::StatusCode::OK)
}

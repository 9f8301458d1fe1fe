use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sonic_rs::JsonValueTrait;
use tokio::sync::RwLock;

use crate::{
    client::ApiClient,
    error::{AppError, Result},
    models::session::{Session, UserType},
    repositories::auth as auth_repo,
    storage::{self, KeyValueStore, PersistedEntry, TOKEN_KEY, USER_KEY, USER_TYPE_KEY},
    validation::auth::{LoginCredentials, validate_credentials},
};

/// Process-wide authentication state.
///
/// Clones share the same session; only this type writes to it, and every
/// write replaces the whole `Session` at once.
#[derive(Clone)]
pub struct SessionStore {
    client: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    session: Arc<RwLock<Session>>,
    session_duration: Duration,
}

impl SessionStore {
    /// Creates an unauthenticated store. Call [`SessionStore::restore`] to
    /// pick up a persisted session.
    pub fn new(client: ApiClient, storage: Arc<dyn KeyValueStore>, session_duration_days: i64) -> Self {
        Self {
            client,
            storage,
            session: Arc::new(RwLock::new(Session::anonymous())),
            session_duration: Duration::days(session_duration_days),
        }
    }

    /// Logs in and persists the session.
    ///
    /// # Arguments
    ///
    /// * `email` - The account email.
    /// * `password` - The account password.
    /// * `user_type` - One of `Participant`, `Service Provider`, `College`, `admin`.
    ///
    /// # Returns
    ///
    /// A `Result` containing the profile route for the account.
    pub async fn login(&self, email: &str, password: &str, user_type: &str) -> Result<&'static str> {
        let user_type: UserType = user_type.parse()?;
        let credentials = LoginCredentials::new(email, password);
        validate_credentials(&credentials)?;

        tracing::debug!("🔐 Login attempt as {}: {}", user_type, credentials.email);
        let grant = auth_repo::login(&self.client, user_type, &credentials.email, &credentials.password).await?;

        let expires_at = Utc::now() + self.session_duration;
        let entries = [
            (TOKEN_KEY, sonic_rs::Value::from(grant.token.as_str())),
            (USER_TYPE_KEY, sonic_rs::Value::from(user_type.as_str())),
            (USER_KEY, grant.user.clone()),
        ];
        if let Err(e) = self.persist(entries, expires_at) {
            tracing::error!("❌ Could not persist session: {}", e);
            *self.session.write().await = Session::anonymous();
            if let Err(clear_err) = self.storage.clear() {
                tracing::warn!("⚠️ Could not discard partial session: {}", clear_err);
            }
            return Err(e);
        }

        let session = Session::authenticated(grant.token, user_type, Some(grant.user));
        let route = session.profile_route();
        *self.session.write().await = session;

        tracing::info!("✅ Logged in as {} (session until {})", user_type, expires_at);
        Ok(route)
    }

    /// Forgets the session locally. No network call is made.
    pub async fn logout(&self) -> Result<()> {
        *self.session.write().await = Session::anonymous();
        self.storage.clear()?;
        tracing::info!("👋 Logged out");
        Ok(())
    }

    /// Rehydrates the session from persisted entries without contacting
    /// the server.
    ///
    /// # Returns
    ///
    /// `true` if a live session was found.
    pub async fn restore(&self) -> bool {
        let now = Utc::now();
        let read = |key: &str| match storage::get_with_expiration_check(self.storage.as_ref(), key, now) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("⚠️ Could not read persisted '{}': {}", key, e);
                None
            }
        };

        let token = read(TOKEN_KEY).and_then(|v| v.as_str().map(str::to_string));
        let user_type = read(USER_TYPE_KEY)
            .and_then(|v| v.as_str().and_then(|s| s.parse::<UserType>().ok()));
        let user = read(USER_KEY);

        match (token, user_type) {
            (Some(token), Some(user_type)) => {
                *self.session.write().await = Session::authenticated(token, user_type, user);
                tracing::info!("✅ Restored {} session", user_type);
                true
            }
            _ => {
                *self.session.write().await = Session::anonymous();
                tracing::debug!("No live persisted session");
                false
            }
        }
    }

    /// A copy of the current session.
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_authenticated()
    }

    pub async fn profile_route(&self) -> &'static str {
        self.session.read().await.profile_route()
    }

    /// The current, non-expired bearer token.
    ///
    /// Reading an expired token destroys the session and fails with
    /// `AppError::Unauthorized`.
    pub async fn bearer_token(&self) -> Result<String> {
        let token = match storage::get_with_expiration_check(self.storage.as_ref(), TOKEN_KEY, Utc::now()) {
            Ok(value) => value.and_then(|v| v.as_str().map(str::to_string)),
            Err(e) => {
                tracing::warn!("⚠️ Could not read persisted token: {}", e);
                None
            }
        };

        match token {
            Some(token) => Ok(token),
            None => {
                self.expire().await;
                Err(AppError::Unauthorized)
            }
        }
    }

    /// Asks the server whether the session is still valid.
    ///
    /// Network failures and refusals both read as "not authenticated".
    /// College accounts have no check endpoint, so a live local token is
    /// the answer for them.
    pub async fn check(&self) -> bool {
        let Ok(token) = self.bearer_token().await else {
            return false;
        };
        let Some(user_type) = self.session.read().await.user_type() else {
            return false;
        };

        if !user_type.has_authenticate_endpoint() {
            return true;
        }

        match auth_repo::authenticate(&self.client, user_type, &token).await {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!("⚠️ Auth check failed: {}", e);
                false
            }
        }
    }

    fn persist(&self, entries: [(&str, sonic_rs::Value); 3], expires_at: DateTime<Utc>) -> Result<()> {
        for (key, value) in entries {
            self.storage.save(key, PersistedEntry::new(value, expires_at))?;
        }
        Ok(())
    }

    async fn expire(&self) {
        let mut session = self.session.write().await;
        if session.is_authenticated() {
            tracing::info!("⌛ Session expired");
            *session = Session::anonymous();
            drop(session);
            // Expired token means the rest of the session is stale too.
            if let Err(e) = self.storage.clear() {
                tracing::warn!("⚠️ Could not clear persisted session: {}", e);
            }
        }
    }
}

use std::sync::Arc;

use crate::{
    client::ApiClient,
    config::Config,
    error::Result,
    notify::Notifier,
    services::{enrollment::EnrollmentActions, roster::HttpRosterSource, session::SessionStore},
    storage::{FileStore, KeyValueStore},
    view_models::{proof::ProofInspector, roster::RosterViewModel},
};

/// The application's state.
///
/// Cheap to clone; every clone shares the same session and client.
#[derive(Clone)]
pub struct PanelState {
    /// The application's configuration.
    pub config: Config,
    /// The API client.
    pub client: ApiClient,
    /// The process-wide session.
    pub session: SessionStore,
    /// Enrollment decisions and proof forwarding.
    pub actions: EnrollmentActions,
    /// Where notifications go.
    pub notifier: Arc<dyn Notifier>,
}

impl PanelState {
    /// Creates a new `PanelState` persisting the session to `config.session_file`.
    pub fn new(config: &Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let storage = Arc::new(FileStore::new(&config.session_file));
        tracing::debug!("Session entries at {}", storage.path().display());
        Self::with_storage(config, storage, notifier)
    }

    /// Creates a new `PanelState` over an explicit storage backend.
    pub fn with_storage(
        config: &Config,
        storage: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let client = ApiClient::new(config)?;
        tracing::debug!("API client ready for {}", client.base_url());

        let session = SessionStore::new(client.clone(), storage, config.session_duration_days);
        let actions = EnrollmentActions::new(client.clone(), session.clone(), notifier.clone());

        Ok(PanelState {
            config: config.clone(),
            client,
            session,
            actions,
            notifier,
        })
    }

    /// A roster for `project_id` backed by the API.
    pub fn roster(&self, project_id: &str) -> RosterViewModel<HttpRosterSource> {
        let source = HttpRosterSource::new(
            self.client.clone(),
            self.session.clone(),
            self.config.roster_path.clone(),
        );
        RosterViewModel::new(project_id, source, self.actions.clone(), self.notifier.clone())
    }

    pub fn proof_inspector(&self) -> ProofInspector {
        ProofInspector::new(self.client.clone(), self.session.clone(), self.actions.clone())
    }
}

use std::future::Future;

use crate::{
    client::ApiClient,
    error::Result,
    models::enrollment::Enrollment,
    repositories::enrollment as enrollment_repo,
    services::session::SessionStore,
};

/// Supplies the enrolled participants of a project.
pub trait RosterSource: Send + Sync {
    fn fetch(&self, project_id: &str) -> impl Future<Output = Result<Vec<Enrollment>>> + Send;
}

/// Fetches the roster from the API with the current credential.
#[derive(Clone)]
pub struct HttpRosterSource {
    client: ApiClient,
    session: SessionStore,
    path_template: String,
}

impl HttpRosterSource {
    /// `path_template` must contain `{project_id}`.
    pub fn new(client: ApiClient, session: SessionStore, path_template: impl Into<String>) -> Self {
        Self {
            client,
            session,
            path_template: path_template.into(),
        }
    }

    fn path(&self, project_id: &str) -> String {
        self.path_template.replace("{project_id}", project_id)
    }
}

impl RosterSource for HttpRosterSource {
    async fn fetch(&self, project_id: &str) -> Result<Vec<Enrollment>> {
        let token = self.session.bearer_token().await?;
        let records = enrollment_repo::fetch_roster(&self.client, &token, &self.path(project_id)).await?;
        tracing::debug!("📋 Fetched {} enrollments for project {}", records.len(), project_id);
        Ok(records)
    }
}

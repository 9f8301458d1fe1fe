use crate::{
    client::ApiClient,
    error::{AppError, Result},
    models::{
        enrollment::{Enrollment, EnrollmentStatus},
        proof::{ForwardOutcome, ProofArtifact},
    },
    repositories::proof as proof_repo,
    services::{enrollment::EnrollmentActions, session::SessionStore},
};

/// Details view for one enrollment and the proof submitted for it.
pub struct ProofInspector {
    client: ApiClient,
    session: SessionStore,
    actions: EnrollmentActions,
    enrollment: Option<Enrollment>,
    artifact: ProofArtifact,
}

impl ProofInspector {
    pub fn new(client: ApiClient, session: SessionStore, actions: EnrollmentActions) -> Self {
        Self {
            client,
            session,
            actions,
            enrollment: None,
            artifact: ProofArtifact::empty(),
        }
    }

    /// Finds the proof `participant_email` submitted for `project_id`.
    ///
    /// Having no proof is normal, so every failure (no credential, network,
    /// bad payload) is logged and yields an empty artifact.
    pub async fn load_proof(&self, project_id: &str, participant_email: &str) -> ProofArtifact {
        let token = match self.session.bearer_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("⚠️ Skipping proof lookup for {}: {}", project_id, e);
                return ProofArtifact::empty();
            }
        };

        match proof_repo::list_proofs(&self.client, &token, project_id).await {
            Ok(proofs) => proofs
                .into_iter()
                .find(|p| p.email.as_deref() == Some(participant_email))
                .map(ProofArtifact::from)
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!("⚠️ Error fetching proofs for project {}: {}", project_id, e);
                ProofArtifact::empty()
            }
        }
    }

    /// Opens the details view for `enrollment` and loads its proof.
    ///
    /// Safe to call again for the same enrollment; the lookup is re-issued.
    pub async fn open(&mut self, project_id: &str, enrollment: &Enrollment) -> &ProofArtifact {
        self.artifact = match enrollment.email.as_deref().filter(|e| !e.is_empty()) {
            Some(email) => self.load_proof(project_id, email).await,
            None => {
                tracing::debug!("Enrollment {} has no email, no proof to match", enrollment.id);
                ProofArtifact::empty()
            }
        };
        self.enrollment = Some(enrollment.clone());
        &self.artifact
    }

    pub fn close(&mut self) {
        self.enrollment = None;
        self.artifact = ProofArtifact::empty();
    }

    pub fn enrollment(&self) -> Option<&Enrollment> {
        self.enrollment.as_ref()
    }

    pub fn artifact(&self) -> &ProofArtifact {
        &self.artifact
    }

    /// Forwarding is offered only once the participant has submitted proof.
    pub fn can_send_to_admin(&self) -> bool {
        self.enrollment
            .as_ref()
            .is_some_and(|e| e.status == EnrollmentStatus::ProofSubmitted)
    }

    /// Forwards the loaded proof to the administrator.
    ///
    /// Without a proof id the user is told to submit proof first and no
    /// request is made.
    pub async fn send_to_admin(&self) -> Result<ForwardOutcome> {
        if self.enrollment.is_some() && !self.can_send_to_admin() {
            return Err(AppError::Validation(
                "Only submitted proof can be sent to the admin".to_string(),
            ));
        }
        self.actions
            .send_proof_to_admin(self.artifact.proof_id.as_deref())
            .await
    }
}

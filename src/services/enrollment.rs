use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::{
    client::ApiClient,
    error::{AppError, Result},
    models::{enrollment::Decision, proof::ForwardOutcome},
    notify::{Notification, Notifier},
    repositories::{enrollment as enrollment_repo, proof as proof_repo},
    services::session::SessionStore,
    validation::enrollment::validate_remark,
};

/// Message shown when a proof is forwarded without a known proof id.
pub const SUBMIT_PROOF_FIRST: &str = "Proof not found, submit the proof first!";

/// Issues enrollment decisions and proof forwarding against the API.
#[derive(Clone)]
pub struct EnrollmentActions {
    client: ApiClient,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Marks an enrollment busy until dropped.
struct InFlight {
    set: Arc<Mutex<HashSet<String>>>,
    id: String,
}

impl InFlight {
    fn acquire(set: &Arc<Mutex<HashSet<String>>>, id: &str) -> Result<Self> {
        let mut ids = set
            .lock()
            .map_err(|_| AppError::Storage("in-flight set lock poisoned".to_string()))?;
        if !ids.insert(id.to_string()) {
            return Err(AppError::ActionInFlight(id.to_string()));
        }
        Ok(Self {
            set: set.clone(),
            id: id.to_string(),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Ok(mut ids) = self.set.lock() {
            ids.remove(&self.id);
        }
    }
}

impl EnrollmentActions {
    pub fn new(client: ApiClient, session: SessionStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            session,
            notifier,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Approves or rejects an enrollment.
    ///
    /// Rejections need a non-blank remark; that is checked before the
    /// credential or the network is touched. On success a notification is
    /// raised and the caller is expected to refetch its roster; on failure
    /// an error notification is raised and nothing is retried.
    ///
    /// # Arguments
    ///
    /// * `enrollment_id` - The enrollment to update.
    /// * `decision` - `Approved` or `Rejected`.
    /// * `remark` - The rejection reason. Ignored for approvals.
    pub async fn set_enrollment_status(
        &self,
        enrollment_id: &str,
        decision: Decision,
        remark: Option<&str>,
    ) -> Result<()> {
        let remark = validate_remark(decision, remark)?;
        let token = self.session.bearer_token().await?;
        let _busy = InFlight::acquire(&self.in_flight, enrollment_id)?;

        tracing::debug!("📝 Setting enrollment {} to {}", enrollment_id, decision.as_str());
        match enrollment_repo::set_status(&self.client, &token, enrollment_id, decision, remark.as_deref()).await {
            Ok(()) => {
                tracing::info!("✅ Enrollment {} {}", enrollment_id, decision.as_str());
                self.notifier.notify(Notification::success(format!(
                    "Enrollment {} successfully",
                    decision.as_str()
                )));
                Ok(())
            }
            Err(e) => {
                tracing::error!("❌ Failed to {} enrollment {}: {}", decision.verb(), enrollment_id, e);
                self.notifier.notify(Notification::error(format!(
                    "Failed to {} enrollment",
                    decision.verb()
                )));
                Err(e)
            }
        }
    }

    /// Forwards a submitted proof to the administrator.
    ///
    /// A missing proof id is reported to the user and nothing is sent.
    /// Server refusals (typically "already submitted") and transport
    /// failures are reported the same way and do not propagate; only a
    /// missing credential is an error.
    pub async fn send_proof_to_admin(&self, proof_id: Option<&str>) -> Result<ForwardOutcome> {
        let Some(proof_id) = proof_id.filter(|id| !id.trim().is_empty()) else {
            self.notifier.notify(Notification::error(SUBMIT_PROOF_FIRST));
            return Ok(ForwardOutcome::MissingProof);
        };

        let token = self.session.bearer_token().await?;

        match proof_repo::send_to_admin(&self.client, &token, proof_id).await {
            Ok(()) => {
                tracing::info!("✅ Proof {} sent to admin", proof_id);
                self.notifier
                    .notify(Notification::success("Proof sent to admin successfully"));
                Ok(ForwardOutcome::Forwarded)
            }
            Err(e) => {
                tracing::warn!("❌ Failed to send proof {} to admin: {}", proof_id, e);
                self.notifier.notify(Notification::error("Proof already submitted"));
                Ok(ForwardOutcome::Failed)
            }
        }
    }
}

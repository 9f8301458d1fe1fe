use serde::{Deserialize, Serialize};

/// Proof media a participant submitted for an enrollment.
///
/// Every field may be absent on its own; an all-empty artifact means no
/// proof has been submitted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub proof_image: Option<String>,
    pub proof_video: Option<String>,
    pub proof_id: Option<String>,
}

impl ProofArtifact {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.proof_image.is_none() && self.proof_video.is_none() && self.proof_id.is_none()
    }
}

/// What happened when forwarding a proof to an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// The administrator review endpoint accepted the proof.
    Forwarded,
    /// The server refused or could not be reached (usually: already submitted).
    Failed,
    /// No proof id was known, nothing was sent.
    MissingProof,
}

use serde::{Deserialize, Serialize};

use crate::{
    client::{self, ApiClient},
    error::Result,
    models::proof::ProofArtifact,
};

/// A proof as listed by `GET /serviceProviders/proofs/{projectId}`.
#[derive(Deserialize, Debug, Clone)]
pub struct ProofRecord {
    #[serde(alias = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_path: Option<String>,
}

impl From<ProofRecord> for ProofArtifact {
    fn from(record: ProofRecord) -> Self {
        Self {
            proof_image: non_empty(record.image_url).or_else(|| non_empty(record.image_path)),
            proof_video: non_empty(record.video_url).or_else(|| non_empty(record.video_path)),
            proof_id: non_empty(record.id),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
struct ProofListResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<ProofRecord>,
}

#[derive(Serialize)]
struct SendToAdminRequest<'a> {
    #[serde(rename = "proofId")]
    proof_id: &'a str,
}

/// Lists every proof submitted for a project.
///
/// A response without `success: true` counts as no proofs.
pub async fn list_proofs(
    client: &ApiClient,
    token: &str,
    project_id: &str,
) -> Result<Vec<ProofRecord>> {
    let path = format!("/serviceProviders/proofs/{}", project_id);
    let response = client.get(&path, Some(token)).await?;
    let response = client::ensure_success(response)?;

    let body: ProofListResponse = client::read_json(response).await?;
    if !body.success {
        tracing::debug!("Proof listing for project {} reported no success", project_id);
        return Ok(Vec::new());
    }
    Ok(body.data)
}

/// Forwards a proof to the administrator review queue.
pub async fn send_to_admin(client: &ApiClient, token: &str, proof_id: &str) -> Result<()> {
    let path = format!("/serviceProviders/proofs/{}/send-to-admin", proof_id);
    let response = client
        .post_json(&path, &SendToAdminRequest { proof_id }, Some(token))
        .await?;
    client::ensure_success(response)?;
    Ok(())
}

use serde::{Deserialize, Serialize};

use crate::{
    client::{self, ApiClient},
    error::Result,
    models::enrollment::{Decision, Enrollment},
};

/// The request payload for `PUT /enroll/approve-reject`.
#[derive(Serialize, Debug)]
struct StatusUpdateRequest<'a> {
    enrollment_id: &'a str,
    status: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    remark: Option<&'a str>,
}

/// Roster payloads come either bare or wrapped in `data`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RosterPayload {
    Bare(Vec<Enrollment>),
    Wrapped { data: Vec<Enrollment> },
}

/// Records a service-provider decision on an enrollment.
///
/// # Arguments
///
/// * `client` - The API client.
/// * `token` - The caller's bearer token.
/// * `enrollment_id` - The enrollment to update.
/// * `decision` - The new status.
/// * `remark` - The rejection remark, already validated.
pub async fn set_status(
    client: &ApiClient,
    token: &str,
    enrollment_id: &str,
    decision: Decision,
    remark: Option<&str>,
) -> Result<()> {
    let payload = StatusUpdateRequest {
        enrollment_id,
        status: decision,
        remark,
    };

    let response = client
        .put_json("/enroll/approve-reject", &payload, Some(token))
        .await?;
    client::ensure_success(response)?;
    Ok(())
}

/// Fetches the enrolled participants behind `path`.
pub async fn fetch_roster(client: &ApiClient, token: &str, path: &str) -> Result<Vec<Enrollment>> {
    let response = client.get(path, Some(token)).await?;
    let response = client::ensure_success(response)?;

    Ok(match client::read_json::<RosterPayload>(response).await? {
        RosterPayload::Bare(records) => records,
        RosterPayload::Wrapped { data } => data,
    })
}

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use sonic_rs::JsonValueTrait;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

use ecoedu_panel::{
    AppError, Config, PanelState,
    models::{
        enrollment::{Decision, EnrollmentStatus},
        proof::{ForwardOutcome, ProofArtifact},
        session::UserType,
    },
    notify::{ChannelNotifier, Level, Notification},
    storage::{KeyValueStore, MemoryStore, PersistedEntry, TOKEN_KEY, USER_KEY, USER_TYPE_KEY},
    view_models::roster::{RosterAction, ViewMode},
};

const PROJECT: &str = "proj-42";
const PASSWORD: &str = "correct horse";

/// In-process stand-in for the marketplace API.
#[derive(Default)]
struct FakeApi {
    enrollments: Mutex<Vec<Value>>,
    proofs: Mutex<Vec<Value>>,
    forwarded: Mutex<HashSet<String>>,
    remarks: Mutex<HashMap<String, String>>,
    revoked: Mutex<bool>,
    status_calls: AtomicUsize,
    roster_fetches: AtomicUsize,
    proof_fetches: AtomicUsize,
    send_calls: AtomicUsize,
}

type Shared = Arc<FakeApi>;

fn authorized(api: &FakeApi, headers: &HeaderMap) -> bool {
    if *api.revoked.lock().unwrap() {
        return false;
    }
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h.starts_with("Bearer tok-"))
}

async fn login(Path(segment): Path<String>, Json(body): Json<Value>) -> impl IntoResponse {
    if body["email"] == "silent@ecoedu.com" {
        return (StatusCode::OK, Json(json!({ "message": "ok" })));
    }
    if body["password"] != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials" })));
    }
    let entity = match segment.as_str() {
        "participants" => "participant",
        "serviceProviders" => "serviceProvider",
        "college" => "college",
        _ => "admin",
    };
    let mut reply = json!({ "token": format!("tok-{}", segment) });
    reply[entity] = json!({ "name": "Green Roots Co", "email": body["email"] });
    (StatusCode::OK, Json(reply))
}

async fn authenticate(State(api): State<Shared>, headers: HeaderMap) -> StatusCode {
    if authorized(&api, &headers) {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    }
}

async fn approve_reject(
    State(api): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    api.status_calls.fetch_add(1, Ordering::SeqCst);
    if !authorized(&api, &headers) {
        return StatusCode::UNAUTHORIZED;
    }

    let id = body["enrollment_id"].as_str().unwrap_or_default().to_string();
    if id.starts_with("enr-slow") {
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    }
    if id == "enr-broken" {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    if let Some(remark) = body["remark"].as_str() {
        api.remarks.lock().unwrap().insert(id.clone(), remark.to_string());
    }

    let mut enrollments = api.enrollments.lock().unwrap();
    match enrollments.iter_mut().find(|e| e["id"] == id.as_str()) {
        Some(record) => {
            record["project_enroll_status"] = body["status"].clone();
            StatusCode::OK
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn roster(State(api): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
    api.roster_fetches.fetch_add(1, Ordering::SeqCst);
    if !authorized(&api, &headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    let data = api.enrollments.lock().unwrap().clone();
    (StatusCode::OK, Json(json!({ "success": true, "data": data })))
}

async fn proofs(State(api): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
    api.proof_fetches.fetch_add(1, Ordering::SeqCst);
    if !authorized(&api, &headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    let data = api.proofs.lock().unwrap().clone();
    (StatusCode::OK, Json(json!({ "success": true, "data": data })))
}

async fn send_to_admin(
    State(api): State<Shared>,
    Path(proof_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    api.send_calls.fetch_add(1, Ordering::SeqCst);
    if !authorized(&api, &headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    if !api.forwarded.lock().unwrap().insert(proof_id) {
        return (StatusCode::CONFLICT, Json(json!({ "message": "Proof already submitted" })));
    }
    (StatusCode::OK, Json(json!({ "success": true })))
}

async fn spawn_api(api: Shared) -> SocketAddr {
    let app = Router::new()
        .route("/{segment}/login", post(login))
        .route("/{segment}/authenticate", get(authenticate))
        .route("/enroll/approve-reject", put(approve_reject))
        .route("/serviceProviders/projects/{project_id}/participants", get(roster))
        .route("/serviceProviders/proofs/{id}", get(proofs))
        .route("/serviceProviders/proofs/{id}/send-to-admin", post(send_to_admin))
        .with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Memory storage whose writes to one key always fail.
struct FailingStore {
    inner: MemoryStore,
    broken_key: &'static str,
}

impl KeyValueStore for FailingStore {
    fn load(&self, key: &str) -> ecoedu_panel::Result<Option<PersistedEntry>> {
        self.inner.load(key)
    }

    fn save(&self, key: &str, entry: PersistedEntry) -> ecoedu_panel::Result<()> {
        if key == self.broken_key {
            return Err(AppError::Storage("disk full".to_string()));
        }
        self.inner.save(key, entry)
    }

    fn remove(&self, key: &str) -> ecoedu_panel::Result<()> {
        self.inner.remove(key)
    }

    fn clear(&self) -> ecoedu_panel::Result<()> {
        self.inner.clear()
    }
}

// Shared test context
struct TestContext {
    api: Shared,
    state: PanelState,
    storage: Arc<MemoryStore>,
    notifications: UnboundedReceiver<Notification>,
}

impl TestContext {
    async fn new() -> Self {
        let api = Arc::new(FakeApi::default());
        let addr = spawn_api(api.clone()).await;
        Self::against(api, &format!("http://{}", addr))
    }

    fn against(api: Shared, base_url: &str) -> Self {
        let (tx, rx) = unbounded_channel();
        let storage = Arc::new(MemoryStore::new());
        let state = PanelState::with_storage(
            &Config::new(base_url),
            storage.clone(),
            Arc::new(ChannelNotifier::new(tx)),
        )
        .unwrap();
        Self {
            api,
            state,
            storage,
            notifications: rx,
        }
    }

    async fn logged_in() -> Self {
        let ctx = Self::new().await;
        ctx.state
            .session
            .login("provider@ecoedu.com", PASSWORD, "Service Provider")
            .await
            .unwrap();
        ctx
    }

    fn seed_enrollment(&self, id: &str, status: &str, email: &str) {
        self.api.enrollments.lock().unwrap().push(json!({
            "id": id,
            "participant_id": format!("p-{}", id),
            "name": format!("Participant {}", id),
            "email": email,
            "location": "Kisumu",
            "serviceType": "Forestation",
            "enrollmentDate": "2024-05-01T08:00:00.000Z",
            "project_enroll_status": status,
        }));
    }

    fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            out.push(n);
        }
        out
    }

    fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn service_provider_login_routes_to_dashboard() {
        let ctx = TestContext::new().await;
        let before = Utc::now();

        let route = ctx
            .state
            .session
            .login("provider@ecoedu.com", PASSWORD, "Service Provider")
            .await
            .unwrap();
        assert_eq!(route, "/dashboard/service_provider");

        let session = ctx.state.session.snapshot().await;
        assert!(session.is_authenticated());
        assert_eq!(session.user_type(), Some(UserType::ServiceProvider));
        assert_eq!(
            session.user().and_then(|u| u.get("name")).and_then(|n| n.as_str()),
            Some("Green Roots Co")
        );

        // All three entries persisted with a seven-day expiry.
        let expected = (before + Duration::days(7)).timestamp_millis();
        for key in [TOKEN_KEY, USER_TYPE_KEY, USER_KEY] {
            let entry = ctx.storage.load(key).unwrap().unwrap();
            assert!((entry.expiration_time - expected).abs() < 60_000, "key {}", key);
        }
        let token = ctx.storage.load(TOKEN_KEY).unwrap().unwrap();
        assert_eq!(token.value.as_str(), Some("tok-serviceProviders"));
        let user_type = ctx.storage.load(USER_TYPE_KEY).unwrap().unwrap();
        assert_eq!(user_type.value.as_str(), Some("Service Provider"));
    }

    #[tokio::test]
    async fn admin_and_college_routes() {
        let ctx = TestContext::new().await;
        let route = ctx.state.session.login("root@ecoedu.com", PASSWORD, "admin").await.unwrap();
        assert_eq!(route, "/dashboard/admin");
        // Admin logins cache the whole response body.
        let session = ctx.state.session.snapshot().await;
        assert!(session.user().and_then(|u| u.get("token")).is_some());

        let route = ctx.state.session.login("dean@ecoedu.com", PASSWORD, "College").await.unwrap();
        assert_eq!(route, "/dashboard/college");
    }

    #[tokio::test]
    async fn bad_password_is_an_auth_error() {
        let ctx = TestContext::new().await;
        let err = ctx
            .state
            .session
            .login("provider@ecoedu.com", "wrong", "Service Provider")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
        assert!(!ctx.state.session.is_authenticated().await);
        assert!(ctx.storage.is_empty());
    }

    #[tokio::test]
    async fn login_without_token_is_an_auth_error() {
        let ctx = TestContext::new().await;
        let err = ctx
            .state
            .session
            .login("silent@ecoedu.com", PASSWORD, "Participant")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
        assert!(ctx.storage.is_empty());
    }

    #[tokio::test]
    async fn check_follows_the_server() {
        let ctx = TestContext::logged_in().await;
        assert!(ctx.state.session.check().await);

        *ctx.api.revoked.lock().unwrap() = true;
        assert!(!ctx.state.session.check().await);
    }

    #[tokio::test]
    async fn check_degrades_when_server_is_unreachable() {
        let ctx = TestContext::against(Arc::new(FakeApi::default()), "http://127.0.0.1:1");
        ctx.storage
            .save(
                TOKEN_KEY,
                PersistedEntry::new(
                    sonic_rs::Value::from("tok-serviceProviders"),
                    Utc::now() + Duration::days(1),
                ),
            )
            .unwrap();
        ctx.storage
            .save(
                USER_TYPE_KEY,
                PersistedEntry::new(
                    sonic_rs::Value::from("Service Provider"),
                    Utc::now() + Duration::days(1),
                ),
            )
            .unwrap();
        assert!(ctx.state.session.restore().await);
        assert!(!ctx.state.session.check().await);
    }

    #[tokio::test]
    async fn session_survives_restart_with_file_storage() {
        let api = Arc::new(FakeApi::default());
        let addr = spawn_api(api).await;
        let dir = tempfile::tempdir().unwrap();

        let mut config = Config::new(format!("http://{}", addr));
        config.session_file = dir.path().join("session.json");

        let (tx, _rx) = unbounded_channel();
        let first = PanelState::new(&config, Arc::new(ChannelNotifier::new(tx.clone()))).unwrap();
        first
            .session
            .login("provider@ecoedu.com", PASSWORD, "Service Provider")
            .await
            .unwrap();

        let second = PanelState::new(&config, Arc::new(ChannelNotifier::new(tx))).unwrap();
        assert!(second.session.restore().await);
        assert_eq!(second.session.profile_route().await, "/dashboard/service_provider");

        second.session.logout().await.unwrap();
        let third = PanelState::new(&config, Arc::new(ChannelNotifier::new(unbounded_channel().0))).unwrap();
        assert!(!third.session.restore().await);
    }

    #[tokio::test]
    async fn blank_remark_never_reaches_the_server() {
        let mut ctx = TestContext::logged_in().await;
        ctx.seed_enrollment("enr-9", "pending", "nia@ecoedu.com");

        for remark in [None, Some(""), Some("   ")] {
            let err = ctx
                .state
                .actions
                .set_enrollment_status("enr-9", Decision::Rejected, remark)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }

        let mut roster = ctx.state.roster(PROJECT);
        roster.refresh().await.unwrap();
        roster.open_reject("enr-9").unwrap();
        roster.set_reject_remark("  \n ");
        assert!(matches!(roster.confirm_reject().await, Err(AppError::Validation(_))));
        assert!(roster.reject_dialog().is_some(), "dialog stays open");

        assert_eq!(TestContext::count(&ctx.api.status_calls), 0);
        let notes = ctx.drain();
        assert_eq!(notes, vec![Notification::error("Remark is required to reject")]);
    }

    #[tokio::test]
    async fn rejected_enrollment_can_be_reapproved() {
        let mut ctx = TestContext::logged_in().await;
        ctx.seed_enrollment("enr-1", "rejected", "kofi@ecoedu.com");

        let mut roster = ctx.state.roster(PROJECT);
        roster.refresh().await.unwrap();
        assert_eq!(
            roster.actions_for("enr-1"),
            Some(&[RosterAction::ViewDetails, RosterAction::Approve][..])
        );

        roster.approve("enr-1").await.unwrap();

        assert_eq!(TestContext::count(&ctx.api.status_calls), 1);
        assert_eq!(TestContext::count(&ctx.api.roster_fetches), 2, "refetched after approval");
        assert_eq!(roster.find("enr-1").unwrap().status, EnrollmentStatus::Approved);
        assert_eq!(
            roster.actions_for("enr-1"),
            Some(&[RosterAction::ViewDetails, RosterAction::InitiateUpdate][..])
        );
        assert_eq!(ctx.drain(), vec![Notification::success("Enrollment approved successfully")]);
    }

    #[tokio::test]
    async fn confirmed_rejection_sends_remark_and_refetches() {
        let mut ctx = TestContext::logged_in().await;
        ctx.seed_enrollment("enr-2", "pending", "ama@ecoedu.com");

        let mut roster = ctx.state.roster(PROJECT);
        roster.refresh().await.unwrap();
        roster.open_reject("enr-2").unwrap();
        roster.set_reject_remark("Outside the service area");
        roster.confirm_reject().await.unwrap();

        assert!(roster.reject_dialog().is_none());
        assert_eq!(
            ctx.api.remarks.lock().unwrap().get("enr-2").map(String::as_str),
            Some("Outside the service area")
        );
        assert_eq!(TestContext::count(&ctx.api.roster_fetches), 2);
        assert_eq!(roster.find("enr-2").unwrap().status, EnrollmentStatus::Rejected);
        assert_eq!(ctx.drain(), vec![Notification::success("Enrollment rejected successfully")]);
    }

    #[tokio::test]
    async fn long_remark_is_sent_in_full() {
        let mut ctx = TestContext::logged_in().await;
        ctx.seed_enrollment("enr-20", "pending", "kweku@ecoedu.com");
        let remark = "x".repeat(1001);

        let mut roster = ctx.state.roster(PROJECT);
        roster.refresh().await.unwrap();
        roster.open_reject("enr-20").unwrap();
        roster.set_reject_remark(remark.clone());
        roster.confirm_reject().await.unwrap();

        assert!(roster.reject_dialog().is_none());
        assert_eq!(TestContext::count(&ctx.api.status_calls), 1);
        assert_eq!(ctx.api.remarks.lock().unwrap().get("enr-20"), Some(&remark));
        assert_eq!(ctx.drain(), vec![Notification::success("Enrollment rejected successfully")]);
    }

    #[tokio::test]
    async fn overlapping_decisions_on_one_enrollment_send_one_request() {
        let mut ctx = TestContext::logged_in().await;
        ctx.seed_enrollment("enr-slow-1", "pending", "akua@ecoedu.com");

        let mut first = ctx.state.roster(PROJECT);
        let mut second = ctx.state.roster(PROJECT);
        first.refresh().await.unwrap();
        second.refresh().await.unwrap();

        let (a, b) = tokio::join!(first.approve("enr-slow-1"), async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            second.approve("enr-slow-1").await
        });

        a.unwrap();
        assert!(matches!(b, Err(AppError::ActionInFlight(id)) if id == "enr-slow-1"));
        assert_eq!(TestContext::count(&ctx.api.status_calls), 1);
        assert_eq!(
            ctx.drain(),
            vec![
                Notification::error("Another action for this participant is still running"),
                Notification::success("Enrollment approved successfully"),
            ]
        );

        // The guard is released once the first request completes.
        ctx.state
            .actions
            .set_enrollment_status("enr-slow-1", Decision::Approved, None)
            .await
            .unwrap();
        assert_eq!(TestContext::count(&ctx.api.status_calls), 2);
    }

    #[tokio::test]
    async fn failed_update_keeps_cached_roster() {
        let mut ctx = TestContext::logged_in().await;
        ctx.seed_enrollment("enr-broken", "pending", "yaw@ecoedu.com");

        let mut roster = ctx.state.roster(PROJECT);
        roster.refresh().await.unwrap();
        let err = roster.approve("enr-broken").await.unwrap_err();

        assert!(matches!(err, AppError::Network(_)));
        assert_eq!(TestContext::count(&ctx.api.roster_fetches), 1, "no refetch on failure");
        assert_eq!(roster.find("enr-broken").unwrap().status, EnrollmentStatus::Pending);

        let notes = ctx.drain();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, Level::Error);
        assert_eq!(notes[0].message, "Failed to approve enrollment");
    }

    #[tokio::test]
    async fn actions_without_credential_fail_fast() {
        let ctx = TestContext::new().await;
        ctx.seed_enrollment("enr-3", "pending", "esi@ecoedu.com");

        let err = ctx
            .state
            .actions
            .set_enrollment_status("enr-3", Decision::Approved, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));

        let err = ctx.state.actions.send_proof_to_admin(Some("pr-1")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));

        assert_eq!(TestContext::count(&ctx.api.status_calls), 0);
        assert_eq!(TestContext::count(&ctx.api.send_calls), 0);
    }

    #[tokio::test]
    async fn actions_not_offered_are_refused_locally() {
        let ctx = TestContext::logged_in().await;
        ctx.seed_enrollment("enr-4", "completed", "abena@ecoedu.com");
        ctx.seed_enrollment("enr-5", "approved", "kwame@ecoedu.com");

        let mut roster = ctx.state.roster(PROJECT);
        roster.refresh().await.unwrap();

        assert!(matches!(roster.approve("enr-4").await, Err(AppError::Validation(_))));
        assert!(matches!(roster.open_reject("enr-5"), Err(AppError::Validation(_))));
        assert!(matches!(roster.approve("missing").await, Err(AppError::NotFound)));
        assert_eq!(TestContext::count(&ctx.api.status_calls), 0);

        let draft = roster.begin_update("enr-5").unwrap();
        assert_eq!(draft.credits, "");
        assert_eq!(draft.remarks, "");
        assert!(roster.begin_update("enr-4").is_err());
    }

    #[tokio::test]
    async fn filtering_stays_client_side() {
        let ctx = TestContext::logged_in().await;
        ctx.seed_enrollment("enr-6", "pending", "a@ecoedu.com");
        ctx.api.enrollments.lock().unwrap().push(json!({
            "id": "enr-7",
            "name": "Water Warriors",
            "serviceType": "Water",
            "project_enroll_status": "approved",
        }));

        let mut roster = ctx.state.roster(PROJECT);
        roster.refresh().await.unwrap();

        roster.set_query("WATER");
        let rows = roster.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].serial, 1);
        assert_eq!(rows[0].enrollment.id, "enr-7");
        assert_eq!(rows[0].enrollment.display_email(), "enr-7@ecoedu.com");

        roster.set_query("participant enr-6");
        assert_eq!(roster.visible().len(), 1);
        roster.set_query("");
        assert_eq!(roster.visible().len(), 2);

        assert_eq!(roster.view_mode(), ViewMode::List);
        assert_eq!(roster.toggle_view_mode(), ViewMode::Grid);
        assert_eq!(roster.rows().len(), 2);

        assert_eq!(TestContext::count(&ctx.api.roster_fetches), 1);
    }

    #[tokio::test]
    async fn proof_is_matched_by_participant_email() {
        let ctx = TestContext::logged_in().await;
        ctx.api.proofs.lock().unwrap().extend([
            json!({ "id": "pr-other", "email": "other@ecoedu.com", "image_url": "https://cdn/o.jpg" }),
            json!({ "id": "pr-7", "email": "kofi@ecoedu.com", "image_path": "/uploads/k.jpg", "video_url": "https://cdn/k.mp4" }),
        ]);

        let inspector = ctx.state.proof_inspector();
        let artifact = inspector.load_proof(PROJECT, "kofi@ecoedu.com").await;
        assert_eq!(
            artifact,
            ProofArtifact {
                proof_image: Some("/uploads/k.jpg".into()),
                proof_video: Some("https://cdn/k.mp4".into()),
                proof_id: Some("pr-7".into()),
            }
        );
    }

    #[tokio::test]
    async fn no_submitted_proof_is_an_empty_artifact() {
        let ctx = TestContext::logged_in().await;
        ctx.api.proofs.lock().unwrap().push(json!({ "id": "pr-x", "email": "someone@ecoedu.com" }));

        let inspector = ctx.state.proof_inspector();
        let artifact = inspector.load_proof(PROJECT, "kofi@ecoedu.com").await;
        assert!(artifact.is_empty());
        assert_eq!(TestContext::count(&ctx.api.proof_fetches), 1);
    }

    #[tokio::test]
    async fn proof_lookup_degrades_on_network_error() {
        let ctx = TestContext::against(Arc::new(FakeApi::default()), "http://127.0.0.1:1");
        ctx.storage
            .save(
                TOKEN_KEY,
                PersistedEntry::new(
                    sonic_rs::Value::from("tok-serviceProviders"),
                    Utc::now() + Duration::days(1),
                ),
            )
            .unwrap();

        let inspector = ctx.state.proof_inspector();
        assert_eq!(inspector.load_proof(PROJECT, "kofi@ecoedu.com").await, ProofArtifact::empty());
    }

    #[tokio::test]
    async fn forwarding_without_proof_asks_for_submission_first() {
        let mut ctx = TestContext::logged_in().await;
        ctx.seed_enrollment("enr-8", "proof-submitted", "adjoa@ecoedu.com");

        let mut roster = ctx.state.roster(PROJECT);
        roster.refresh().await.unwrap();
        let enrollment = roster.view_details("enr-8").unwrap().clone();

        let mut inspector = ctx.state.proof_inspector();
        assert!(inspector.open(PROJECT, &enrollment).await.is_empty());
        assert!(inspector.can_send_to_admin());

        let outcome = inspector.send_to_admin().await.unwrap();
        assert_eq!(outcome, ForwardOutcome::MissingProof);
        assert_eq!(TestContext::count(&ctx.api.send_calls), 0);
        assert_eq!(
            ctx.drain(),
            vec![Notification::error("Proof not found, submit the proof first!")]
        );
    }

    #[tokio::test]
    async fn proof_is_not_forwarded_before_submission() {
        let mut ctx = TestContext::logged_in().await;
        ctx.seed_enrollment("enr-12", "approved", "kofi@ecoedu.com");
        ctx.api.proofs.lock().unwrap().push(json!({
            "id": "pr-12", "email": "kofi@ecoedu.com", "image_url": "/uploads/k.png"
        }));

        let mut roster = ctx.state.roster(PROJECT);
        roster.refresh().await.unwrap();
        let enrollment = roster.view_details("enr-12").unwrap().clone();

        let mut inspector = ctx.state.proof_inspector();
        let artifact = inspector.open(PROJECT, &enrollment).await;
        assert_eq!(artifact.proof_id.as_deref(), Some("pr-12"));
        assert!(!inspector.can_send_to_admin());

        assert!(matches!(inspector.send_to_admin().await, Err(AppError::Validation(_))));
        assert_eq!(TestContext::count(&ctx.api.send_calls), 0);
        assert!(ctx.drain().is_empty());
    }

    #[tokio::test]
    async fn login_leaves_nothing_behind_when_persisting_fails() {
        let api = Arc::new(FakeApi::default());
        let addr = spawn_api(api).await;
        let storage = Arc::new(FailingStore {
            inner: MemoryStore::new(),
            broken_key: USER_KEY,
        });
        let state = PanelState::with_storage(
            &Config::new(format!("http://{}", addr)),
            storage.clone(),
            Arc::new(ChannelNotifier::new(unbounded_channel().0)),
        )
        .unwrap();

        let err = state
            .session
            .login("provider@ecoedu.com", PASSWORD, "Service Provider")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert!(!state.session.is_authenticated().await);
        assert!(storage.load(TOKEN_KEY).unwrap().is_none());
        assert!(storage.load(USER_TYPE_KEY).unwrap().is_none());
        assert!(matches!(state.session.bearer_token().await, Err(AppError::Unauthorized)));
        assert!(!state.session.restore().await);
    }

    #[tokio::test]
    async fn second_forward_reports_already_submitted() {
        let mut ctx = TestContext::logged_in().await;
        ctx.seed_enrollment("enr-10", "proof-submitted", "efua@ecoedu.com");
        ctx.api.proofs.lock().unwrap().push(json!({
            "_id": "pr-10", "email": "efua@ecoedu.com", "video_path": "/uploads/e.mp4"
        }));

        let mut roster = ctx.state.roster(PROJECT);
        roster.refresh().await.unwrap();
        let enrollment = roster.view_details("enr-10").unwrap().clone();

        let mut inspector = ctx.state.proof_inspector();
        let artifact = inspector.open(PROJECT, &enrollment).await;
        assert_eq!(artifact.proof_id.as_deref(), Some("pr-10"));
        assert!(artifact.proof_image.is_none());

        assert_eq!(inspector.send_to_admin().await.unwrap(), ForwardOutcome::Forwarded);
        assert_eq!(inspector.send_to_admin().await.unwrap(), ForwardOutcome::Failed);
        assert_eq!(TestContext::count(&ctx.api.send_calls), 2);
        assert_eq!(
            ctx.drain(),
            vec![
                Notification::success("Proof sent to admin successfully"),
                Notification::error("Proof already submitted"),
            ]
        );
    }

    #[tokio::test]
    async fn expired_token_logs_out_on_next_action() {
        let ctx = TestContext::logged_in().await;
        ctx.seed_enrollment("enr-11", "pending", "kojo@ecoedu.com");
        ctx.storage
            .save(
                TOKEN_KEY,
                PersistedEntry::new(
                    sonic_rs::Value::from("tok-serviceProviders"),
                    Utc::now() - Duration::seconds(1),
                ),
            )
            .unwrap();

        let err = ctx
            .state
            .actions
            .set_enrollment_status("enr-11", Decision::Approved, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
        assert!(!ctx.state.session.is_authenticated().await);
        assert_eq!(ctx.state.session.profile_route().await, "/profile");
        assert_eq!(TestContext::count(&ctx.api.status_calls), 0);
    }
}

//! Enrolled-participant roster for a service provider's project.
//!
//! The action set offered for a record is a pure function of its status;
//! nothing here caches eligibility. After every successful decision the
//! roster is refetched from the API instead of patched in place.

use std::sync::Arc;

use crate::{
    error::{AppError, Result},
    models::enrollment::{Decision, Enrollment, EnrollmentStatus},
    notify::{Notification, Notifier},
    services::{enrollment::EnrollmentActions, roster::RosterSource},
    validation::enrollment::REMARK_REQUIRED,
};

/// An action the UI may offer for a roster entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RosterAction {
    ViewDetails,
    InitiateUpdate,
    Approve,
    Reject,
}

/// The actions allowed for an enrollment in `status`.
pub fn allowed_actions(status: EnrollmentStatus) -> &'static [RosterAction] {
    use RosterAction::*;
    match status {
        EnrollmentStatus::Pending => &[Approve, Reject],
        EnrollmentStatus::Approved => &[ViewDetails, InitiateUpdate],
        EnrollmentStatus::Rejected => &[ViewDetails, Approve],
        EnrollmentStatus::ProofSubmitted
        | EnrollmentStatus::Completed
        | EnrollmentStatus::RejectedByAdmin => &[ViewDetails],
    }
}

/// How the roster is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    Grid,
    #[default]
    List,
}

/// One table row.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterRow<'a> {
    /// 1-based position in the visible list.
    pub serial: usize,
    pub enrollment: &'a Enrollment,
    pub actions: &'static [RosterAction],
}

/// Prefilled form for the credit/proof update of an approved enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDraft {
    pub enrollment_id: String,
    pub credits: String,
    pub remarks: String,
}

/// The rejection confirmation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectDialog {
    pub enrollment_id: String,
    pub remark: String,
}

pub struct RosterViewModel<S: RosterSource> {
    project_id: String,
    source: S,
    actions: EnrollmentActions,
    notifier: Arc<dyn Notifier>,
    records: Vec<Enrollment>,
    query: String,
    view_mode: ViewMode,
    reject_dialog: Option<RejectDialog>,
}

impl<S: RosterSource> RosterViewModel<S> {
    pub fn new(
        project_id: impl Into<String>,
        source: S,
        actions: EnrollmentActions,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            source,
            actions,
            notifier,
            records: Vec::new(),
            query: String::new(),
            view_mode: ViewMode::default(),
            reject_dialog: None,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Replaces the cached roster with a fresh copy from the source.
    ///
    /// On failure the previous copy is kept.
    pub async fn refresh(&mut self) -> Result<()> {
        let fetched = self.source.fetch(&self.project_id).await;
        match fetched {
            Ok(records) => {
                self.records = records;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to fetch roster for {}: {}", self.project_id, e);
                Err(e)
            }
        }
    }

    /// All cached records, unfiltered.
    pub fn records(&self) -> &[Enrollment] {
        &self.records
    }

    pub fn find(&self, enrollment_id: &str) -> Option<&Enrollment> {
        self.records.iter().find(|r| r.id == enrollment_id)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Sets the search text. Matches participant name or service type,
    /// case-insensitively, against the cached roster only.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Records matching the current search.
    pub fn visible(&self) -> Vec<&Enrollment> {
        let needle = self.query.trim().to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                needle.is_empty()
                    || r.name.to_lowercase().contains(&needle)
                    || r.service_type.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn rows(&self) -> Vec<RosterRow<'_>> {
        self.visible()
            .into_iter()
            .enumerate()
            .map(|(i, enrollment)| RosterRow {
                serial: i + 1,
                enrollment,
                actions: allowed_actions(enrollment.status),
            })
            .collect()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn toggle_view_mode(&mut self) -> ViewMode {
        self.view_mode = match self.view_mode {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
        };
        self.view_mode
    }

    /// The actions for a cached record, or `None` if it is not in the roster.
    pub fn actions_for(&self, enrollment_id: &str) -> Option<&'static [RosterAction]> {
        self.find(enrollment_id).map(|r| allowed_actions(r.status))
    }

    fn require(&self, enrollment_id: &str, action: RosterAction) -> Result<&Enrollment> {
        let record = self.find(enrollment_id).ok_or(AppError::NotFound)?;
        if !allowed_actions(record.status).contains(&action) {
            return Err(AppError::Validation(format!(
                "{:?} is not available for a {} enrollment",
                action, record.status
            )));
        }
        Ok(record)
    }

    /// The record behind the details view.
    pub fn view_details(&self, enrollment_id: &str) -> Result<&Enrollment> {
        self.require(enrollment_id, RosterAction::ViewDetails)
    }

    /// Starts the credit/proof update of an approved enrollment.
    pub fn begin_update(&self, enrollment_id: &str) -> Result<UpdateDraft> {
        let record = self.require(enrollment_id, RosterAction::InitiateUpdate)?;
        Ok(UpdateDraft {
            enrollment_id: record.id.clone(),
            credits: record
                .credits_allocated
                .map(|c| c.to_string())
                .unwrap_or_default(),
            remarks: String::new(),
        })
    }

    /// Approves a pending or rejected enrollment, then refetches.
    pub async fn approve(&mut self, enrollment_id: &str) -> Result<()> {
        self.require(enrollment_id, RosterAction::Approve)?;
        self.decide(enrollment_id, Decision::Approved, None).await
    }

    /// Opens the rejection confirmation for a pending enrollment.
    pub fn open_reject(&mut self, enrollment_id: &str) -> Result<&RejectDialog> {
        self.require(enrollment_id, RosterAction::Reject)?;
        let dialog = self.reject_dialog.insert(RejectDialog {
            enrollment_id: enrollment_id.to_string(),
            remark: String::new(),
        });
        Ok(&*dialog)
    }

    pub fn reject_dialog(&self) -> Option<&RejectDialog> {
        self.reject_dialog.as_ref()
    }

    pub fn set_reject_remark(&mut self, remark: impl Into<String>) {
        if let Some(dialog) = self.reject_dialog.as_mut() {
            dialog.remark = remark.into();
        }
    }

    pub fn cancel_reject(&mut self) {
        self.reject_dialog = None;
    }

    /// Confirms the open rejection.
    ///
    /// A blank or locally refused remark keeps the dialog open and sends
    /// nothing. Otherwise the dialog closes once the request has completed,
    /// whatever its outcome.
    pub async fn confirm_reject(&mut self) -> Result<()> {
        let Some(dialog) = self.reject_dialog.clone() else {
            return Err(AppError::NotFound);
        };

        if dialog.remark.trim().is_empty() {
            self.notifier.notify(Notification::error(REMARK_REQUIRED));
            return Err(AppError::Validation(REMARK_REQUIRED.to_string()));
        }

        let result = self
            .decide(&dialog.enrollment_id, Decision::Rejected, Some(dialog.remark.as_str()))
            .await;
        // The remark is kept for correction when it was refused locally.
        if !matches!(result, Err(AppError::Validation(_))) {
            self.reject_dialog = None;
        }
        result
    }

    async fn decide(&mut self, enrollment_id: &str, decision: Decision, remark: Option<&str>) -> Result<()> {
        if let Err(e) = self
            .actions
            .set_enrollment_status(enrollment_id, decision, remark)
            .await
        {
            if matches!(
                e,
                AppError::Validation(_) | AppError::Unauthorized | AppError::ActionInFlight(_)
            ) {
                self.notifier.notify(e.notification());
            }
            return Err(e);
        }

        // The server owns the status; never patch the cached copy.
        if let Err(e) = self.refresh().await {
            tracing::warn!("⚠️ Roster refetch after {} failed: {}", decision.as_str(), e);
        }
        Ok(())
    }
}

use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle state of a participant's enrollment in a project.
///
/// Any status the API sends that is not one of the known states is treated
/// as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrollmentStatus {
    Pending,
    Approved,
    Rejected,
    ProofSubmitted,
    Completed,
    RejectedByAdmin,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Approved => "approved",
            EnrollmentStatus::Rejected => "rejected",
            EnrollmentStatus::ProofSubmitted => "proof-submitted",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::RejectedByAdmin => "rejected_by_admin",
        }
    }

    /// Terminal from the service provider's point of view.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EnrollmentStatus::Completed | EnrollmentStatus::RejectedByAdmin)
    }

    /// The state a service-provider decision moves this enrollment to, if
    /// the decision is legal here. Later transitions (proof submission,
    /// admin review) happen elsewhere.
    pub fn apply(&self, decision: Decision) -> Option<EnrollmentStatus> {
        match (self, decision) {
            (EnrollmentStatus::Pending, Decision::Approved) => Some(EnrollmentStatus::Approved),
            (EnrollmentStatus::Pending, Decision::Rejected) => Some(EnrollmentStatus::Rejected),
            (EnrollmentStatus::Rejected, Decision::Approved) => Some(EnrollmentStatus::Approved),
            _ => None,
        }
    }
}

impl From<&str> for EnrollmentStatus {
    fn from(s: &str) -> Self {
        match s {
            "approved" => EnrollmentStatus::Approved,
            "rejected" => EnrollmentStatus::Rejected,
            "proof-submitted" => EnrollmentStatus::ProofSubmitted,
            "completed" => EnrollmentStatus::Completed,
            "rejected_by_admin" => EnrollmentStatus::RejectedByAdmin,
            _ => EnrollmentStatus::Pending,
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for EnrollmentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EnrollmentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(EnrollmentStatus::from).unwrap_or(EnrollmentStatus::Pending))
    }
}

/// A service provider's decision on an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// The status value sent to the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
        }
    }

    /// The verb used in user-facing messages.
    pub fn verb(&self) -> &'static str {
        match self {
            Decision::Approved => "approve",
            Decision::Rejected => "reject",
        }
    }
}

/// A participant's enrollment as cached from the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    /// The enrollment identifier.
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub participant_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "serviceType", default)]
    pub service_type: String,
    #[serde(rename = "enrollmentDate", default)]
    pub enrollment_date: String,
    #[serde(rename = "project_enroll_status", alias = "status", default = "pending")]
    pub status: EnrollmentStatus,
    #[serde(rename = "creditsEarned", default)]
    pub credits_earned: Option<f64>,
    #[serde(rename = "creditsAllocated", default)]
    pub credits_allocated: Option<f64>,
}

fn pending() -> EnrollmentStatus {
    EnrollmentStatus::Pending
}

impl Enrollment {
    /// The email shown in the roster, falling back to a placeholder address.
    pub fn display_email(&self) -> String {
        match self.email.as_deref() {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => format!("{}@ecoedu.com", self.id),
        }
    }

    /// The enrollment date as `YYYY-MM-DD`, or the raw value when unparseable.
    pub fn enrollment_day(&self) -> String {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.enrollment_date) {
            return dt.date_naive().to_string();
        }
        if let Ok(day) = NaiveDate::parse_from_str(&self.enrollment_date, "%Y-%m-%d") {
            return day.to_string();
        }
        self.enrollment_date.clone()
    }

    pub fn credits_earned_label(&self) -> String {
        credits_label(self.credits_earned)
    }

    pub fn credits_allocated_label(&self) -> String {
        credits_label(self.credits_allocated)
    }
}

fn credits_label(credits: Option<f64>) -> String {
    credits.map(|c| c.to_string()).unwrap_or_else(|| "N/A".to_string())
}

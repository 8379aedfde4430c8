use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle states of an activity. `pending` never originates here but
/// stays representable for records already present in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Course,
    Project,
    Job,
    Scan,
}

/// Final review outcomes. The override endpoint and the auto reviewer both
/// speak this narrowed type; `update_status` itself stays permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewVerdict {
    Approved,
    Rejected,
}

impl From<ReviewVerdict> for ApplicationStatus {
    fn from(verdict: ReviewVerdict) -> Self {
        match verdict {
            ReviewVerdict::Approved => ApplicationStatus::Approved,
            ReviewVerdict::Rejected => ApplicationStatus::Rejected,
        }
    }
}

/// One entry of the activity collection. Serialized field names are the
/// snapshot document layout; everything but `status` is immutable after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: Uuid,
    pub name: String,
    pub provider: String,
    pub kind: ActivityKind,
    pub applied_date: String,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_file_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_username: Option<String>,
}

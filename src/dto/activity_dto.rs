use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::activity::{ActivityRecord, ApplicationStatus, ReviewVerdict};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivityRecord>,
    pub total: usize,
}

/// Job offer the candidate is applying to, as shown on the analysis page.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JobOffer {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub provider: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvPayload {
    pub file_data: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRequest {
    pub job: JobOffer,
    pub cv: Option<CvPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ReviewVerdict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateResponse {
    pub id: Uuid,
    pub status: ApplicationStatus,
    pub updated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub id: Uuid,
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterResponse {
    pub greeting: String,
    pub body: Vec<String>,
    pub reviewer: String,
    pub organization: String,
}

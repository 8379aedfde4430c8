use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::activity::{ActivityKind, ActivityRecord, ApplicationStatus, ReviewVerdict};
use crate::services::activity_service::ActivityService;
use crate::utils::time;

/// How long the automated reviewer deliberates over a new application.
pub const REVIEW_DELAY: Duration = Duration::from_secs(10);

pub const AI_SYSTEM_PROVIDER: &str = "Voltria AI System";
pub const GUEST_CANDIDATE_NAME: &str = "Khách";
const GENERAL_SCAN_LABEL: &str = "Tổng quát";

/// Typed mutation signals. Every change to the collection flows through
/// `LifecycleService::dispatch`, the review timer's own verdict included.
#[derive(Debug, Clone)]
pub enum LifecycleCommand {
    RecordScan(ScanIntent),
    SubmitApplication(ApplicationIntent),
    Decide { id: Uuid, verdict: ReviewVerdict },
    Remove { id: Uuid },
}

/// Payload for the scan recorded after a successful CV analysis.
#[derive(Debug, Clone)]
pub struct ScanIntent {
    pub target_job: String,
    pub cv_file_content: String,
    pub cv_mime_type: String,
    pub owner_username: Option<String>,
    pub candidate_name: Option<String>,
}

/// Payload for a candidate applying to a suggested job.
#[derive(Debug, Clone)]
pub struct ApplicationIntent {
    pub job_title: String,
    pub job_provider: String,
    pub job_description: Option<String>,
    pub cv_file_content: Option<String>,
    pub cv_mime_type: Option<String>,
    pub owner_username: String,
    pub candidate_name: String,
}

#[derive(Debug, Clone)]
pub enum LifecycleOutcome {
    Created(ActivityRecord),
    StatusChanged {
        id: Uuid,
        status: ApplicationStatus,
        updated: bool,
    },
    Removed {
        id: Uuid,
        removed: bool,
    },
}

#[derive(Clone)]
pub struct LifecycleService {
    activities: ActivityService,
    pending_reviews: Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>,
}

impl LifecycleService {
    pub fn new(activities: ActivityService) -> Self {
        Self {
            activities,
            pending_reviews: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn dispatch(&self, command: LifecycleCommand) -> LifecycleOutcome {
        match command {
            LifecycleCommand::RecordScan(intent) => {
                let record = ActivityRecord {
                    id: Uuid::new_v4(),
                    name: format!("Phân tích CV: {}", scan_label(&intent.target_job)),
                    provider: AI_SYSTEM_PROVIDER.to_string(),
                    kind: ActivityKind::Scan,
                    applied_date: time::applied_date_label(time::now()),
                    status: ApplicationStatus::Approved,
                    description: None,
                    candidate_name: Some(
                        intent
                            .candidate_name
                            .unwrap_or_else(|| GUEST_CANDIDATE_NAME.to_string()),
                    ),
                    cv_file_content: Some(intent.cv_file_content),
                    cv_mime_type: Some(intent.cv_mime_type),
                    owner_username: intent.owner_username,
                };
                tracing::info!(id = %record.id, "CV scan recorded");
                LifecycleOutcome::Created(self.activities.append(record).await)
            }
            LifecycleCommand::SubmitApplication(intent) => {
                let record = ActivityRecord {
                    id: Uuid::new_v4(),
                    name: intent.job_title,
                    provider: intent.job_provider,
                    kind: ActivityKind::Job,
                    applied_date: time::applied_date_label(time::now()),
                    status: ApplicationStatus::Reviewing,
                    description: intent.job_description,
                    candidate_name: Some(intent.candidate_name),
                    cv_file_content: intent.cv_file_content,
                    cv_mime_type: intent.cv_mime_type,
                    owner_username: Some(intent.owner_username),
                };
                let record = self.activities.append(record).await;
                self.schedule_review(record.id);
                tracing::info!(id = %record.id, name = %record.name, "Application submitted, review scheduled");
                LifecycleOutcome::Created(record)
            }
            LifecycleCommand::Decide { id, verdict } => {
                self.cancel_review(id);
                let status = ApplicationStatus::from(verdict);
                let updated = self.activities.update_status(id, status).await;
                if updated {
                    tracing::info!(%id, ?status, "Application decided");
                }
                LifecycleOutcome::StatusChanged { id, status, updated }
            }
            LifecycleCommand::Remove { id } => {
                self.cancel_review(id);
                let removed = self.activities.remove(id).await;
                LifecycleOutcome::Removed { id, removed }
            }
        }
    }

    pub fn has_pending_review(&self, id: Uuid) -> bool {
        self.pending_reviews
            .lock()
            .expect("pending reviews lock poisoned")
            .contains_key(&id)
    }

    /// Arms the auto review for a fresh application. The task deregisters
    /// itself before dispatching its verdict, so a live entry in the map
    /// always refers to a review that can still be aborted.
    fn schedule_review(&self, id: Uuid) {
        let service = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(REVIEW_DELAY).await;
            let verdict = {
                let mut rng = rand::thread_rng();
                [ReviewVerdict::Approved, ReviewVerdict::Rejected]
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or(ReviewVerdict::Rejected)
            };
            service
                .pending_reviews
                .lock()
                .expect("pending reviews lock poisoned")
                .remove(&id);
            let _ = service
                .dispatch(LifecycleCommand::Decide { id, verdict })
                .await;
        });
        self.pending_reviews
            .lock()
            .expect("pending reviews lock poisoned")
            .insert(id, handle);
    }

    /// Aborts a still-pending auto review, if any. Called on manual
    /// overrides and deletes so the reviewer cannot overwrite them later.
    fn cancel_review(&self, id: Uuid) {
        let handle = self
            .pending_reviews
            .lock()
            .expect("pending reviews lock poisoned")
            .remove(&id);
        if let Some(handle) = handle {
            handle.abort();
            tracing::info!(%id, "Pending auto review cancelled");
        }
    }
}

fn scan_label(target_job: &str) -> &str {
    let trimmed = target_job.trim();
    if trimmed.is_empty() {
        GENERAL_SCAN_LABEL
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::snapshot::MemorySnapshot;

    fn apply_intent(owner: &str) -> ApplicationIntent {
        ApplicationIntent {
            job_title: "Junior Backend Developer".to_string(),
            job_provider: "Tập đoàn công nghệ Viettel".to_string(),
            job_description: Some("Phát triển API nội bộ".to_string()),
            cv_file_content: None,
            cv_mime_type: None,
            owner_username: owner.to_string(),
            candidate_name: "Ứng viên Test".to_string(),
        }
    }

    async fn service() -> (LifecycleService, ActivityService) {
        let activities = ActivityService::open(Arc::new(MemorySnapshot::new())).await;
        (LifecycleService::new(activities.clone()), activities)
    }

    fn created(outcome: LifecycleOutcome) -> ActivityRecord {
        match outcome {
            LifecycleOutcome::Created(record) => record,
            other => panic!("expected Created, got {:?}", other),
        }
    }

    fn hr_user() -> crate::models::user::User {
        crate::models::user::User {
            username: "nhipham".to_string(),
            name: "Phạm Tuyết Nhi".to_string(),
            role: crate::models::user::Role::Hr,
        }
    }

    #[tokio::test]
    async fn scan_enters_approved_without_a_timer() {
        let (lifecycle, _) = service().await;
        let record = created(
            lifecycle
                .dispatch(LifecycleCommand::RecordScan(ScanIntent {
                    target_job: "   ".to_string(),
                    cv_file_content: "aGVsbG8=".to_string(),
                    cv_mime_type: "image/png".to_string(),
                    owner_username: None,
                    candidate_name: None,
                }))
                .await,
        );

        assert_eq!(record.status, ApplicationStatus::Approved);
        assert_eq!(record.kind, ActivityKind::Scan);
        assert_eq!(record.name, "Phân tích CV: Tổng quát");
        assert_eq!(record.provider, AI_SYSTEM_PROVIDER);
        assert_eq!(record.candidate_name.as_deref(), Some(GUEST_CANDIDATE_NAME));
        assert!(record.owner_username.is_none());
        assert!(!lifecycle.has_pending_review(record.id));
    }

    #[tokio::test(start_paused = true)]
    async fn application_is_decided_after_the_review_delay() {
        let (lifecycle, activities) = service().await;
        let record = created(
            lifecycle
                .dispatch(LifecycleCommand::SubmitApplication(apply_intent("test")))
                .await,
        );

        assert_eq!(record.status, ApplicationStatus::Reviewing);
        assert!(lifecycle.has_pending_review(record.id));

        tokio::time::sleep(REVIEW_DELAY + Duration::from_millis(50)).await;

        let viewer = crate::models::user::User {
            username: "test".to_string(),
            name: "Ứng viên Test".to_string(),
            role: crate::models::user::Role::Candidate,
        };
        let decided = activities
            .find_visible(Some(&viewer), record.id)
            .expect("record still present");
        assert!(matches!(
            decided.status,
            ApplicationStatus::Approved | ApplicationStatus::Rejected
        ));
        assert!(!lifecycle.has_pending_review(record.id));
    }

    #[tokio::test(start_paused = true)]
    async fn both_verdicts_occur_over_repeated_reviews() {
        let (lifecycle, activities) = service().await;
        for _ in 0..40 {
            lifecycle
                .dispatch(LifecycleCommand::SubmitApplication(apply_intent("test")))
                .await;
        }

        tokio::time::sleep(REVIEW_DELAY + Duration::from_millis(50)).await;

        let hr = hr_user();
        let statuses: Vec<ApplicationStatus> = activities
            .visible_to(Some(&hr))
            .into_iter()
            .map(|r| r.status)
            .collect();
        assert!(statuses.contains(&ApplicationStatus::Approved));
        assert!(statuses.contains(&ApplicationStatus::Rejected));
        assert!(!statuses.contains(&ApplicationStatus::Reviewing));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_override_cancels_the_pending_review() {
        let (lifecycle, activities) = service().await;
        let record = created(
            lifecycle
                .dispatch(LifecycleCommand::SubmitApplication(apply_intent("test")))
                .await,
        );

        tokio::time::sleep(Duration::from_secs(5)).await;
        lifecycle
            .dispatch(LifecycleCommand::Decide {
                id: record.id,
                verdict: ReviewVerdict::Approved,
            })
            .await;
        assert!(!lifecycle.has_pending_review(record.id));

        // Past the auto-review deadline the manual verdict must still stand.
        tokio::time::sleep(REVIEW_DELAY).await;

        let hr = hr_user();
        let decided = activities
            .find_visible(Some(&hr), record.id)
            .expect("record still present");
        assert_eq!(decided.status, ApplicationStatus::Approved);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_cancels_the_pending_review() {
        let (lifecycle, activities) = service().await;
        let record = created(
            lifecycle
                .dispatch(LifecycleCommand::SubmitApplication(apply_intent("test")))
                .await,
        );

        let outcome = lifecycle
            .dispatch(LifecycleCommand::Remove { id: record.id })
            .await;
        assert!(matches!(
            outcome,
            LifecycleOutcome::Removed { removed: true, .. }
        ));
        assert!(!lifecycle.has_pending_review(record.id));

        tokio::time::sleep(REVIEW_DELAY + Duration::from_millis(50)).await;
        let hr = hr_user();
        assert!(activities.visible_to(Some(&hr)).is_empty());
    }

    #[tokio::test]
    async fn decide_and_remove_on_unknown_ids_are_no_ops() {
        let (lifecycle, _) = service().await;
        let ghost = Uuid::new_v4();

        let outcome = lifecycle
            .dispatch(LifecycleCommand::Decide {
                id: ghost,
                verdict: ReviewVerdict::Rejected,
            })
            .await;
        assert!(matches!(
            outcome,
            LifecycleOutcome::StatusChanged { updated: false, .. }
        ));

        let outcome = lifecycle
            .dispatch(LifecycleCommand::Remove { id: ghost })
            .await;
        assert!(matches!(
            outcome,
            LifecycleOutcome::Removed { removed: false, .. }
        ));
    }
}

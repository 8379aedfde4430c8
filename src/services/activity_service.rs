use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::activity::{ActivityRecord, ApplicationStatus};
use crate::models::user::{Role, User};
use crate::storage::snapshot::SnapshotBackend;

/// The activity collection. Ordered most recent first, held in memory and
/// mirrored into the snapshot slot on every mutation.
#[derive(Clone)]
pub struct ActivityService {
    records: Arc<RwLock<Vec<ActivityRecord>>>,
    snapshot: Arc<dyn SnapshotBackend>,
    slot_lock: Arc<Mutex<()>>,
}

impl ActivityService {
    /// Loads the collection from the snapshot slot. A missing slot or one
    /// that does not parse starts an empty collection; opening never fails
    /// on slot contents.
    pub async fn open(snapshot: Arc<dyn SnapshotBackend>) -> Self {
        let records = match snapshot.read().await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<ActivityRecord>>(&bytes) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!("Activity snapshot is not valid JSON, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read activity snapshot, starting empty: {}", e);
                Vec::new()
            }
        };

        Self {
            records: Arc::new(RwLock::new(records)),
            snapshot,
            slot_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Inserts at the front. Callers guarantee id uniqueness; no further
    /// validation happens here.
    pub async fn append(&self, record: ActivityRecord) -> ActivityRecord {
        {
            let mut guard = self.records.write().expect("activity store lock poisoned");
            guard.insert(0, record.clone());
        }
        self.persist().await;
        record
    }

    /// Rewrites the status of the matching record. Unknown ids are a no-op
    /// and return `false`.
    pub async fn update_status(&self, id: Uuid, status: ApplicationStatus) -> bool {
        let updated = {
            let mut guard = self.records.write().expect("activity store lock poisoned");
            match guard.iter_mut().find(|r| r.id == id) {
                Some(record) => {
                    record.status = status;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.persist().await;
        }
        updated
    }

    /// Removes the matching record. Unknown ids are a no-op and return
    /// `false`.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = {
            let mut guard = self.records.write().expect("activity store lock poisoned");
            let before = guard.len();
            guard.retain(|r| r.id != id);
            guard.len() != before
        };
        if removed {
            self.persist().await;
        }
        removed
    }

    /// Role-scoped projection, order preserved. HR sees everything, a
    /// candidate their own records, a guest the ownerless ones.
    pub fn visible_to(&self, viewer: Option<&User>) -> Vec<ActivityRecord> {
        let guard = self.records.read().expect("activity store lock poisoned");
        match viewer {
            Some(user) if user.role == Role::Hr => guard.clone(),
            Some(user) => guard
                .iter()
                .filter(|r| r.owner_username.as_deref() == Some(user.username.as_str()))
                .cloned()
                .collect(),
            None => guard
                .iter()
                .filter(|r| r.owner_username.is_none())
                .cloned()
                .collect(),
        }
    }

    pub fn find_visible(&self, viewer: Option<&User>, id: Uuid) -> Option<ActivityRecord> {
        self.visible_to(viewer).into_iter().find(|r| r.id == id)
    }

    /// Serializes the whole collection into the slot. Writers queue on the
    /// slot lock and read the collection only once they hold it, so the
    /// last write to land always carries the newest state. Fire and forget:
    /// a failed write is logged and the in-memory mutation stands.
    async fn persist(&self) {
        let _slot = self.slot_lock.lock().await;
        let bytes = {
            let guard = self.records.read().expect("activity store lock poisoned");
            match serde_json::to_vec(&*guard) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!("Failed to serialize activity snapshot: {}", e);
                    return;
                }
            }
        };
        if let Err(e) = self.snapshot.write(&bytes).await {
            tracing::error!("Failed to write activity snapshot: {}", e);
        }
    }
}

//! Document store backed by the local SQLite database.

use super::{DocumentStore, Snapshot, Subscription};
use crate::db::Database;
use crate::error::StoreError;
use crate::types::{NewTask, Precondition, TaskPatch};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, warn};

struct Subscriber {
    user_email: String,
    tx: watch::Sender<Snapshot>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<u64, Subscriber>,
    /// Last `data_version` seen by `sync_external`.
    data_version: Option<i64>,
}

/// SQLite-backed store that publishes a fresh per-user snapshot after every write.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
    registry: Arc<Mutex<Registry>>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Number of live subscriptions, across all users.
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().unwrap().subscribers.len()
    }

    /// Push the current result set to every subscriber of `user_email`.
    fn publish(&self, user_email: &str) -> Result<(), StoreError> {
        let senders: Vec<watch::Sender<Snapshot>> = {
            let registry = self.registry.lock().unwrap();
            registry
                .subscribers
                .values()
                .filter(|s| s.user_email == user_email)
                .map(|s| s.tx.clone())
                .collect()
        };
        if senders.is_empty() {
            return Ok(());
        }

        let snapshot = Snapshot {
            user_email: user_email.to_string(),
            tasks: self.db.list_tasks_for_user(user_email)?,
        };
        debug!(
            user = %user_email,
            tasks = snapshot.tasks.len(),
            subscribers = senders.len(),
            "Publishing snapshot"
        );
        for tx in senders {
            tx.send_replace(snapshot.clone());
        }
        Ok(())
    }

    /// Republish to every subscriber if another connection has committed
    /// since the last call. Returns true if snapshots were sent.
    pub fn sync_external(&self) -> Result<bool, StoreError> {
        let version = self.db.data_version()?;
        let users: Vec<String> = {
            let mut registry = self.registry.lock().unwrap();
            let previous = registry.data_version.replace(version);
            if previous.is_none_or(|v| v == version) {
                return Ok(false);
            }
            let mut users: Vec<String> = registry
                .subscribers
                .values()
                .map(|s| s.user_email.clone())
                .collect();
            users.sort();
            users.dedup();
            users
        };
        debug!(version, users = users.len(), "External change detected");
        for user in &users {
            self.publish(user)?;
        }
        Ok(!users.is_empty())
    }

    /// Publish after a write. The write already succeeded, so a failed
    /// re-read is logged rather than reported as a failed mutation.
    fn publish_after_write(&self, user_email: &str) {
        if let Err(e) = self.publish(user_email) {
            warn!(user = %user_email, error = %e, "Failed to publish snapshot");
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn subscribe(&self, user_email: &str) -> Result<Subscription, StoreError> {
        let initial = Snapshot {
            user_email: user_email.to_string(),
            tasks: self.db.list_tasks_for_user(user_email)?,
        };
        let (tx, rx) = watch::channel(initial);

        let id = {
            let mut registry = self.registry.lock().unwrap();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.subscribers.insert(
                id,
                Subscriber {
                    user_email: user_email.to_string(),
                    tx,
                },
            );
            id
        };
        debug!(user = %user_email, subscription = id, "Subscribed");

        let registry = Arc::downgrade(&self.registry);
        Ok(Subscription::new(user_email, rx, move || {
            if let Some(registry) = registry.upgrade() {
                registry.lock().unwrap().subscribers.remove(&id);
            }
        }))
    }

    async fn insert(&self, task: NewTask) -> Result<String, StoreError> {
        let task = self.db.insert_task(task)?;
        debug!(task = %task.id, user = %task.user_email, "Inserted task");
        self.publish_after_write(&task.user_email);
        Ok(task.id)
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<(), StoreError> {
        let task = self.db.update_task(id, &patch, None)?;
        debug!(task = %id, fields = ?patch.field_names(), "Updated task");
        self.publish_after_write(&task.user_email);
        Ok(())
    }

    async fn update_if(
        &self,
        id: &str,
        precondition: Precondition,
        patch: TaskPatch,
    ) -> Result<(), StoreError> {
        let task = self.db.update_task(id, &patch, Some(precondition))?;
        debug!(task = %id, fields = ?patch.field_names(), ?precondition, "Conditionally updated task");
        self.publish_after_write(&task.user_email);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let owner = self.db.delete_task(id)?;
        debug!(task = %id, "Deleted task");
        self.publish_after_write(&owner);
        Ok(())
    }
}

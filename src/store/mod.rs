//! Document store contract and change feed.
//!
//! The store is the single source of truth for tasks. Mutations go out as
//! independent remote calls and their effect comes back only through the
//! subscription's snapshot stream, never through the call's return value.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreError;
use crate::types::{NewTask, Precondition, Task, TaskPatch};
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

/// Full result set for one user at a point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub user_email: String,
    pub tasks: Vec<Task>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Subscribe to every task owned by `user_email`.
    async fn subscribe(&self, user_email: &str) -> Result<Subscription, StoreError>;

    /// Insert a record and return the id the store assigned.
    async fn insert(&self, task: NewTask) -> Result<String, StoreError>;

    /// Merge fields into an existing record.
    async fn update(&self, id: &str, patch: TaskPatch) -> Result<(), StoreError>;

    /// Merge fields only if `precondition` holds against the stored record.
    async fn update_if(
        &self,
        id: &str,
        precondition: Precondition,
        patch: TaskPatch,
    ) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

type CancelHook = Box<dyn FnOnce() + Send + Sync>;

/// Live, cancellable stream of snapshots for one user.
///
/// Dropping the subscription cancels it.
pub struct Subscription {
    user_email: String,
    rx: watch::Receiver<Snapshot>,
    on_cancel: Option<CancelHook>,
}

impl Subscription {
    pub fn new(
        user_email: impl Into<String>,
        rx: watch::Receiver<Snapshot>,
        on_cancel: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            user_email: user_email.into(),
            rx,
            on_cancel: Some(Box::new(on_cancel)),
        }
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    /// Latest snapshot, marking it as seen.
    pub fn current(&mut self) -> Snapshot {
        self.rx.borrow_and_update().clone()
    }

    /// The latest snapshot if one arrived since the last read.
    pub fn poll_latest(&mut self) -> Option<Snapshot> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.current()),
            _ => None,
        }
    }

    /// Wait for the next snapshot.
    pub async fn changed(&mut self) -> Result<Snapshot, StoreError> {
        self.rx
            .changed()
            .await
            .map_err(|_| StoreError::Unavailable("change stream closed".to_string()))?;
        Ok(self.current())
    }

    /// Stop receiving snapshots.
    pub fn cancel(self) {
        debug!(user = %self.user_email, "Cancelling subscription");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hook) = self.on_cancel.take() {
            hook();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("user_email", &self.user_email)
            .finish_non_exhaustive()
    }
}

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRow;

#[derive(Default)]
struct Entries {
    by_id: HashMap<Uuid, ResumeRow>,
    /// Insertion order, used to break `created_at` ties.
    order: Vec<Uuid>,
}

/// Process-local registry of confirmed resumes. Lives as long as the process; nothing is
/// persisted.
///
/// Concurrent reads share the lock; inserts are serialized.
#[derive(Default)]
pub struct ResumeRegistry {
    entries: RwLock<Entries>,
}

impl ResumeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `AppError::Conflict` if the id is already registered.
    pub async fn insert(&self, row: ResumeRow) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        if entries.by_id.contains_key(&row.id) {
            return Err(AppError::Conflict(format!(
                "Resume {} already registered",
                row.id
            )));
        }
        entries.order.push(row.id);
        entries.by_id.insert(row.id, row);
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Option<ResumeRow> {
        self.entries.read().await.by_id.get(&id).cloned()
    }

    /// Newest `created_at` first; equal timestamps keep insertion order.
    pub async fn list_all(&self) -> Vec<ResumeRow> {
        let entries = self.entries.read().await;
        let mut rows: Vec<ResumeRow> = entries
            .order
            .iter()
            .filter_map(|id| entries.by_id.get(id).cloned())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.order.len()
    }
}

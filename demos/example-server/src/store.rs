use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// In-memory table keyed by a generated id.
pub struct Repository<T> {
    rows: RwLock<BTreeMap<u64, T>>,
    next_id: AtomicU64,
}

impl<T: Clone> Repository<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn insert_with(&self, build: impl FnOnce(u64) -> T) -> T {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let row = build(id);
        self.rows.write().await.insert(id, row.clone());
        row
    }

    pub async fn get(&self, id: u64) -> Option<T> {
        self.rows.read().await.get(&id).cloned()
    }

    pub async fn all(&self) -> Vec<T> {
        self.rows.read().await.values().cloned().collect()
    }

    pub async fn replace(&self, id: u64, row: T) -> Option<T> {
        let mut rows = self.rows.write().await;
        let slot = rows.get_mut(&id)?;
        *slot = row.clone();
        Some(row)
    }

    pub async fn remove(&self, id: u64) -> Option<T> {
        self.rows.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

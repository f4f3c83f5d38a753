//! History collaborator (spec §6): records every executed request/response
//! pair so a workbench UI can let a user browse or replay past runs. The
//! execution core only depends on the [`HistoryStore`] trait; a host
//! application supplies a durable implementation (SQLite, a flat file) and
//! gets the in-memory [`InMemoryHistoryStore`] here for tests and as a
//! reference implementation of the ordering contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history entry {0} not found")]
    NotFound(Uuid),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub request_name: String,
    pub method: String,
    pub url: String,
    pub status_code: u32,
    pub duration_ms: u64,
    /// Redacted request/response snapshot, already stripped of secret
    /// values by the caller before it reaches the store.
    pub snapshot: serde_json::Value,
}

/// A query over stored history: all fields optional, `None` means
/// unfiltered on that dimension.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub request_name: Option<String>,
    pub limit: Option<usize>,
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn record(&self, entry: HistoryEntry) -> Result<(), HistoryError>;
    async fn get(&self, id: Uuid) -> Result<HistoryEntry, HistoryError>;

    /// Returns entries matching `query`, newest first. Entries recorded in
    /// the same instant (both share `recorded_at`) are ordered by the
    /// larger `id` first — `Uuid` v4 has no inherent chronology, so this is
    /// purely a deterministic tiebreak, not a secondary timestamp.
    async fn list(&self, query: HistoryQuery) -> Result<Vec<HistoryEntry>, HistoryError>;

    async fn clear(&self) -> Result<(), HistoryError>;
}

#[derive(Default)]
pub struct InMemoryHistoryStore {
    entries: std::sync::RwLock<Vec<HistoryEntry>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn record(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        self.entries.write().expect("history lock poisoned").push(entry);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<HistoryEntry, HistoryError> {
        self.entries
            .read()
            .expect("history lock poisoned")
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(HistoryError::NotFound(id))
    }

    async fn list(&self, query: HistoryQuery) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut entries: Vec<HistoryEntry> = self
            .entries
            .read()
            .expect("history lock poisoned")
            .iter()
            .filter(|e| {
                query
                    .request_name
                    .as_ref()
                    .is_none_or(|name| &e.request_name == name)
            })
            .cloned()
            .collect();

        entries.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then_with(|| b.id.cmp(&a.id)));

        if let Some(limit) = query.limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    async fn clear(&self) -> Result<(), HistoryError> {
        self.entries.write().expect("history lock poisoned").clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: Uuid, at: DateTime<Utc>, name: &str) -> HistoryEntry {
        HistoryEntry {
            id,
            recorded_at: at,
            request_name: name.to_string(),
            method: "GET".to_string(),
            url: "https://x".to_string(),
            status_code: 200,
            duration_ms: 10,
            snapshot: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn list_orders_newest_first() {
        let store = InMemoryHistoryStore::new();
        let t0 = Utc::now();
        store.record(entry(Uuid::new_v4(), t0, "a")).await.unwrap();
        store
            .record(entry(Uuid::new_v4(), t0 + chrono::Duration::seconds(1), "b"))
            .await
            .unwrap();

        let entries = store.list(HistoryQuery::default()).await.unwrap();
        assert_eq!(entries[0].request_name, "b");
        assert_eq!(entries[1].request_name, "a");
    }

    #[tokio::test]
    async fn same_timestamp_breaks_tie_on_larger_id() {
        let store = InMemoryHistoryStore::new();
        let t0 = Utc::now();
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        store.record(entry(low, t0, "a")).await.unwrap();
        store.record(entry(high, t0, "b")).await.unwrap();

        let entries = store.list(HistoryQuery::default()).await.unwrap();
        assert_eq!(entries[0].id, high);
        assert_eq!(entries[1].id, low);
    }

    #[tokio::test]
    async fn list_filters_by_request_name_and_respects_limit() {
        let store = InMemoryHistoryStore::new();
        let t0 = Utc::now();
        store.record(entry(Uuid::new_v4(), t0, "login")).await.unwrap();
        store.record(entry(Uuid::new_v4(), t0, "login")).await.unwrap();
        store.record(entry(Uuid::new_v4(), t0, "other")).await.unwrap();

        let entries = store
            .list(HistoryQuery {
                request_name: Some("login".to_string()),
                limit: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].request_name, "login");
    }

    #[tokio::test]
    async fn get_missing_id_returns_not_found() {
        let store = InMemoryHistoryStore::new();
        let err = store.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, HistoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let store = InMemoryHistoryStore::new();
        store.record(entry(Uuid::new_v4(), Utc::now(), "a")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.list(HistoryQuery::default()).await.unwrap().is_empty());
    }
}

//! Collection store.
//!
//! Every collection is a JSON array that is read and replaced as a whole.
//! Backends only move raw text; decoding rules live in the trait's provided
//! methods so every backend treats a missing or corrupt collection the same
//! way (as empty).

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

use crate::db::DB;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Workouts,
    WorkoutHistory,
    Measurements,
    Meals,
}

impl Collection {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Workouts => "workouts",
            Self::WorkoutHistory => "workoutHistory",
            Self::Measurements => "measurements",
            Self::Meals => "meals",
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait PersistentStore {
    async fn read_raw(&self, name: &str) -> Result<Option<String>>;

    async fn write_raw(&self, name: &str, body: String) -> Result<()>;

    /// Empty when the collection is absent or its content is not a JSON array.
    async fn read_collection(&self, name: &str) -> Result<Vec<Value>> {
        let Some(body) = self.read_raw(name).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Value>>(&body) {
            Ok(docs) => Ok(docs),
            Err(e) => {
                warn!(collection = name, error = %e, "unparsable collection, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Replaces the whole collection.
    async fn write_collection(&self, name: &str, docs: &[Value]) -> Result<()> {
        let body = serde_json::to_string(docs)?;
        self.write_raw(name, body).await
    }
}

/// SQLite-backed store, one row per collection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DB,
}

impl SqliteStore {
    pub fn new(pool: DB) -> Self {
        Self { pool }
    }
}

impl PersistentStore for SqliteStore {
    async fn read_raw(&self, name: &str) -> Result<Option<String>> {
        let body = sqlx::query_scalar::<_, String>("SELECT body FROM collections WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(body)
    }

    async fn write_raw(&self, name: &str, body: String) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO collections (name, body) VALUES (?1, ?2)
            ON CONFLICT(name) DO UPDATE SET body = excluded.body
            "#,
        )
        .bind(name)
        .bind(body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, String>>,
}

impl PersistentStore for MemoryStore {
    async fn read_raw(&self, name: &str) -> Result<Option<String>> {
        let map = self.collections.lock().unwrap_or_else(|p| p.into_inner());
        Ok(map.get(name).cloned())
    }

    async fn write_raw(&self, name: &str, body: String) -> Result<()> {
        let mut map = self.collections.lock().unwrap_or_else(|p| p.into_inner());
        map.insert(name.to_string(), body);
        Ok(())
    }
}

/// Decodes every document of `collection`, skipping ones that do not fit `T`.
pub async fn load<T, S>(store: &S, collection: Collection) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    S: PersistentStore,
{
    let docs = store.read_collection(collection.key()).await?;
    let items = docs
        .into_iter()
        .enumerate()
        .filter_map(|(idx, doc)| match serde_json::from_value(doc) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(collection = collection.key(), idx, error = %e, "skipping undecodable document");
                None
            }
        })
        .collect();
    Ok(items)
}

/// Read-modify-write append. Works on raw JSON so documents this build
/// cannot decode survive the rewrite.
pub async fn append<T, S>(store: &S, collection: Collection, item: &T) -> Result<()>
where
    T: Serialize,
    S: PersistentStore,
{
    let mut docs = store.read_collection(collection.key()).await?;
    docs.push(serde_json::to_value(item)?);
    store.write_collection(collection.key(), &docs).await
}

/// Drops every document for which `keep` is false. Returns how many went.
pub async fn retain<S, F>(store: &S, collection: Collection, keep: F) -> Result<usize>
where
    S: PersistentStore,
    F: Fn(&Value) -> bool,
{
    let mut docs = store.read_collection(collection.key()).await?;
    let before = docs.len();
    docs.retain(|d| keep(d));
    let removed = before - docs.len();

    if removed > 0 {
        store.write_collection(collection.key(), &docs).await?;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Measurement;
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn absent_and_corrupt_collections_read_empty() {
        let store = MemoryStore::default();
        assert!(store.read_collection("meals").await.unwrap().is_empty());

        store.write_raw("meals", "{not json".into()).await.unwrap();
        assert!(store.read_collection("meals").await.unwrap().is_empty());

        store.write_raw("meals", r#"{"an":"object"}"#.into()).await.unwrap();
        assert!(store.read_collection("meals").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_replaces_whole_collection() {
        let store = MemoryStore::default();
        store.write_collection("workouts", &[json!(1), json!(2)]).await.unwrap();
        store.write_collection("workouts", &[json!(3)]).await.unwrap();
        assert_eq!(store.read_collection("workouts").await.unwrap(), vec![json!(3)]);
    }

    #[tokio::test]
    async fn append_keeps_documents_it_cannot_decode() {
        let store = MemoryStore::default();
        store
            .write_collection(Collection::Measurements.key(), &[json!({"legacy": true})])
            .await
            .unwrap();

        let m = Measurement::new(Utc::now(), 81.2, None).unwrap();
        append(&store, Collection::Measurements, &m).await.unwrap();

        assert_eq!(store.read_collection("measurements").await.unwrap().len(), 2);
        let decoded: Vec<Measurement> = load(&store, Collection::Measurements).await.unwrap();
        assert_eq!(decoded, vec![m]);
    }

    #[tokio::test]
    async fn retain_by_predicate() {
        let store = MemoryStore::default();
        store
            .write_collection("workouts", &[json!({"id": 1}), json!({"id": 2})])
            .await
            .unwrap();

        let removed = retain(&store, Collection::Workouts, |d| d["id"] != json!(1)).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.read_collection("workouts").await.unwrap(), vec![json!({"id": 2})]);
    }

    #[tokio::test]
    async fn sqlite_store_round_trips_collections() {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::db::open(&dir.path().join("nested").join("fit.db")).await.unwrap();
        let store = SqliteStore::new(pool);

        assert!(store.read_collection("workoutHistory").await.unwrap().is_empty());
        store.write_collection("workoutHistory", &[json!({"name": "Legs"})]).await.unwrap();
        store.write_collection("workoutHistory", &[json!({"name": "Arms"})]).await.unwrap();

        assert_eq!(
            store.read_collection("workoutHistory").await.unwrap(),
            vec![json!({"name": "Arms"})]
        );
    }
}

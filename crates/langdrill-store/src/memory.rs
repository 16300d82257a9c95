//! In-process store backed by a single lock.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use langdrill_core::error::StoreError;
use langdrill_core::model::{Attempt, ExerciseKind, Progress};
use langdrill_core::traits::ProgressStore;

#[derive(Default)]
struct Tables {
    progress: BTreeMap<(String, ExerciseKind), Progress>,
    attempts: Vec<Attempt>,
}

/// Keeps everything in memory; contents are lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total attempts across all users.
    pub fn attempt_count(&self) -> usize {
        self.tables.read().attempts.len()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn load_or_init(
        &self,
        user_id: &str,
        exercise: ExerciseKind,
    ) -> Result<Progress, StoreError> {
        let mut tables = self.tables.write();
        let record = tables
            .progress
            .entry((user_id.to_string(), exercise))
            .or_insert_with(|| Progress::new(user_id, exercise, Utc::now()));
        Ok(record.clone())
    }

    async fn get(
        &self,
        user_id: &str,
        exercise: ExerciseKind,
    ) -> Result<Option<Progress>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .progress
            .get(&(user_id.to_string(), exercise))
            .cloned())
    }

    async fn list_progress(&self, user_id: &str) -> Result<Vec<Progress>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn commit_attempt(
        &self,
        attempt: &Attempt,
        progress: &Progress,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        tables.attempts.push(attempt.clone());
        tables.progress.insert(
            (progress.user_id.clone(), progress.exercise),
            progress.clone(),
        );
        Ok(())
    }

    async fn list_attempts(
        &self,
        user_id: &str,
        exercise: ExerciseKind,
    ) -> Result<Vec<Attempt>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id && a.exercise == exercise)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_or_init_is_idempotent() {
        let store = MemoryStore::new();
        let first = store.load_or_init("u1", ExerciseKind::Speech).await.unwrap();
        let second = store.load_or_init("u1", ExerciseKind::Speech).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.list_progress("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let store = MemoryStore::new();
        store.load_or_init("a", ExerciseKind::Speech).await.unwrap();
        store.load_or_init("b", ExerciseKind::Prepositions).await.unwrap();
        let a = store.list_progress("a").await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].exercise, ExerciseKind::Speech);
        assert!(store.get("a", ExerciseKind::Prepositions).await.unwrap().is_none());
        assert_eq!(store.attempt_count(), 0);
    }
}

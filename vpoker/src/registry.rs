//! Concurrency-safe keyed registries for users and tables.
//!
//! A [`Registry`] is an `RwLock`-guarded ordered map. Lookups share the
//! lock, while [`Registry::set`] and [`Registry::update`] take it
//! exclusively, so an in-place update is never observed half done. Each
//! registry owns its lock; the user and table registries never contend
//! with each other or with the per-table locks nested inside tables.
//!
//! Registries are constructed once at process start and handed to every
//! component that needs them:
//!
//! ```
//! use std::sync::Arc;
//! use vpoker::registry::{TableRegistry, UserRegistry};
//!
//! let users = Arc::new(UserRegistry::new());
//! let tables = Arc::new(TableRegistry::new());
//! # let _ = (users, tables);
//! ```

use std::{collections::BTreeMap, fmt::Debug, sync::Arc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::table::{
    entities::{TableId, User, UserId},
    state::Table,
};

/// Registry errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No entry under the requested key
    #[error("no entry for key {0}")]
    NotFound(String),
}

/// Keyed map guarded by a single registry-wide lock.
pub struct Registry<K, V> {
    entries: RwLock<BTreeMap<K, V>>,
}

/// Users by id
pub type UserRegistry = Registry<UserId, User>;

/// Live tables by id
pub type TableRegistry = Registry<TableId, Arc<Table>>;

impl<K, V> Registry<K, V>
where
    K: Ord + Clone + Debug,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Build a registry from previously exported records.
    pub fn from_records<I>(records: I, key: impl Fn(&V) -> K) -> Self
    where
        I: IntoIterator<Item = V>,
    {
        let entries = records.into_iter().map(|v| (key(&v), v)).collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.entries.read().await.get(key).cloned()
    }

    /// Insert or replace.
    pub async fn set(&self, key: K, value: V) {
        self.entries.write().await.insert(key, value);
    }

    /// Apply `f` to the stored entry while holding the registry
    /// exclusively.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or [`RegistryError::NotFound`] when
    /// `key` is absent (in which case `f` is never called).
    pub async fn update<T, E, F>(&self, key: &K, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut V) -> Result<T, E>,
        E: From<RegistryError>,
    {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(key)
            .ok_or_else(|| RegistryError::NotFound(format!("{key:?}")))?;
        f(entry)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// All values ordered by key.
    pub async fn values(&self) -> Vec<V> {
        self.entries.read().await.values().cloned().collect()
    }

    /// Insert many entries at once, replacing existing keys.
    pub async fn extend<I>(&self, records: I, key: impl Fn(&V) -> K)
    where
        I: IntoIterator<Item = V>,
    {
        let mut entries = self.entries.write().await;
        for value in records {
            entries.insert(key(&value), value);
        }
    }
}

impl<K, V> Default for Registry<K, V>
where
    K: Ord + Clone + Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(name: &str) -> User {
        User::new(Uuid::new_v4(), name, Utc::now())
    }

    #[tokio::test]
    async fn test_get_set_len() {
        let users = UserRegistry::new();
        let alice = user("alice");

        assert!(users.is_empty().await);
        assert_eq!(users.get(&alice.id).await, None);

        users.set(alice.id, alice.clone()).await;
        assert_eq!(users.len().await, 1);
        assert_eq!(users.get(&alice.id).await, Some(alice.clone()));

        // Replace under the same key
        let renamed = User {
            name: "alicia".to_string(),
            ..alice.clone()
        };
        users.set(alice.id, renamed).await;
        assert_eq!(users.len().await, 1);
        assert_eq!(users.get(&alice.id).await.unwrap().name, "alicia");
    }

    #[tokio::test]
    async fn test_update_in_place() {
        let users = UserRegistry::new();
        let alice = user("alice");
        users.set(alice.id, alice.clone()).await;

        let name = users
            .update(&alice.id, |u| -> Result<String, RegistryError> {
                u.name = "bob".to_string();
                Ok(u.name.clone())
            })
            .await
            .unwrap();

        assert_eq!(name, "bob");
        assert_eq!(users.get(&alice.id).await.unwrap().name, "bob");
    }

    #[tokio::test]
    async fn test_update_missing_key_is_not_found() {
        let users = UserRegistry::new();
        let mut called = false;

        let result = users
            .update(&Uuid::new_v4(), |_| -> Result<(), RegistryError> {
                called = true;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(RegistryError::NotFound(_))));
        assert!(!called);
    }

    #[tokio::test]
    async fn test_update_propagates_closure_error() {
        #[derive(Debug, PartialEq)]
        enum Rejected {
            Empty,
            Registry,
        }
        impl From<RegistryError> for Rejected {
            fn from(_: RegistryError) -> Self {
                Rejected::Registry
            }
        }

        let users = UserRegistry::new();
        let alice = user("alice");
        users.set(alice.id, alice.clone()).await;

        let result = users.update(&alice.id, |_| Err::<(), _>(Rejected::Empty)).await;
        assert_eq!(result, Err(Rejected::Empty));
        assert_eq!(users.get(&alice.id).await, Some(alice));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_do_not_lose_writes() {
        let users = Arc::new(UserRegistry::new());
        let alice = User::new(Uuid::new_v4(), "", Utc::now());
        users.set(alice.id, alice.clone()).await;

        let mut handles = Vec::new();
        for _ in 0..50 {
            let users = users.clone();
            let id = alice.id;
            handles.push(tokio::spawn(async move {
                users
                    .update(&id, |u| -> Result<(), RegistryError> {
                        u.name.push('x');
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(users.get(&alice.id).await.unwrap().name.len(), 50);
    }

    #[tokio::test]
    async fn test_values_are_ordered_by_key() {
        let mut people: Vec<User> = (0..5).map(|i| user(&format!("u{i}"))).collect();
        let users = UserRegistry::from_records(people.clone(), |u| u.id);

        people.sort_by_key(|u| u.id);
        assert_eq!(users.values().await, people);
    }
}

//! In-memory user -> value store
//!
//! Volatile: contents live as long as the process. All access goes through
//! one `RwLock`, so concurrent writes are serialized but not ordered: two
//! writers racing on the same key still end with whichever ran last.

use std::collections::HashMap;

use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct CredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a user's value. Absence is a normal outcome.
    pub async fn get(&self, user: &str) -> Option<String> {
        self.values.read().await.get(user).cloned()
    }

    /// Insert or overwrite a user's value, returning the value it replaced.
    pub async fn put(&self, user: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.write().await.insert(user.into(), value.into())
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }
}

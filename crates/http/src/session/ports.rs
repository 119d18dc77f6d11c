//! Capabilities the session needs from its host environment
//!
//! A browser host backs these with local/session storage and the history
//! API; native hosts and tests use the in-memory implementations below.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Clears client-side storage scopes on terminal session failure
#[cfg_attr(test, mockall::automock)]
pub trait StorageClearer: Send + Sync {
    /// Clear storage that outlives the session
    fn clear_local(&self);

    /// Clear storage scoped to the session
    fn clear_session(&self);
}

/// Reads and changes the current UI location
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Path of the current location, e.g. `/events/42`
    fn current_path(&self) -> String;

    /// Move to `path`
    fn navigate(&self, path: &str);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Key/value storage with a local and a session scope
#[derive(Debug, Default)]
pub struct MemoryStorage {
    local: Mutex<HashMap<String, String>>,
    session: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_local(&self, key: impl Into<String>, value: impl Into<String>) {
        lock(&self.local).insert(key.into(), value.into());
    }

    pub fn local(&self, key: &str) -> Option<String> {
        lock(&self.local).get(key).cloned()
    }

    pub fn set_session(&self, key: impl Into<String>, value: impl Into<String>) {
        lock(&self.session).insert(key.into(), value.into());
    }

    pub fn session(&self, key: &str) -> Option<String> {
        lock(&self.session).get(key).cloned()
    }

    /// True when both scopes are empty
    pub fn is_empty(&self) -> bool {
        lock(&self.local).is_empty() && lock(&self.session).is_empty()
    }
}

impl StorageClearer for MemoryStorage {
    fn clear_local(&self) {
        lock(&self.local).clear();
    }

    fn clear_session(&self) {
        lock(&self.session).clear();
    }
}

/// Navigator that records every location it visits
#[derive(Debug)]
pub struct MemoryNavigator {
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    /// Start at `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![path.into()]),
        }
    }

    /// Every visited location, oldest first
    pub fn history(&self) -> Vec<String> {
        lock(&self.history).clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        lock(&self.history).last().cloned().unwrap_or_default()
    }

    fn navigate(&self, path: &str) {
        lock(&self.history).push(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_scopes() {
        let storage = MemoryStorage::new();
        storage.set_local("theme", "dark");
        storage.set_session("draft", "hello");
        assert_eq!(storage.local("theme").as_deref(), Some("dark"));
        assert_eq!(storage.session("draft").as_deref(), Some("hello"));

        storage.clear_session();
        assert!(storage.session("draft").is_none());
        assert!(storage.local("theme").is_some());

        storage.clear_local();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_navigator_history() {
        let navigator = MemoryNavigator::new("/feed");
        assert_eq!(navigator.current_path(), "/feed");

        navigator.navigate("/sign-in");
        assert_eq!(navigator.current_path(), "/sign-in");
        assert_eq!(navigator.history(), vec!["/feed", "/sign-in"]);
    }
}

//! Keyed resource cache.
//!
//! One cache per resource kind, each with its own loader closure. Handles
//! are `Arc`s: dropping the cache (or evicting a key) never invalidates a
//! handle someone already holds.
//!
//! ```rust
//! use blockyard::ResourceCache;
//!
//! let cache = ResourceCache::new("greeting", |key: &str| {
//!     Ok::<_, std::io::Error>(format!("hello, {key}"))
//! });
//! let a = cache.get("world").unwrap();
//! let b = cache.get("world").unwrap();
//! assert!(std::sync::Arc::ptr_eq(&a, &b));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{AppError, AppResult, BoxError};

type Loader<T> = Box<dyn Fn(&str) -> Result<T, BoxError> + Send + Sync>;

/// Loads resources on first request and shares them afterwards.
pub struct ResourceCache<T> {
    kind: &'static str,
    entries: Mutex<HashMap<String, Arc<T>>>,
    loader: Loader<T>,
}

impl<T> ResourceCache<T> {
    /// Creates an empty cache. `kind` names the resource in errors and logs.
    pub fn new<F, E>(kind: &'static str, loader: F) -> Self
    where
        T: 'static,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        Self {
            kind,
            entries: Mutex::new(HashMap::new()),
            loader: Box::new(move |key: &str| -> Result<T, BoxError> { loader(key).map_err(Into::into) }),
        }
    }

    /// Resource kind this cache holds.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    /// Returns the cached resource for `key`, loading it on a miss.
    ///
    /// The lock is not held while loading. If two threads miss on the same
    /// key at once both load, and the first insert wins.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Load`] naming the kind and key if the loader fails.
    /// Failures are not cached.
    pub fn get(&self, key: &str) -> AppResult<Arc<T>> {
        if let Some(hit) = self.entries.lock().get(key) {
            return Ok(Arc::clone(hit));
        }

        let loaded = (self.loader)(key).map_err(|source| AppError::Load {
            kind: self.kind,
            key: key.to_owned(),
            source,
        })?;
        debug!(kind = self.kind, key, "loaded resource");

        let mut entries = self.entries.lock();
        let entry = entries.entry(key.to_owned()).or_insert_with(|| Arc::new(loaded));
        Ok(Arc::clone(entry))
    }

    /// Stores a resource under `key`, replacing any cached one.
    pub fn insert(&self, key: impl Into<String>, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.entries.lock().insert(key.into(), Arc::clone(&value));
        value
    }

    /// True if `key` is cached.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Drops the cache's handle for `key`, returning it.
    pub fn evict(&self, key: &str) -> Option<Arc<T>> {
        self.entries.lock().remove(key)
    }

    /// Drops every cached handle.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<T> std::fmt::Debug for ResourceCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("kind", &self.kind)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

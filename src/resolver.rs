//! Resolution of the license's owning client record.
//!
//! The license embeds a client identifier assigned at signing time; the
//! host's persistent store assigns its own record id once the client is
//! registered. [`ClientResolver`] maps one to the other through a single
//! lookup and memoizes the result for the process lifetime. A miss is a
//! normal outcome: the license is often processed before the client record
//! exists, so misses are never cached and never errors.

use crate::error::LicenseResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::RwLock;

/// Store-assigned identifier of a client record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Wraps a store-assigned id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single lookup the persistent store must support.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Finds the client record carrying the given license client id.
    /// Returns `Ok(None)` when no such record exists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LicenseError::Store`] when the store itself fails;
    /// absence is not a failure.
    async fn find_by_license_client_id(
        &self,
        license_client_id: &str,
    ) -> LicenseResult<Option<ClientId>>;
}

/// Process-lifetime memoization of the resolved client id.
///
/// Single writer (the resolution path), many readers. Racing first-time
/// resolutions may duplicate the lookup; the read is idempotent so the
/// duplicates are harmless and at most one outcome wins the cell.
#[derive(Debug, Default)]
pub struct ClientResolver {
    cached: RwLock<Option<ClientId>>,
}

impl ClientResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the client id, consulting the store only on a cold cache.
    /// A hit is cached; a miss is returned uncached so that a later
    /// registration can still resolve.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn resolve(
        &self,
        store: &dyn ClientStore,
        license_client_id: &str,
    ) -> LicenseResult<Option<ClientId>> {
        if let Some(id) = self.cached() {
            return Ok(Some(id));
        }
        let found = store.find_by_license_client_id(license_client_id).await?;
        if let Some(id) = &found {
            self.set(id.clone());
        }
        Ok(found)
    }

    /// Re-confirms existence via the store and forcibly replaces the cache
    /// on a hit. On a miss the cache is left untouched.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn update(
        &self,
        store: &dyn ClientStore,
        license_client_id: &str,
    ) -> LicenseResult<Option<ClientId>> {
        let found = store.find_by_license_client_id(license_client_id).await?;
        if let Some(id) = &found {
            self.set(id.clone());
        }
        Ok(found)
    }

    /// Returns the cached id without consulting the store.
    #[must_use]
    pub fn cached(&self) -> Option<ClientId> {
        self.cached
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Clears the cache; the next [`resolve`](Self::resolve) hits the store.
    pub fn invalidate(&self) {
        *self.cached.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn set(&self, id: ClientId) {
        *self.cached.write().unwrap_or_else(|e| e.into_inner()) = Some(id);
    }
}

use std::time::Duration;

use async_trait::async_trait;
use warden_core::PrincipalId;
use warden_domain::PermissionSet;

/// Lifetime of a cached permission set.
///
/// Also the worst-case staleness across processes: invalidation only reaches the cache
/// of the process that performed the mutation.
pub const DEFAULT_PERMISSION_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Invalidation counters of one principal, captured before reading the stores.
///
/// Any `invalidate` of the principal or `invalidate_all` after the capture makes the
/// snapshot stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheGeneration {
    principal: u64,
    global: u64,
}

impl CacheGeneration {
    /// Creates a snapshot from the per-principal and global counters.
    #[must_use]
    pub fn new(principal: u64, global: u64) -> Self {
        Self { principal, global }
    }
}

/// Process-local cache of resolved permission sets keyed by principal.
///
/// Operations are total; a miss is not an error. An invalidation that has returned
/// must hide the removed value from every later `get`, including values computed from
/// store reads that started before it.
#[async_trait]
pub trait PermissionCache: Send + Sync {
    /// Returns the cached set when present and not expired.
    async fn get(&self, principal_id: PrincipalId) -> Option<PermissionSet>;

    /// Stores a set until `now + ttl`.
    async fn put(&self, principal_id: PrincipalId, permissions: PermissionSet);

    /// Captures the principal's invalidation counters.
    async fn generation(&self, principal_id: PrincipalId) -> CacheGeneration;

    /// Stores a set only when no invalidation happened since `generation` was captured.
    ///
    /// Returns whether the set was stored.
    async fn put_if_current(
        &self,
        principal_id: PrincipalId,
        generation: CacheGeneration,
        permissions: PermissionSet,
    ) -> bool;

    /// Removes one principal's entry.
    async fn invalidate(&self, principal_id: PrincipalId);

    /// Clears every entry.
    async fn invalidate_all(&self);
}

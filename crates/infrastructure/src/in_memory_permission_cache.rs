use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};
use warden_application::{CacheGeneration, DEFAULT_PERMISSION_CACHE_TTL, PermissionCache};
use warden_core::PrincipalId;
use warden_domain::PermissionSet;

#[derive(Debug, Clone)]
struct PermissionCacheEntry {
    permissions: PermissionSet,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheState {
    entries: HashMap<PrincipalId, PermissionCacheEntry>,
    // Only principals invalidated since the last global clear have a counter.
    generations: HashMap<PrincipalId, u64>,
    global_generation: u64,
    next_sweep_at: Instant,
}

impl CacheState {
    fn generation(&self, principal_id: PrincipalId) -> CacheGeneration {
        CacheGeneration::new(
            self.generations.get(&principal_id).copied().unwrap_or_default(),
            self.global_generation,
        )
    }

    fn sweep_expired(&mut self, now: Instant, ttl: Duration) {
        if now < self.next_sweep_at {
            return;
        }

        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        self.next_sweep_at = now.checked_add(ttl).unwrap_or(now);

        let swept = before - self.entries.len();
        if swept > 0 {
            debug!(swept, "expired permission cache entries swept");
        }
    }
}

/// Process-local permission cache with a fixed entry lifetime.
///
/// Expired entries are evicted on read, and all of them at most once per lifetime on write.
/// Writes carrying a generation captured before an invalidation are dropped.
pub struct InMemoryPermissionCache {
    state: RwLock<CacheState>,
    ttl: Duration,
}

impl Default for InMemoryPermissionCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_PERMISSION_CACHE_TTL)
    }
}

impl InMemoryPermissionCache {
    /// Creates an empty cache with the default lifetime.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache with a custom lifetime.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                generations: HashMap::new(),
                global_generation: 0,
                next_sweep_at: now.checked_add(ttl).unwrap_or(now),
            }),
            ttl,
        }
    }

    /// Returns the number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Returns whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    fn entry(&self, permissions: PermissionSet, now: Instant) -> PermissionCacheEntry {
        PermissionCacheEntry {
            permissions,
            expires_at: now.checked_add(self.ttl).unwrap_or(now),
        }
    }
}

#[async_trait]
impl PermissionCache for InMemoryPermissionCache {
    async fn get(&self, principal_id: PrincipalId) -> Option<PermissionSet> {
        {
            let state = self.state.read().await;
            match state.entries.get(&principal_id) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.permissions.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        let mut state = self.state.write().await;
        if state
            .entries
            .get(&principal_id)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            state.entries.remove(&principal_id);
        }

        None
    }

    async fn put(&self, principal_id: PrincipalId, permissions: PermissionSet) {
        let now = Instant::now();
        let mut state = self.state.write().await;
        state.sweep_expired(now, self.ttl);
        state.entries.insert(principal_id, self.entry(permissions, now));
    }

    async fn generation(&self, principal_id: PrincipalId) -> CacheGeneration {
        self.state.read().await.generation(principal_id)
    }

    async fn put_if_current(
        &self,
        principal_id: PrincipalId,
        generation: CacheGeneration,
        permissions: PermissionSet,
    ) -> bool {
        let now = Instant::now();
        let mut state = self.state.write().await;
        if state.generation(principal_id) != generation {
            return false;
        }

        state.sweep_expired(now, self.ttl);
        state.entries.insert(principal_id, self.entry(permissions, now));
        true
    }

    async fn invalidate(&self, principal_id: PrincipalId) {
        let mut state = self.state.write().await;
        *state.generations.entry(principal_id).or_default() += 1;
        if state.entries.remove(&principal_id).is_some() {
            debug!(%principal_id, "permission cache entry invalidated");
        }
    }

    async fn invalidate_all(&self) {
        let mut state = self.state.write().await;
        let cleared = state.entries.len();
        state.entries.clear();
        state.generations.clear();
        state.global_generation += 1;
        info!(cleared, "permission cache cleared");
    }
}

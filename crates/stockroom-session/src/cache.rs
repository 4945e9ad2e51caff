//! [`ProfileCache`]: a time-bounded map from subject to profile.
//!
//! Expiry is checked when an entry is read, so a stale profile is never
//! returned even if no sweep has run. [`ProfileCache::purge_expired`] is a
//! single pass over the one map; there is no per-key timer.
//!
//! Every invalidation bumps a per-subject [`Generation`]. A lookup that
//! started before an invalidation carries the old generation and is refused
//! by [`ProfileCache::insert_at`].

use std::{collections::HashMap, time::Duration};

use parking_lot::Mutex;
use stockroom_core::{profile::Profile, subject::SubjectId};
use tokio::time::Instant;

/// Time-to-live applied by [`ProfileCache::insert`].
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
  profile:    Profile,
  expires_at: Instant,
}

impl CacheEntry {
  fn is_live(&self, now: Instant) -> bool { now < self.expires_at }
}

/// Invalidation counter for one subject, as seen at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
  epoch:   u64,
  subject: u64,
}

#[derive(Debug, Default)]
struct Inner {
  entries:     HashMap<SubjectId, CacheEntry>,
  generations: HashMap<SubjectId, u64>,
  /// Bumped by `clear`, which fences every subject at once.
  epoch:       u64,
}

impl Inner {
  fn generation(&self, subject_id: &SubjectId) -> Generation {
    Generation {
      epoch:   self.epoch,
      subject: self.generations.get(subject_id).copied().unwrap_or(0),
    }
  }
}

/// Subject → profile cache with lazy expiry.
#[derive(Debug)]
pub struct ProfileCache {
  inner:       Mutex<Inner>,
  default_ttl: Duration,
}

impl Default for ProfileCache {
  fn default() -> Self { Self::new(DEFAULT_TTL) }
}

impl ProfileCache {
  pub fn new(default_ttl: Duration) -> Self {
    Self { inner: Mutex::new(Inner::default()), default_ttl }
  }

  pub fn default_ttl(&self) -> Duration { self.default_ttl }

  /// The live profile for `subject_id`. An expired entry is removed and
  /// reported absent.
  pub fn get(&self, subject_id: &SubjectId) -> Option<Profile> {
    let now = Instant::now();
    let mut inner = self.inner.lock();
    match inner.entries.get(subject_id) {
      Some(entry) if entry.is_live(now) => Some(entry.profile.clone()),
      Some(_) => {
        inner.entries.remove(subject_id);
        None
      }
      None => None,
    }
  }

  /// Insert or overwrite the entry for `subject_id`, expiring after `ttl`.
  pub fn put(&self, subject_id: SubjectId, profile: Profile, ttl: Duration) {
    let expires_at = Instant::now() + ttl;
    self.inner.lock().entries.insert(subject_id, CacheEntry { profile, expires_at });
  }

  /// [`put`](Self::put) with the cache's default TTL.
  pub fn insert(&self, subject_id: SubjectId, profile: Profile) {
    self.put(subject_id, profile, self.default_ttl);
  }

  /// Current generation of `subject_id`. Record it before a lookup and hand
  /// it back to [`insert_at`](Self::insert_at).
  pub fn generation(&self, subject_id: &SubjectId) -> Generation {
    self.inner.lock().generation(subject_id)
  }

  /// Insert with the default TTL, but only if `subject_id` has not been
  /// invalidated since `seen` was taken. Returns whether it was inserted.
  pub fn insert_at(&self, subject_id: SubjectId, profile: Profile, seen: Generation) -> bool {
    let expires_at = Instant::now() + self.default_ttl;
    let mut inner = self.inner.lock();
    if inner.generation(&subject_id) != seen {
      return false;
    }
    inner.entries.insert(subject_id, CacheEntry { profile, expires_at });
    true
  }

  pub fn invalidate(&self, subject_id: &SubjectId) {
    let mut inner = self.inner.lock();
    inner.entries.remove(subject_id);
    *inner.generations.entry(subject_id.clone()).or_insert(0) += 1;
  }

  pub fn clear(&self) {
    let mut inner = self.inner.lock();
    inner.entries.clear();
    inner.generations.clear();
    inner.epoch += 1;
  }

  /// Drop every expired entry. Returns how many were removed.
  pub fn purge_expired(&self) -> usize {
    let now = Instant::now();
    let mut inner = self.inner.lock();
    let before = inner.entries.len();
    inner.entries.retain(|_, entry| entry.is_live(now));
    before - inner.entries.len()
  }

  /// Number of entries held, including any not yet purged.
  pub fn len(&self) -> usize { self.inner.lock().entries.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

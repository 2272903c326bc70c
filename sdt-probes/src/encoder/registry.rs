//! Registry of live encoders
//!
//! Encoders run on separate worker threads, one per compilation unit. Their
//! own state is never shared, so registry membership is the only thing that
//! needs a lock. The registry is an ordinary value: a session creates one and
//! hands an `Arc` to every encoder it builds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::EncoderId;

/// One registry entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredEncoder {
    pub id: EncoderId,
    /// Name of the compilation unit the encoder was built for
    pub unit: String,
}

/// Dense entry list plus identity → position map, so that both insertion
/// and removal are O(1).
#[derive(Debug, Default)]
struct Members {
    entries: Vec<RegisteredEncoder>,
    index: HashMap<EncoderId, usize>,
}

impl Members {
    fn insert(&mut self, entry: RegisteredEncoder) {
        if self.index.contains_key(&entry.id) {
            return;
        }
        self.index.insert(entry.id, self.entries.len());
        self.entries.push(entry);
    }

    fn remove(&mut self, id: EncoderId) -> bool {
        let Some(idx) = self.index.remove(&id) else {
            return false;
        };
        self.entries.swap_remove(idx);
        if let Some(moved) = self.entries.get(idx) {
            self.index.insert(moved.id, idx);
        }
        true
    }
}

#[derive(Debug, Default)]
pub struct EncoderRegistry {
    members: Mutex<Members>,
    next_id: AtomicU64,
}

impl EncoderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section leaves `Members` consistent; a poisoned lock is
    // still usable.
    fn lock(&self) -> MutexGuard<'_, Members> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a fresh identity and add it
    pub fn register(&self, unit: &str) -> EncoderId {
        let id = EncoderId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(RegisteredEncoder { id, unit: unit.to_string() });
        id
    }

    /// Remove `id`; returns `false` (and does nothing) if it is not a member
    pub fn remove(&self, id: EncoderId) -> bool {
        self.lock().remove(id)
    }

    #[must_use]
    pub fn contains(&self, id: EncoderId) -> bool {
        self.lock().index.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current members
    #[must_use]
    pub fn snapshot(&self) -> Vec<RegisteredEncoder> {
        self.lock().entries.clone()
    }

    /// Visit every member while holding the registry lock
    ///
    /// `f` must not create or drop encoders on this registry: that would try
    /// to take the same lock again and deadlock.
    pub fn for_each<F: FnMut(&RegisteredEncoder)>(&self, mut f: F) {
        let members = self.lock();
        for entry in &members.entries {
            f(entry);
        }
    }
}

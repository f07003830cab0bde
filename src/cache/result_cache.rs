//! Fixed-capacity store for segmentation results.
//!
//! Payloads are keyed by a random [`SegmentId`]. Once the store holds more
//! than `capacity` entries the oldest *inserted* one is dropped; reads do not
//! refresh an entry's position.

use serde::Serialize;
use std::borrow::Borrow;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use uuid::Uuid;

/// Length of a segment id in hex characters.
const ID_LEN: usize = 16;

/// Opaque handle to a cached segmentation result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SegmentId(String);

impl SegmentId {
    fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(ID_LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SegmentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload map and insertion order. Both change together under one lock.
#[derive(Default)]
struct Entries {
    payloads: HashMap<SegmentId, Arc<[u8]>>,
    order: VecDeque<SegmentId>,
}

pub struct ResultCache {
    capacity: usize,
    entries: Mutex<Entries>,
}

impl ResultCache {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(Entries::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a payload under a fresh id, evicting the oldest entries beyond capacity.
    pub fn put(&self, payload: Vec<u8>) -> SegmentId {
        let id = SegmentId::generate();
        let mut entries = self.lock();
        entries.payloads.insert(id.clone(), payload.into());
        entries.order.push_back(id.clone());

        while entries.payloads.len() > self.capacity {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.payloads.remove(&oldest);
            debug!(id = %oldest, "evicted segmentation result");
        }
        id
    }

    /// Fetch a payload. Does not affect eviction order.
    pub fn get(&self, id: &str) -> Option<Arc<[u8]>> {
        self.lock().payloads.get(id).map(Arc::clone)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        let entries = self.lock();
        assert_eq!(entries.order.len(), entries.payloads.len());
        for id in &entries.order {
            assert!(entries.payloads.contains_key(id), "orphaned id {id}");
        }
        assert!(entries.payloads.len() <= self.capacity);
    }
}

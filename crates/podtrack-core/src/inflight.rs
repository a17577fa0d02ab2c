//! Process-wide single-flight registry for status transitions.
//!
//! Every tracker for the same trip/client pair shares one registry, so at most
//! one transition per pair is in flight no matter how many trackers are open.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use log::debug;

use crate::models::PodKey;

/// Shared set of trip/client pairs with a transition in flight.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    keys: Arc<Mutex<HashSet<PodKey>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key`, or returns `None` if it is already claimed.
    ///
    /// The claim is released when the returned guard is dropped.
    pub fn try_acquire(&self, key: &PodKey) -> Option<InFlightGuard> {
        if !self.lock().insert(key.clone()) {
            debug!("Transition already in flight for {key}");
            return None;
        }

        Some(InFlightGuard {
            registry: self.clone(),
            key: key.clone(),
        })
    }

    /// Whether a transition for `key` is currently in flight.
    pub fn is_in_flight(&self, key: &PodKey) -> bool {
        self.lock().contains(key)
    }

    fn release(&self, key: &PodKey) {
        self.lock().remove(key);
    }

    // The set stays consistent even if a holder panicked, so a poisoned lock
    // is still usable.
    fn lock(&self) -> MutexGuard<'_, HashSet<PodKey>> {
        self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases its key from the registry on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: InFlightRegistry,
    key: PodKey,
}

impl InFlightGuard {
    pub fn key(&self) -> &PodKey {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.release(&self.key);
    }
}

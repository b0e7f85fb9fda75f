//! Per-name resolution slots
//!
//! Each unit name gets a lazily created slot that is both the name's
//! exclusion lock and its cache cell. The slot table itself is only locked
//! long enough to find or insert a slot, so resolutions of different names
//! never wait on each other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use tracing::debug;

use crate::loader::traits::{LoadedUnit, LoaderError, UnitName};
use crate::utils::lock;

/// Outcome of one resolution attempt
pub type Outcome = Result<Arc<LoadedUnit>, LoaderError>;

/// Whether a resolution result may be kept in the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Found in the child scope; cache for the loader's lifetime
    Cache,
    /// Delegated result or failure; share only with callers already waiting
    Transient,
}

/// Exclusion lock and cache cell for one unit name
#[derive(Default)]
pub struct UnitSlot {
    /// Unit found in the child scope, set at most once
    resolved: OnceLock<Arc<LoadedUnit>>,
    /// Completed resolution attempts
    completed: AtomicU64,
    /// Held for the duration of a resolution; keeps the latest outcome
    last: Mutex<Option<Outcome>>,
}

impl UnitSlot {
    /// Cached unit, without waiting on an in-flight resolution
    pub fn cached(&self) -> Option<Arc<LoadedUnit>> {
        self.resolved.get().cloned()
    }

    /// Run `resolve` under this slot's lock unless its answer is already known
    ///
    /// A caller that queued behind an in-flight resolution reuses that
    /// resolution's outcome instead of resolving again.
    pub fn resolve_with<F>(&self, name: &UnitName, resolve: F) -> Outcome
    where
        F: FnOnce() -> (Outcome, Retention),
    {
        let arrived = self.completed.load(Ordering::Acquire);

        lock::with_lock(&self.last, "unit slot", |last| {
            if let Some(unit) = self.resolved.get() {
                return Ok(Arc::clone(unit));
            }
            if self.completed.load(Ordering::Acquire) > arrived {
                if let Some(outcome) = last.as_ref() {
                    debug!("Sharing concurrent resolution of {}", name);
                    return outcome.clone();
                }
            }

            let (outcome, retention) = resolve();
            if retention == Retention::Cache {
                if let Ok(unit) = &outcome {
                    let _ = self.resolved.set(Arc::clone(unit));
                }
            }
            *last = Some(outcome.clone());
            self.completed.fetch_add(1, Ordering::Release);
            outcome
        })
    }
}

/// Table of per-name slots owned by one loader
#[derive(Default)]
pub struct UnitCache {
    slots: RwLock<HashMap<UnitName, Arc<UnitSlot>>>,
}

impl UnitCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for `name`, created on first use
    pub fn slot(&self, name: &UnitName) -> Arc<UnitSlot> {
        if let Some(slot) = lock::read(&self.slots, "unit cache").get(name) {
            return Arc::clone(slot);
        }
        // Re-checked under the write lock: another thread may have won the race
        let mut slots = lock::write(&self.slots, "unit cache");
        Arc::clone(slots.entry(name.clone()).or_default())
    }

    /// Drop a slot that holds no cached unit and has no other users
    pub fn release(&self, name: &UnitName, slot: &Arc<UnitSlot>) {
        if slot.resolved.get().is_some() {
            return;
        }
        lock::with_write_lock(&self.slots, "unit cache", |slots| {
            // One reference in the table, one held by the caller
            let unused = slots
                .get(name)
                .map(|current| Arc::ptr_eq(current, slot) && Arc::strong_count(slot) == 2)
                .unwrap_or(false);
            if unused {
                slots.remove(name);
            }
        });
    }

    /// Cached unit for `name`, if resolved
    pub fn get(&self, name: &UnitName) -> Option<Arc<LoadedUnit>> {
        lock::read(&self.slots, "unit cache")
            .get(name)
            .and_then(|slot| slot.cached())
    }

    /// Names with a cached unit, sorted
    pub fn names(&self) -> Vec<UnitName> {
        let mut names: Vec<UnitName> = lock::with_read_lock(&self.slots, "unit cache", |slots| {
            slots
                .iter()
                .filter(|(_, slot)| slot.resolved.get().is_some())
                .map(|(name, _)| name.clone())
                .collect()
        });
        names.sort();
        names
    }

    /// Number of cached units
    pub fn len(&self) -> usize {
        lock::with_read_lock(&self.slots, "unit cache", |slots| {
            slots
                .values()
                .filter(|slot| slot.resolved.get().is_some())
                .count()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots currently allocated, cached or in flight
    pub fn slot_count(&self) -> usize {
        lock::read(&self.slots, "unit cache").len()
    }
}

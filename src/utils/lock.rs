//! Lock utilities for blocking contexts
//!
//! Provides helpers for common lock patterns with automatic release. A
//! poisoned lock is recovered rather than propagated: everything the loader
//! guards is either immutable once written or a cache that can be rebuilt.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// Acquire a Mutex, recovering from poisoning
pub fn lock<'a, T>(mutex: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("{}: recovering poisoned lock", context);
        poisoned.into_inner()
    })
}

/// Acquire a read lock, recovering from poisoning
pub fn read<'a, T>(rwlock: &'a RwLock<T>, context: &str) -> RwLockReadGuard<'a, T> {
    rwlock.read().unwrap_or_else(|poisoned| {
        warn!("{}: recovering poisoned read lock", context);
        poisoned.into_inner()
    })
}

/// Acquire a write lock, recovering from poisoning
pub fn write<'a, T>(rwlock: &'a RwLock<T>, context: &str) -> RwLockWriteGuard<'a, T> {
    rwlock.write().unwrap_or_else(|poisoned| {
        warn!("{}: recovering poisoned write lock", context);
        poisoned.into_inner()
    })
}

/// Execute a closure with a Mutex lock, automatically releasing it
///
/// # Example
/// ```rust
/// use std::sync::Mutex;
/// use unit_loader::utils::with_lock;
///
/// let counter = Mutex::new(0);
/// let value = with_lock(&counter, "counter", |n| {
///     *n += 1;
///     *n
/// });
/// assert_eq!(value, 1);
/// ```
pub fn with_lock<T, F, R>(mutex: &Mutex<T>, context: &str, f: F) -> R
where
    F: FnOnce(&mut T) -> R,
{
    let mut guard = lock(mutex, context);
    f(&mut guard)
}

/// Execute a closure with a read lock, automatically releasing it
pub fn with_read_lock<T, F, R>(rwlock: &RwLock<T>, context: &str, f: F) -> R
where
    F: FnOnce(&T) -> R,
{
    let guard = read(rwlock, context);
    f(&guard)
}

/// Execute a closure with a write lock, automatically releasing it
pub fn with_write_lock<T, F, R>(rwlock: &RwLock<T>, context: &str, f: F) -> R
where
    F: FnOnce(&mut T) -> R,
{
    let mut guard = write(rwlock, context);
    f(&mut guard)
}

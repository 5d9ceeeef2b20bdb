use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::error;

use super::CacheError;

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> Result<RwLockReadGuard<'a, T>, CacheError> {
    lock.read().map_err(|_| {
        error!(
            op,
            target_module = target,
            lock_kind = "rwlock.read",
            result = "poisoned",
            "Cache slot unusable after panic in another thread"
        );
        CacheError::Unavailable { op }
    })
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> Result<RwLockWriteGuard<'a, T>, CacheError> {
    lock.write().map_err(|_| {
        error!(
            op,
            target_module = target,
            lock_kind = "rwlock.write",
            result = "poisoned",
            "Cache slot unusable after panic in another thread"
        );
        CacheError::Unavailable { op }
    })
}

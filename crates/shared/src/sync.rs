//! Lock helpers shared by the in-memory registry types.
//!
//! A panic while a guard is held leaves the protected maps structurally
//! intact, so poisoned locks are recovered instead of propagated.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let shared = Arc::new(RwLock::new(vec![1, 2]));
        let poisoner = Arc::clone(&shared);
        let _ = thread::spawn(move || {
            let mut guard = poisoner.write().unwrap();
            guard.push(3);
            panic!("poison");
        })
        .join();

        assert!(shared.is_poisoned());
        assert_eq!(*read_lock(&shared), vec![1, 2, 3]);
        write_lock(&shared).push(4);
        assert_eq!(read_lock(&shared).len(), 4);
    }

    #[test]
    fn test_mutex_lock() {
        let counter = Mutex::new(0);
        *lock(&counter) += 1;
        assert_eq!(*lock(&counter), 1);
    }
}

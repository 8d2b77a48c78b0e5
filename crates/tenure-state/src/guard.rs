use std::sync::atomic::{AtomicBool, Ordering};

use tenure_core::error::TenureError;

/// Scoped reentrancy guard over a per-instance busy flag.
///
/// Acquired before the first state read of every state-mutating entry
/// point; a second acquisition while one is held fails fast with
/// `ReentrantCall` instead of blocking. Release happens on drop, so every
/// exit path (success or error) gives the flag back.
#[derive(Debug)]
pub(crate) struct EntryGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> EntryGuard<'a> {
    pub fn acquire(flag: &'a AtomicBool) -> Result<Self, TenureError> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            return Err(TenureError::ReentrantCall);
        }
        Ok(Self { flag })
    }
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let flag = AtomicBool::new(false);
        let g = EntryGuard::acquire(&flag).unwrap();
        assert!(matches!(EntryGuard::acquire(&flag).unwrap_err(), TenureError::ReentrantCall));
        drop(g);
        assert!(EntryGuard::acquire(&flag).is_ok());
    }

    #[test]
    fn released_on_early_error_path() {
        let flag = AtomicBool::new(false);
        {
            let _g = EntryGuard::acquire(&flag).unwrap();
            // simulated validation failure drops the guard here
        }
        assert!(EntryGuard::acquire(&flag).is_ok());
    }
}

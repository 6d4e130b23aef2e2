//! RAII guard for environment variables in tests.
//!
//! The guard snapshots a variable in `new()` and restores it in `Drop`, even
//! if the test panics. Tests using it must still be `#[serial]`: the
//! environment is process-global.

use std::env;
use std::ffi::{OsStr, OsString};

pub struct EnvGuard {
    key: String,
    original: Option<OsString>,
}

impl EnvGuard {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            original: env::var_os(key),
        }
    }

    /// Snapshot `key`, then set it to `value`.
    ///
    /// # Safety
    /// `std::env::set_var` is unsafe in the 2024 edition; callers must be
    /// `#[serial]`.
    pub unsafe fn set(key: &str, value: impl AsRef<OsStr>) -> Self {
        let guard = Self::new(key);
        unsafe { env::set_var(key, value) };
        guard
    }

    /// Snapshot `key`, then remove it.
    ///
    /// # Safety
    /// See [`EnvGuard::set`].
    pub unsafe fn remove(key: &str) -> Self {
        let guard = Self::new(key);
        unsafe { env::remove_var(key) };
        guard
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: only used from #[serial] tests.
        match &self.original {
            Some(val) => unsafe { env::set_var(&self.key, val) },
            None => unsafe { env::remove_var(&self.key) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_env_guard_restores_missing_var() {
        let key = "TICKETDESK_TEST_GUARD_MISSING";
        assert!(env::var_os(key).is_none());
        {
            let _guard = unsafe { EnvGuard::set(key, "temp") };
            assert_eq!(env::var(key).unwrap(), "temp");
        }
        assert!(env::var_os(key).is_none());
    }

    #[test]
    #[serial]
    fn test_env_guard_restores_existing_var() {
        let key = "TICKETDESK_TEST_GUARD_EXISTING";
        let _outer = unsafe { EnvGuard::set(key, "original") };
        {
            let _guard = unsafe { EnvGuard::remove(key) };
            assert!(env::var_os(key).is_none());
        }
        assert_eq!(env::var(key).unwrap(), "original");
    }
}

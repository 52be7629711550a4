//! Environment guards shared by the configuration integration tests.

use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Serialises access to the process environment for the guard's lifetime.
pub fn lock_environment() -> MutexGuard<'static, ()> {
    match ENV_MUTEX.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Restores an environment variable to its previous value when dropped.
pub struct EnvOverride {
    key: String,
    previous: Option<OsString>,
}

impl EnvOverride {
    /// Sets `key` to `value` until the override is dropped.
    pub fn set_var(key: &str, value: &OsStr) -> Self {
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` under edition 2024; callers hold
        // the environment lock for the override's lifetime.
        unsafe { std::env::set_var(key, value) };
        Self {
            key: key.to_owned(),
            previous,
        }
    }

    /// Removes `key` until the override is dropped.
    pub fn remove_var(key: &str) -> Self {
        let previous = std::env::var_os(key);
        unsafe { std::env::remove_var(key) };
        Self {
            key: key.to_owned(),
            previous,
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(&self.key, value) },
            None => unsafe { std::env::remove_var(&self.key) },
        }
    }
}

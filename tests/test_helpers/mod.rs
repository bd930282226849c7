//! Scoped environment variables for integration tests.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock};

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Sets environment variables for its lifetime and restores them on drop.
///
/// Guards serialize on a global mutex, so at most one test touches the
/// environment at a time.
pub struct EnvVarGuard {
    previous: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Applies `changes`; a `None` value removes the variable.
    pub fn set(changes: &[(&str, Option<&str>)]) -> Self {
        let lock = env_lock();
        let previous = changes
            .iter()
            .map(|(key, value)| {
                let old = env::var_os(key);
                apply(OsString::from(key), value.map(OsString::from));
                (OsString::from(key), old)
            })
            .collect();

        Self {
            previous,
            _lock: lock,
        }
    }

    /// Removes every variable in `keys`.
    pub fn cleared(keys: &[&str]) -> Self {
        let changes: Vec<(&str, Option<&str>)> = keys.iter().map(|key| (*key, None)).collect();
        Self::set(&changes)
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..).rev() {
            apply(key, value);
        }
    }
}

fn apply(key: OsString, value: Option<OsString>) {
    unsafe {
        // SAFETY: the global mutex serializes environment mutations in tests.
        match value {
            Some(new_value) => env::set_var(&key, new_value),
            None => env::remove_var(&key),
        }
    }
}

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

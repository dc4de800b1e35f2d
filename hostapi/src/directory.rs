//! Process-wide registry of tracer constructors, selected by name.
//!
//! External configuration names a tracer ("wasip1", ...) and supplies a JSON
//! config record; the registry looks up the constructor and builds `Hooks`.
//! Tracer crates register themselves explicitly at startup.

use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::error::DirectoryError;
use crate::hooks::Hooks;

/// Builds a tracer from its raw JSON configuration.
pub type TracerConstructor = fn(&serde_json::Value) -> anyhow::Result<Hooks>;

#[derive(Default)]
pub struct LiveDirectory {
    tracers: Mutex<BTreeMap<String, TracerConstructor>>,
}

impl std::fmt::Debug for LiveDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveDirectory")
            .field("tracers", &self.names())
            .finish()
    }
}

impl LiveDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide directory.
    pub fn global() -> &'static LiveDirectory {
        static GLOBAL: OnceLock<LiveDirectory> = OnceLock::new();
        GLOBAL.get_or_init(LiveDirectory::new)
    }

    /// Register `constructor` under `name`, replacing any previous entry.
    pub fn register(&self, name: &str, constructor: TracerConstructor) {
        let previous = self
            .tracers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), constructor);
        if previous.is_some() {
            tracing::debug!(tracer = name, "replaced registered tracer");
        }
    }

    /// Whether a constructor is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.tracers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered tracer names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.tracers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Build the tracer registered under `name` from its config record.
    pub fn new_hooks(&self, name: &str, config: &serde_json::Value) -> Result<Hooks, DirectoryError> {
        // Copy the fn pointer out so the lock is not held while the tracer sets up.
        let constructor = self
            .tracers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
            .ok_or_else(|| DirectoryError::UnknownTracer(name.to_string()))?;

        constructor(config).map_err(|source| DirectoryError::Constructor {
            name: name.to_string(),
            source,
        })
    }
}

//! Target list persistence.
//!
//! The host application kept targets in a browser cookie; here the store
//! is an injected port so the tracker logic never touches a concrete
//! storage mechanism. The native implementation writes JSON into the user
//! cache directory; load failures of any kind degrade to an empty list.

use crate::nav::Target;

pub trait TargetStore {
    fn load(&self) -> Vec<Target>;
    fn save(&mut self, targets: &[Target]);
}

/// No-op store for targets that should not outlive the session.
#[derive(Default)]
pub struct MemoryStore {
    targets: Vec<Target>,
}

impl TargetStore for MemoryStore {
    fn load(&self) -> Vec<Target> {
        self.targets.clone()
    }

    fn save(&mut self, targets: &[Target]) {
        self.targets = targets.to_vec();
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file_store::JsonFileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file_store {
    use std::path::PathBuf;

    use super::TargetStore;
    use crate::nav::Target;

    pub struct JsonFileStore {
        path: PathBuf,
    }

    impl JsonFileStore {
        /// Store under `~/.cache/trail-viz/targets.json`.
        pub fn in_cache_dir() -> Self {
            let dir = dirs_cache().join("trail-viz");
            let _ = std::fs::create_dir_all(&dir);
            Self { path: dir.join("targets.json") }
        }

        pub fn at(path: PathBuf) -> Self {
            Self { path }
        }
    }

    impl TargetStore for JsonFileStore {
        fn load(&self) -> Vec<Target> {
            let text = match std::fs::read_to_string(&self.path) {
                Ok(text) => text,
                Err(_) => return Vec::new(),
            };
            match serde_json::from_str(&text) {
                Ok(targets) => targets,
                Err(e) => {
                    log::error!("ignoring malformed target store {}: {e}", self.path.display());
                    Vec::new()
                }
            }
        }

        fn save(&mut self, targets: &[Target]) {
            let json = match serde_json::to_string(targets) {
                Ok(json) => json,
                Err(e) => {
                    log::error!("failed to serialize targets: {e}");
                    return;
                }
            };
            if let Err(e) = std::fs::write(&self.path, json) {
                log::error!("failed to write {}: {e}", self.path.display());
            }
        }
    }

    fn dirs_cache() -> PathBuf {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join(".cache"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

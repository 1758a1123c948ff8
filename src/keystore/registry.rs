use super::entry::{KeyEntry, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE};
use crate::error::TokenError;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Directory under the base path that holds one subdirectory per client.
pub const KEYS_DIR: &str = "keys";

/// Client ID → key pair, immutable once built.
#[derive(Debug, Default)]
pub struct KeyStoreRegistry {
    stores: HashMap<String, KeyEntry>,
}

impl KeyStoreRegistry {
    /// Scan `<base_path>/keys` and load every complete key pair.
    ///
    /// Directories missing one of the two key files are skipped. Any key that
    /// is present but cannot be parsed, or a key file name that appears twice
    /// in different cases, aborts the whole load.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::KeyLoad` if the keys folder is unreadable or a
    /// key file is malformed.
    pub fn load(base_path: impl AsRef<Path>) -> Result<Self, TokenError> {
        let keys_path = base_path.as_ref().join(KEYS_DIR);
        let dir = fs::read_dir(&keys_path)
            .map_err(|e| TokenError::key_load(&keys_path, format!("Failed to read keys folder: {}", e)))?;

        let mut stores = HashMap::new();

        for entry in dir {
            let entry = entry.map_err(|e| TokenError::key_load(&keys_path, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let Some(client_id) = entry.file_name().to_str().map(str::to_string) else {
                warn!(path = %path.display(), "Skipping key directory with non UTF-8 name");
                continue;
            };

            match load_client_dir(&client_id, &path)? {
                Some(store) => {
                    debug!(client_id = %client_id, "Loaded key pair");
                    stores.insert(client_id, store);
                }
                None => {
                    warn!(client_id = %client_id, "Skipping key directory without a complete key pair");
                }
            }
        }

        info!(clients = stores.len(), path = %keys_path.display(), "Key store loaded");
        Ok(Self { stores })
    }

    /// Build a registry from already-parsed entries.
    pub fn from_entries(entries: impl IntoIterator<Item = KeyEntry>) -> Self {
        let stores = entries
            .into_iter()
            .map(|entry| (entry.client_id().to_string(), entry))
            .collect();
        Self { stores }
    }

    #[must_use]
    pub fn lookup(&self, client_id: &str) -> Option<&KeyEntry> {
        self.stores.get(client_id)
    }

    #[must_use]
    pub fn contains(&self, client_id: &str) -> bool {
        self.stores.contains_key(client_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Loaded client IDs, sorted.
    #[must_use]
    pub fn client_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.stores.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Returns `None` when the directory does not hold both key files.
fn load_client_dir(client_id: &str, dir: &Path) -> Result<Option<KeyEntry>, TokenError> {
    let files = fs::read_dir(dir)
        .map_err(|e| TokenError::key_load(dir, format!("Cannot read content: {}", e)))?;

    let mut private_path = None;
    let mut public_path = None;

    for file in files {
        let file = file.map_err(|e| TokenError::key_load(dir, e))?;
        let name = file.file_name().to_string_lossy().to_lowercase();

        let slot = if name == PRIVATE_KEY_FILE {
            &mut private_path
        } else if name == PUBLIC_KEY_FILE {
            &mut public_path
        } else {
            continue;
        };

        if slot.is_some() {
            return Err(TokenError::key_load(
                file.path(),
                format!("Duplicate key file {:?} differing only in case", name),
            ));
        }
        *slot = Some(file.path());
    }

    match (private_path, public_path) {
        (Some(private_path), Some(public_path)) => {
            KeyEntry::load(client_id, &private_path, &public_path).map(Some)
        }
        _ => Ok(None),
    }
}

/// Builds the registry exactly once, however many callers race to ask for it.
#[derive(Debug)]
pub struct KeyStoreLoader {
    base_path: PathBuf,
    registry: OnceCell<Arc<KeyStoreRegistry>>,
}

impl KeyStoreLoader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            registry: OnceCell::new(),
        }
    }

    /// Return the registry, scanning the filesystem on first use.
    ///
    /// Concurrent callers block until the first scan finishes and then share
    /// its result. A failed scan is not cached.
    pub fn get_or_load(&self) -> Result<Arc<KeyStoreRegistry>, TokenError> {
        self.registry
            .get_or_try_init(|| KeyStoreRegistry::load(&self.base_path).map(Arc::new))
            .map(Arc::clone)
    }

    /// The registry if it has already been loaded.
    #[must_use]
    pub fn get(&self) -> Option<Arc<KeyStoreRegistry>> {
        self.registry.get().cloned()
    }

    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

//! File-backed storage scopes, so accounts and pending setup data survive
//! across CLI invocations.

use std::fs;
use std::path::PathBuf;

use zklogin_core::platform::{KeyValueStore, StorageError, StorageResult, StorageScope};

/// A [`KeyValueStore`] keeping each scope in its own directory of JSON
/// files under the CLI data dir. Writes go through a temp file plus rename
/// so a value is either fully committed or absent.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`, creating the scope directories.
    ///
    /// # Errors
    ///
    /// Fails if the directories cannot be created.
    pub fn open(root: PathBuf) -> StorageResult<Self> {
        for scope in ["setup", "accounts"] {
            fs::create_dir_all(root.join(scope))
                .map_err(|err| StorageError::Backend(err.to_string()))?;
        }
        Ok(Self { root })
    }

    fn path_for(&self, scope: StorageScope, key: &str) -> PathBuf {
        let dir = match scope {
            StorageScope::Setup => "setup",
            StorageScope::Accounts => "accounts",
        };
        self.root.join(dir).join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, scope: StorageScope, key: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.path_for(scope, key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Backend(err.to_string())),
        }
    }

    fn set(&self, scope: StorageScope, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(scope, key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|err| StorageError::Backend(err.to_string()))?;
        fs::rename(&tmp, &path).map_err(|err| StorageError::Backend(err.to_string()))
    }

    fn delete(&self, scope: StorageScope, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.path_for(scope, key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Backend(err.to_string())),
        }
    }
}

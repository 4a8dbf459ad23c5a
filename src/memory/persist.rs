//! Shared write-through persistence helper: write to a temp file in the
//! same directory, then rename over the target. Atomic on POSIX and on
//! Windows (both `tempfile` and `std::fs::rename` guarantee this), so a
//! crash mid-write never corrupts the previous snapshot — the memory
//! managers treat "reloaded snapshot is authoritative" as an invariant,
//! which a half-written file would violate.

use std::io::Write;
use std::path::Path;

use crate::error::{AgentError, Result};

pub fn write_atomic_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| AgentError::Persistence {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|source| AgentError::Persistence {
        path: path.to_path_buf(),
        source,
    })?;
    let json = serde_json::to_vec_pretty(value).map_err(|e| AgentError::Persistence {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;
    tmp.write_all(&json).map_err(|source| AgentError::Persistence {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.persist(path).map_err(|e| AgentError::Persistence {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

pub fn read_json<T: serde::de::DeserializeOwned + Default>(path: &Path) -> T {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Err(_) => T::default(),
    }
}

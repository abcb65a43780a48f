//! JSON record persistence with file locking.
//!
//! Profiles and companions are stored one record per file. Reads take a
//! shared lock; writes go through a locked temp file that is synced and
//! renamed over the original, so readers never see a half-written record.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Load a record from a file with shared locking
///
/// Returns `None` if the file doesn't exist. A file that exists but cannot be
/// parsed is reported as a persistence error instead of being treated as
/// missing, so a corrupted record is never silently replaced.
pub fn load_record<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        tracing::debug!("No record at {:?}", path);
        return Ok(None);
    }

    let file = File::open(path)?;

    // Acquire shared lock for reading
    file.lock_shared()?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;

    match serde_json::from_str::<T>(&contents) {
        Ok(record) => {
            tracing::debug!("Loaded record from {:?}", path);
            Ok(Some(record))
        }
        Err(e) => {
            tracing::warn!("Failed to parse record {:?}: {}", path, e);
            Err(Error::Persistence(format!(
                "corrupted record {}: {}",
                path.display(),
                e
            )))
        }
    }
}

/// Save a record to a file with exclusive locking
///
/// Atomically writes the record by:
/// 1. Writing to a temp file
/// 2. Syncing to disk
/// 3. Renaming over the original
pub fn save_record<T: Serialize>(record: &T, path: &Path) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::Persistence(format!("record path {} has no parent", path.display()))
    })?;
    std::fs::create_dir_all(parent)?;

    // Create unique temp file in the same directory for atomic rename
    let temp = NamedTempFile::new_in(parent)?;

    // Acquire exclusive lock on the temp file to serialize concurrent writers
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string_pretty(record)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    // Atomically replace old record
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved record to {:?}", path);
    Ok(())
}

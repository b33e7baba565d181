// Persistent mirror of the stored message list (pretty-printed JSON)

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::message::Message;

/// Errors raised while reading or writing the stored message file
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed message file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode messages: {0}")]
    Encode(#[from] serde_json::Error),
}

/// JSON file holding the full stored list
///
/// Every save rewrites the whole file with the current snapshot.
#[derive(Debug, Clone)]
pub struct StoredFile {
    path: PathBuf,
}

impl StoredFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing file is an empty list.
    pub fn load(&self) -> Result<Vec<Message>, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored message file at {:?}", self.path);
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let messages: Vec<Message> =
            serde_json::from_str(&text).map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                source,
            })?;

        debug!("Loaded {} stored messages from {:?}", messages.len(), self.path);
        Ok(messages)
    }

    /// Overwrite the file with `messages`
    pub fn save(&self, messages: &[Message]) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(messages)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        fs::write(&self.path, json).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!("Saved {} stored messages to {:?}", messages.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::message::IdSequence;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let file = StoredFile::new(dir.path().join("storedMessages.json"));
        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let file = StoredFile::new(dir.path().join("storedMessages.json"));
        let mut ids = IdSequence::new();

        let messages = vec![
            Message::create(&mut ids, "+27838884567", "Where are you?"),
            Message::create(&mut ids, "+27838884567", "Ok, I am leaving without you."),
        ];

        file.save(&messages).unwrap();
        let loaded = file.load().unwrap();
        assert_eq!(loaded, messages);
    }

    #[test]
    fn test_hash_timestamp_not_persisted() {
        let dir = tempdir().unwrap();
        let file = StoredFile::new(dir.path().join("storedMessages.json"));
        let mut ids = IdSequence::new();

        let original = Message::create(&mut ids, "+27838884567", "timed");
        assert!(original.hashed_at_ms() > 0);
        file.save(std::slice::from_ref(&original)).unwrap();

        let loaded = file.load().unwrap();
        assert_eq!(loaded[0], original);
        assert_eq!(loaded[0].hashed_at_ms(), 0);
        assert_eq!(loaded[0].message_hash(), original.message_hash());
    }

    #[test]
    fn test_empty_snapshot_round_trip() {
        let dir = tempdir().unwrap();
        let file = StoredFile::new(dir.path().join("storedMessages.json"));

        file.save(&[]).unwrap();
        assert!(file.path().exists());
        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let file = StoredFile::new(dir.path().join("nested").join("deeper").join("stored.json"));
        let mut ids = IdSequence::new();

        file.save(&[Message::create(&mut ids, "+27834557896", "x")]).unwrap();
        assert_eq!(file.load().unwrap().len(), 1);
    }

    #[test]
    fn test_file_is_pretty_printed() {
        let dir = tempdir().unwrap();
        let file = StoredFile::new(dir.path().join("storedMessages.json"));
        let mut ids = IdSequence::new();

        file.save(&[Message::create(&mut ids, "+27834557896", "x")]).unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(text.lines().count() > 1);
        assert!(text.contains("\"messageID\": \"MSG00001\""));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storedMessages.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = StoredFile::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Parse { .. }));
    }

    #[test]
    fn test_write_to_directory_fails() {
        let dir = tempdir().unwrap();
        let file = StoredFile::new(dir.path());

        let err = file.save(&[]).unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
    }
}

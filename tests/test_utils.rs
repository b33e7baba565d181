//! Test utilities and fixtures for chatapp
//!
//! Shared helpers for the integration tests: temporary data files and the
//! demonstration payloads.

#![allow(dead_code)]

use chatapp::messaging::MessageStore;
use std::path::PathBuf;
use tempfile::TempDir;

pub const CAKE: &str = "Did you get the cake?";
pub const LATE: &str = "Where are you? You are late! I have asked you to be on time.";
pub const GATE: &str = "Yohoooo, I am at your gate.";
pub const DINNER: &str = "It is dinner time !";
pub const LEAVING: &str = "Ok, I am leaving without you.";

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Path of the stored message file inside `dir`
pub fn data_file(dir: &TempDir) -> PathBuf {
    dir.path().join("storedMessages.json")
}

/// Open a store in a fresh temporary directory
pub fn open_store() -> (TempDir, MessageStore) {
    let dir = temp_dir();
    let store = MessageStore::open(data_file(&dir));
    (dir, store)
}

/// Open a store already loaded with the demonstration messages
pub fn seeded_store() -> (TempDir, MessageStore) {
    let (dir, mut store) = open_store();
    store.populate_test_data().expect("Failed to persist seed data");
    (dir, store)
}

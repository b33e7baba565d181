//! chatapp - Single-user message record manager
//!
//! This library keeps composed messages in three lists (sent, stored,
//! disregarded), answers lookups and reports over them, and mirrors the
//! stored list to a JSON file.

pub mod messaging;

pub use messaging::{Folder, Message, MessageStore, StorageError};

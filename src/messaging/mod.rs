// Message management module
//
// This module owns the message entity, the three message lists and the
// JSON mirror of the stored list, plus the login collaborator and the
// interactive shell that drive them.

pub mod message;
pub mod storage;
pub mod store;
pub mod account;
pub mod cli;
pub mod commands;

pub use message::{message_hash, IdSequence, Message};
pub use storage::{StorageError, StoredFile};
pub use store::{Folder, MessageStore};
pub use account::{Login, User, ValidationError};
pub use cli::{ChatCli, ChatCommand};
pub use commands::{execute_command, Shell};

// Sent, stored and disregarded message lists with cross-list queries

use std::fmt;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use super::message::{IdSequence, Message};
use super::storage::{StorageError, StoredFile};

/// Report returned when there is nothing to list
pub const NO_SENT_MESSAGES: &str = "No sent messages.";

/// Which of the three lists a message lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folder {
    Sent,
    Stored,
    Disregarded,
}

impl Folder {
    /// Union scan order used by every cross-list query
    pub const SCAN_ORDER: [Folder; 3] = [Folder::Sent, Folder::Stored, Folder::Disregarded];

    pub fn as_str(&self) -> &'static str {
        match self {
            Folder::Sent => "sent",
            Folder::Stored => "stored",
            Folder::Disregarded => "disregarded",
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner of the three message lists
///
/// Only the stored list is durable: every change to it rewrites the backing
/// file. A failed write is returned to the caller but the in-memory change
/// is kept, so memory and disk may differ until the next successful write.
pub struct MessageStore {
    sent: Vec<Message>,
    stored: Vec<Message>,
    disregarded: Vec<Message>,
    ids: IdSequence,
    file: StoredFile,
}

impl MessageStore {
    /// Open a store backed by `path`, loading any stored messages
    ///
    /// An unreadable or malformed file is logged and the store starts with
    /// an empty stored list.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let file = StoredFile::new(path);

        let stored = match file.load() {
            Ok(messages) => messages,
            Err(e) => {
                error!("Ignoring stored messages: {}", e);
                Vec::new()
            }
        };

        let mut ids = IdSequence::new();
        for m in &stored {
            ids.observe(m.message_id());
        }

        info!("Opened message store at {:?} ({} stored)", file.path(), stored.len());

        Self {
            sent: Vec::new(),
            stored,
            disregarded: Vec::new(),
            ids,
            file,
        }
    }

    /// Compose a message with the next ID from this store's sequence
    pub fn compose(&mut self, recipient: impl Into<String>, payload: impl Into<String>) -> Message {
        Message::create(&mut self.ids, recipient, payload)
    }

    pub fn sent(&self) -> &[Message] {
        &self.sent
    }

    pub fn stored(&self) -> &[Message] {
        &self.stored
    }

    pub fn disregarded(&self) -> &[Message] {
        &self.disregarded
    }

    pub fn folder(&self, folder: Folder) -> &[Message] {
        match folder {
            Folder::Sent => &self.sent,
            Folder::Stored => &self.stored,
            Folder::Disregarded => &self.disregarded,
        }
    }

    pub fn storage_path(&self) -> &std::path::Path {
        self.file.path()
    }

    pub fn add_sent(&mut self, message: Message) {
        debug!("Sent {}", message.message_id());
        self.ids.observe(message.message_id());
        self.sent.push(message);
    }

    pub fn add_disregarded(&mut self, message: Message) {
        debug!("Disregarded {}", message.message_id());
        self.ids.observe(message.message_id());
        self.disregarded.push(message);
    }

    /// Append to the stored list and rewrite the backing file
    ///
    /// On `Err` the message has still been added in memory.
    pub fn add_stored(&mut self, message: Message) -> Result<(), StorageError> {
        debug!("Stored {}", message.message_id());
        self.ids.observe(message.message_id());
        self.stored.push(message);
        self.persist()
    }

    /// Every message in union scan order (sent, stored, disregarded)
    pub fn iter_all(&self) -> impl Iterator<Item = &Message> {
        Folder::SCAN_ORDER
            .into_iter()
            .flat_map(move |folder| self.folder(folder).iter())
    }

    /// Message with the longest payload; ties go to the first in scan order
    pub fn longest_message(&self) -> Option<&Message> {
        let mut longest: Option<&Message> = None;
        for m in self.iter_all() {
            match longest {
                Some(best) if m.payload_len() <= best.payload_len() => {}
                _ => longest = Some(m),
            }
        }
        longest
    }

    pub fn find_by_id(&self, message_id: &str) -> Option<&Message> {
        self.iter_all().find(|m| m.message_id() == message_id)
    }

    /// Every message addressed exactly to `recipient`, in scan order
    pub fn find_by_recipient(&self, recipient: &str) -> Vec<&Message> {
        self.iter_all()
            .filter(|m| m.recipient() == recipient)
            .collect()
    }

    /// Remove every message carrying `hash` from all three lists
    ///
    /// Returns `Ok(false)` when nothing matched. If the stored list lost a
    /// message it is rewritten; an `Err` means that rewrite failed and the
    /// removal still stands.
    pub fn delete_by_hash(&mut self, hash: &str) -> Result<bool, StorageError> {
        let removed_sent = remove_matching(&mut self.sent, hash);
        let removed_stored = remove_matching(&mut self.stored, hash);
        let removed_disregarded = remove_matching(&mut self.disregarded, hash);

        let total = removed_sent + removed_stored + removed_disregarded;
        if total == 0 {
            debug!("No message with hash {}", hash);
            return Ok(false);
        }

        info!("Deleted {} message(s) with hash {}", total, hash);

        if removed_stored > 0 {
            self.persist()?;
        }

        Ok(true)
    }

    /// One `Hash | Recipient | Message` line per sent message
    pub fn sent_report(&self) -> String {
        if self.sent.is_empty() {
            return NO_SENT_MESSAGES.to_string();
        }

        self.sent
            .iter()
            .map(|m| {
                format!(
                    "Hash: {} | Recipient: {} | Message: {}\n",
                    m.message_hash(),
                    m.recipient(),
                    m.payload()
                )
            })
            .collect()
    }

    /// One `Sender | Recipient` line per sent message
    pub fn sender_recipient_summary(&self) -> String {
        if self.sent.is_empty() {
            return NO_SENT_MESSAGES.to_string();
        }

        self.sent
            .iter()
            .map(|m| format!("Sender: (current user) | Recipient: {}\n", m.recipient()))
            .collect()
    }

    /// Rendered messages of one list, each followed by a separator
    pub fn render_folder(&self, folder: Folder) -> String {
        let messages = self.folder(folder);
        if messages.is_empty() {
            return format!("No {} messages.", folder);
        }
        render_list(messages.iter())
    }

    pub fn all_message_ids(&self) -> Vec<&str> {
        self.iter_all().map(|m| m.message_id()).collect()
    }

    pub fn all_message_hashes(&self) -> Vec<&str> {
        self.iter_all().map(|m| m.message_hash()).collect()
    }

    /// Replace all lists with the five demonstration messages
    ///
    /// Returns the first storage error hit while persisting; the seed data
    /// is installed regardless.
    pub fn populate_test_data(&mut self) -> Result<(), StorageError> {
        self.sent.clear();
        self.stored.clear();
        self.disregarded.clear();

        let mut result = self.persist();

        let m1 = self.compose("+27834557896", "Did you get the cake?");
        self.add_sent(m1);

        let m2 = self.compose(
            "+27838884567",
            "Where are you? You are late! I have asked you to be on time.",
        );
        let stored_m2 = self.add_stored(m2);

        let m3 = self.compose("+27834484567", "Yohoooo, I am at your gate.");
        self.add_disregarded(m3);

        let m4 = self.compose("0838884567", "It is dinner time !");
        self.add_sent(m4);

        let m5 = self.compose("+27838884567", "Ok, I am leaving without you.");
        let stored_m5 = self.add_stored(m5);

        for r in [stored_m2, stored_m5] {
            if result.is_ok() {
                result = r;
            }
        }

        if result.is_err() {
            warn!("Seed data installed but not fully persisted");
        }
        result
    }

    fn persist(&self) -> Result<(), StorageError> {
        self.file.save(&self.stored).map_err(|e| {
            error!("Stored messages not persisted: {}", e);
            e
        })
    }
}

fn remove_matching(list: &mut Vec<Message>, hash: &str) -> usize {
    let before = list.len();
    list.retain(|m| m.message_hash() != hash);
    before - list.len()
}

/// Render messages one after another with a separator line
pub fn render_list<'a>(messages: impl Iterator<Item = &'a Message>) -> String {
    messages
        .map(|m| format!("{}\n-----------------\n", m.render()))
        .collect()
}

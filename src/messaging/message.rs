// Message entity with generated ID and hash

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix of every generated message ID
pub const ID_PREFIX: &str = "MSG";

/// Prefix of every generated message hash
pub const HASH_PREFIX: &str = "HASH";

/// A composed message
///
/// Serialized as a four-field record (`recipient`, `payload`, `messageID`,
/// `messageHash`). The hash timestamp only lives in memory; a message read
/// back from disk reports 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    recipient: String,
    payload: String,
    #[serde(rename = "messageID")]
    message_id: String,
    #[serde(rename = "messageHash")]
    message_hash: String,
    #[serde(skip)]
    hashed_at_ms: u64,
}

impl Message {
    /// Create a message, drawing its ID from `ids`
    pub fn create(ids: &mut IdSequence, recipient: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::with_id(ids.next_id(), recipient, payload)
    }

    /// Create a message with an ID chosen by the caller
    pub fn with_id(
        message_id: impl Into<String>,
        recipient: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        let mut message = Self {
            recipient: recipient.into(),
            payload: payload.into(),
            message_id: message_id.into(),
            message_hash: String::new(),
            hashed_at_ms: 0,
        };
        message.regenerate_hash();
        message
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn message_hash(&self) -> &str {
        &self.message_hash
    }

    /// Milliseconds since the epoch at which the hash was last computed
    ///
    /// Not persisted: a message read back from disk reports 0, so its hash can
    /// only be recomputed from its fields while the original is in memory.
    pub fn hashed_at_ms(&self) -> u64 {
        self.hashed_at_ms
    }

    /// Payload length in characters (not bytes)
    pub fn payload_len(&self) -> usize {
        self.payload.chars().count()
    }

    /// Replace the recipient. The hash is left alone until `regenerate_hash`.
    pub fn set_recipient(&mut self, recipient: impl Into<String>) {
        self.recipient = recipient.into();
    }

    /// Replace the payload. The hash is left alone until `regenerate_hash`.
    pub fn set_payload(&mut self, payload: impl Into<String>) {
        self.payload = payload.into();
    }

    /// Recompute the hash from the current fields and a fresh timestamp
    pub fn regenerate_hash(&mut self) {
        self.hashed_at_ms = now_millis();
        self.message_hash = message_hash(
            &self.message_id,
            &self.recipient,
            &self.payload,
            self.hashed_at_ms,
        );
    }

    /// Four-line display form: ID, hash, recipient, payload
    pub fn render(&self) -> String {
        format!(
            "Message ID: {}\nMessage Hash: {}\nRecipient: {}\nMessage: {}",
            self.message_id, self.message_hash, self.recipient, self.payload
        )
    }
}

// Equality covers the persisted record only.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.recipient == other.recipient
            && self.payload == other.payload
            && self.message_id == other.message_id
            && self.message_hash == other.message_hash
    }
}

impl Eq for Message {}

/// Monotonic message ID counter
///
/// IDs are `MSG` followed by a five-digit, zero-padded sequence number. A
/// sequence never hands out the same number twice.
///
/// Observed IDs above `MAX_OBSERVED_ID` are ignored so that the counter always
/// has room to advance.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    last: u64,
}

/// Largest ID number `IdSequence::observe` will advance to
pub const MAX_OBSERVED_ID: u64 = u32::MAX as u64;

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a sequence whose next ID follows `last`
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: last.min(MAX_OBSERVED_ID),
        }
    }

    /// Number of the most recently issued ID (0 if none)
    pub fn last(&self) -> u64 {
        self.last
    }

    /// Issue the next ID
    pub fn next_id(&mut self) -> String {
        self.last += 1;
        format_id(self.last)
    }

    /// Make sure later IDs sort after an ID that already exists elsewhere
    pub fn observe(&mut self, message_id: &str) {
        match parse_id(message_id) {
            Some(n) if n <= MAX_OBSERVED_ID => self.last = self.last.max(n),
            _ => {}
        }
    }
}

fn format_id(n: u64) -> String {
    format!("{}{:05}", ID_PREFIX, n)
}

fn parse_id(message_id: &str) -> Option<u64> {
    message_id.strip_prefix(ID_PREFIX)?.parse().ok()
}

/// Derive a message hash
///
/// A 32-bit base-31 string hash over `id|recipient|payload|millis`, rendered
/// as `HASH` followed by its absolute value. Not collision-free.
///
/// Reproducible only while the message's `hashed_at_ms` is known, i.e. for
/// messages created in this process.
pub fn message_hash(message_id: &str, recipient: &str, payload: &str, hashed_at_ms: u64) -> String {
    let input = format!("{}|{}|{}|{}", message_id, recipient, payload, hashed_at_ms);
    let h = input
        .chars()
        .fold(0i32, |acc, c| acc.wrapping_mul(31).wrapping_add(c as i32));
    format!("{}{}", HASH_PREFIX, h.unsigned_abs())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

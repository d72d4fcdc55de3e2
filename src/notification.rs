//! # Notification Classification
//!
//! Maps raw ZMQ (topic, payload) frames into semantic lock events.
//!
//! Dash Core publishes the hash payload in internal byte order; the bytes
//! are reversed before hex encoding so the stored identifier matches how
//! the network displays hashes. An optional trailing 4-byte little-endian
//! frame carries the publisher's sequence counter.

use chrono::{DateTime, Utc};

use crate::error::MonitorError;

/// The four subscribed notification topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    HashBlock,
    HashChainLock,
    HashTx,
    HashTxLock,
}

impl Topic {
    /// All topics the SUB socket subscribes to.
    pub const ALL: [Topic; 4] = [
        Topic::HashBlock,
        Topic::HashChainLock,
        Topic::HashTx,
        Topic::HashTxLock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::HashBlock => "hashblock",
            Topic::HashChainLock => "hashchainlock",
            Topic::HashTx => "hashtx",
            Topic::HashTxLock => "hashtxlock",
        }
    }

    /// Parse a raw topic frame. Returns `None` for topics outside the
    /// subscription filter; the socket should never deliver one, so the
    /// caller treats it as a defensive drop rather than an error.
    pub fn from_frame(frame: &[u8]) -> Option<Self> {
        match frame {
            b"hashblock" => Some(Topic::HashBlock),
            b"hashchainlock" => Some(Topic::HashChainLock),
            b"hashtx" => Some(Topic::HashTx),
            b"hashtxlock" => Some(Topic::HashTxLock),
            _ => None,
        }
    }

    /// Whether this topic targets the blocks table (vs. transactions).
    pub fn is_block_scoped(&self) -> bool {
        matches!(self, Topic::HashBlock | Topic::HashChainLock)
    }

    /// Whether this topic asserts a lock (ChainLock or InstantLock).
    pub fn is_lock(&self) -> bool {
        matches!(self, Topic::HashChainLock | Topic::HashTxLock)
    }
}

/// A raw multipart notification as delivered by the transport.
#[derive(Debug, Clone)]
pub struct RawNotification {
    pub topic: Vec<u8>,
    pub body: Vec<u8>,
    pub sequence: Option<u32>,
}

impl RawNotification {
    /// Build from ZMQ multipart frames: topic, body, optional 4-byte
    /// little-endian sequence counter.
    pub fn from_frames(mut frames: Vec<Vec<u8>>) -> Result<Self, MonitorError> {
        if frames.len() < 2 {
            return Err(MonitorError::malformed(format!(
                "expected at least 2 frames, got {}",
                frames.len()
            )));
        }

        let has_sequence = frames.len() > 2 && frames.last().map_or(false, |f| f.len() == 4);
        let sequence = if has_sequence {
            let last = frames.pop().expect("length checked");
            let bytes: [u8; 4] = last.try_into().expect("length checked");
            Some(u32::from_le_bytes(bytes))
        } else {
            None
        };

        let body = frames.swap_remove(1);
        let topic = frames.swap_remove(0);

        if body.is_empty() {
            return Err(MonitorError::malformed("empty hash payload"));
        }

        Ok(Self {
            topic,
            body,
            sequence,
        })
    }

    /// Sequence counter rendered for logging ("unknown" when absent).
    pub fn sequence_label(&self) -> String {
        match self.sequence {
            Some(seq) => seq.to_string(),
            None => "unknown".to_string(),
        }
    }
}

/// A classified notification ready for dispatch.
#[derive(Debug, Clone)]
pub struct LockEvent {
    pub topic: Topic,
    /// Display-order hex hash, the primary key in storage.
    pub hash: String,
    pub observed_at: DateTime<Utc>,
    pub sequence: Option<u32>,
}

impl LockEvent {
    /// Lock status implied by the topic.
    pub fn lock_status(&self) -> bool {
        self.topic.is_lock()
    }

    /// Lock-seen timestamp: set exactly when the topic asserts a lock.
    pub fn lock_seen_at(&self) -> Option<DateTime<Utc>> {
        self.topic.is_lock().then_some(self.observed_at)
    }
}

/// Hex-encode a hash payload in display order (reversed byte sequence).
pub fn display_hash(body: &[u8]) -> String {
    let mut bytes = body.to_vec();
    bytes.reverse();
    hex::encode(bytes)
}

/// Classify a raw notification. Unknown topics yield `None` so the
/// dispatcher can drop them without treating the message as malformed.
pub fn classify(raw: &RawNotification) -> Option<LockEvent> {
    let topic = Topic::from_frame(&raw.topic)?;

    Some(LockEvent {
        topic,
        hash: display_hash(&raw.body),
        observed_at: Utc::now(),
        sequence: raw.sequence,
    })
}

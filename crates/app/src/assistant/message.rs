use chrono::{DateTime, Utc};

/// Stable identifier for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Creates a typed message identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Identifier for one send attempt.
///
/// A retry gets a new ticket, so completions of an abandoned attempt can be
/// recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SendTicket(pub u64);

impl SendTicket {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
        }
    }
}

/// One conversation turn. Never mutated after it is committed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(
        id: MessageId,
        role: Role,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            timestamp,
        }
    }

    pub fn user(id: MessageId, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(id, Role::User, content, timestamp)
    }

    pub fn assistant(id: MessageId, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(id, Role::Assistant, content, timestamp)
    }

    /// `HH:MM` (UTC) shown next to the speaker label.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

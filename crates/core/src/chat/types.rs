//! Core data types for the chat system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Create a new random message ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Who wrote a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub display_name: String,
    pub avatar_url: String,
}

/// A geolocation fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// A single chat message. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Text body; empty for attachment-only messages.
    #[serde(default)]
    pub text: String,
    /// When the message was created (UTC).
    pub created_at: DateTime<Utc>,
    /// Author of the message.
    pub author: Author,
    /// URL of an uploaded image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Shared location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl Message {
    /// Whether the message carries any text, image or location.
    pub fn has_content(&self) -> bool {
        !self.text.is_empty() || self.image.is_some() || self.location.is_some()
    }

    /// Check if this message was written by the given user.
    pub fn is_from(&self, user_id: &str) -> bool {
        self.author.id == user_id
    }
}

/// Newest-first sequence of messages.
pub type Timeline = Vec<Message>;

/// Message payload before id, timestamp and author are stamped on.
///
/// Attachment capture produces drafts with only `image` or only `location`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageDraft {
    pub text: String,
    pub image: Option<String>,
    pub location: Option<GeoPoint>,
}

impl MessageDraft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self {
            image: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn location(point: GeoPoint) -> Self {
        Self {
            location: Some(point),
            ..Self::default()
        }
    }
}

/// Identity bound to a display name for the lifetime of a chat screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: String,
}

impl Session {
    /// The author stamped on messages sent in this session.
    pub fn author(&self) -> Author {
        Author {
            id: self.user_id.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }

    /// Status line shown once the session is ready.
    pub fn greeting(&self) -> String {
        format!("{} has entered the chat", self.display_name)
    }

    /// Stamp a draft with a fresh id, the current time and this session's author.
    pub fn compose(&self, draft: MessageDraft) -> Message {
        Message {
            id: MessageId::new(),
            text: draft.text,
            created_at: Utc::now(),
            author: self.author(),
            image: draft.image,
            location: draft.location,
        }
    }
}

/// Author block of a remote document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordUser {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

/// Document shape stored in the remote message collection.
///
/// Absent text and image are written as `""` and an absent location as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub user: RecordUser,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

impl From<&Message> for MessageRecord {
    fn from(msg: &Message) -> Self {
        Self {
            id: msg.id.0.clone(),
            text: msg.text.clone(),
            created_at: msg.created_at,
            user: RecordUser {
                id: msg.author.id.clone(),
                name: msg.author.display_name.clone(),
                avatar: msg.author.avatar_url.clone(),
            },
            image: msg.image.clone().unwrap_or_default(),
            location: msg.location,
        }
    }
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: MessageId(record.id),
            text: record.text,
            created_at: record.created_at,
            author: Author {
                id: record.user.id,
                display_name: record.user.name,
                avatar_url: record.user.avatar,
            },
            image: Some(record.image).filter(|url| !url.is_empty()),
            location: record.location,
        }
    }
}

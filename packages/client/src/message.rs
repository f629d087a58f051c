//! The chat payload schema spoken between idobata clients.
//!
//! The relay server forwards frames verbatim and never parses them; this
//! schema is a client-side convention only. Wire field names are `id`,
//! `senderId`, `content`, `isImage` and `timestamp`.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use idobata_shared::time::now_unix_millis;

/// Prefix marking base64-encoded binary data in an image payload's content.
pub const BASE64_PREFIX: &str = "base64:";

/// One chat message as exchanged between clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    /// Unique message identifier (UUID v4)
    pub id: String,
    /// Sender tag chosen by the sending client (e.g., "User_42")
    pub sender_id: String,
    /// Message text, or `base64:`-prefixed encoded bytes when `is_image`
    pub content: String,
    /// Whether `content` carries an encoded image
    pub is_image: bool,
    /// Unix timestamp when the message was sent (milliseconds)
    pub timestamp: i64,
}

impl ChatPayload {
    /// Create a text message with a fresh id and the current timestamp.
    pub fn text(sender_id: &str, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.to_string(),
            content,
            is_image: false,
            timestamp: now_unix_millis(),
        }
    }

    /// Create an image message by base64-encoding the given bytes.
    pub fn image(sender_id: &str, bytes: &[u8]) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.to_string(),
            content: format!("{}{}", BASE64_PREFIX, STANDARD.encode(bytes)),
            is_image: true,
            timestamp: now_unix_millis(),
        }
    }

    /// Decode the embedded image bytes, if this is a well-formed image
    /// payload. Returns `None` for text payloads and for image payloads
    /// whose content is missing the prefix or not valid base64.
    pub fn image_bytes(&self) -> Option<Vec<u8>> {
        if !self.is_image {
            return None;
        }
        let encoded = self.content.strip_prefix(BASE64_PREFIX)?;
        STANDARD.decode(encoded).ok()
    }
}

/// Generate the default sender tag: `User_` followed by two random digits.
pub fn default_sender_tag() -> String {
    let digits = 10 + (Uuid::new_v4().as_u128() % 90) as u8;
    format!("User_{}", digits)
}

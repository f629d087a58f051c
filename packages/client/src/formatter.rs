//! Message formatting utilities for client display.

use idobata_shared::time::millis_to_rfc3339;

use crate::message::ChatPayload;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a chat payload for display.
    ///
    /// Image payloads render as a placeholder naming the decoded byte count;
    /// a terminal has no bitmap to show. An image payload whose content does
    /// not decode falls back to the raw content.
    ///
    /// # Arguments
    ///
    /// * `payload` - The received chat payload
    ///
    /// # Returns
    ///
    /// A formatted string with the chat message
    pub fn format_chat_message(payload: &ChatPayload) -> String {
        let shown = if payload.is_image {
            match payload.image_bytes() {
                Some(bytes) => format!("[image, {} bytes]", bytes.len()),
                None => payload.content.clone(),
            }
        } else {
            payload.content.clone()
        };

        let timestamp_str = millis_to_rfc3339(payload.timestamp);
        format!(
            "\n\n------------------------------------------------------------\n\
             @{}: {}\n\
             sent at {}\n\
             ------------------------------------------------------------\n",
            payload.sender_id, shown, timestamp_str
        )
    }

    /// Format a confirmation message after sending
    ///
    /// # Arguments
    ///
    /// * `sent_at` - Unix timestamp when the message was sent (milliseconds)
    ///
    /// # Returns
    ///
    /// A formatted string with the sent confirmation
    pub fn format_sent_confirmation(sent_at: i64) -> String {
        let timestamp_str = millis_to_rfc3339(sent_at);
        format!("sent at {}\n", timestamp_str)
    }

    /// Format a binary frame notification
    ///
    /// # Arguments
    ///
    /// * `byte_count` - The number of bytes received
    ///
    /// # Returns
    ///
    /// A formatted string with the binary data notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text frame (when parsing as a chat payload fails)
    ///
    /// The relay forwards arbitrary text, so anything can arrive here.
    ///
    /// # Arguments
    ///
    /// * `text` - The raw text received
    ///
    /// # Returns
    ///
    /// A formatted string with the raw message
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_payload(sender: &str, content: &str) -> ChatPayload {
        ChatPayload {
            id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            sender_id: sender.to_string(),
            content: content.to_string(),
            is_image: false,
            timestamp: 1_672_498_800_000,
        }
    }

    #[test]
    fn test_format_chat_message() {
        // テスト項目: チャットメッセージが正しくフォーマットされる
        // given (前提条件):
        let payload = text_payload("User_42", "Hello, world!");

        // when (操作):
        let result = MessageFormatter::format_chat_message(&payload);

        // then (期待する結果):
        assert!(result.contains("@User_42:"));
        assert!(result.contains("Hello, world!"));
        assert!(result.contains("sent at"));
        assert!(result.contains(&millis_to_rfc3339(1_672_498_800_000)));
        assert!(result.contains("------------------------------------------------------------"));
    }

    #[test]
    fn test_format_chat_message_renders_image_placeholder() {
        // テスト項目: 画像ペイロードがバイト数付きプレースホルダで表示される
        // given (前提条件):
        let payload = ChatPayload::image("User_42", &[1, 2, 3, 4, 5]);

        // when (操作):
        let result = MessageFormatter::format_chat_message(&payload);

        // then (期待する結果):
        assert!(result.contains("[image, 5 bytes]"));
        assert!(!result.contains("base64:"));
    }

    #[test]
    fn test_format_chat_message_falls_back_on_undecodable_image() {
        // テスト項目: デコードできない画像ペイロードは内容をそのまま表示する
        // given (前提条件):
        let mut payload = text_payload("User_42", "base64:!!not-base64!!");
        payload.is_image = true;

        // when (操作):
        let result = MessageFormatter::format_chat_message(&payload);

        // then (期待する結果):
        assert!(result.contains("base64:!!not-base64!!"));
    }

    #[test]
    fn test_format_sent_confirmation() {
        // テスト項目: 送信確認メッセージが正しくフォーマットされる
        // given (前提条件):
        let sent_at = 1_672_498_800_000;

        // when (操作):
        let result = MessageFormatter::format_sent_confirmation(sent_at);

        // then (期待する結果):
        assert!(result.contains("sent at"));
        assert!(result.contains(&millis_to_rfc3339(sent_at)));
    }

    #[test]
    fn test_format_binary_message() {
        // テスト項目: バイナリフレーム通知が正しくフォーマットされる
        // given (前提条件):
        let byte_count = 1024;

        // when (操作):
        let result = MessageFormatter::format_binary_message(byte_count);

        // then (期待する結果):
        assert!(result.contains("1024 bytes"));
        assert!(result.contains("Received"));
    }

    #[test]
    fn test_format_raw_message() {
        // テスト項目: 生メッセージが正しくフォーマットされる
        // given (前提条件):
        let text = "unknown message format";

        // when (操作):
        let result = MessageFormatter::format_raw_message(text);

        // then (期待する結果):
        assert!(result.contains("unknown message format"));
        assert!(result.contains("Received:"));
    }
}

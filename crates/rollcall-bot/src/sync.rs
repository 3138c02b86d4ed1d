//! Canonical status message synchronization.
//!
//! One chat message is treated as the live view of roster state. After every
//! mutation the new text is pushed there: edit in place while the tracked
//! message is still editable, fall back to sending a fresh message (and
//! re-pointing the tracker at it) when the edit fails: deleted message,
//! rejected edit, transport error alike.
//!
//! The tracked id is persisted with the roster so a restart resumes editing
//! the same message; a stale id simply degrades to the send-new path on the
//! next publish.

use crate::error::Result;
use crate::telegram::{ChatIo, InlineKeyboardMarkup, ReplyMarkup};

/// Tracker for the canonical status message of one chat.
///
/// `None` means no message is known yet (nothing sent, or the tracker was
/// reset); `Some(id)` means subsequent publishes try to edit `id` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMessage {
    tracked: Option<i64>,
}

impl StatusMessage {
    /// Resume tracking a persisted message id, if any.
    pub fn new(tracked: Option<i64>) -> Self {
        Self { tracked }
    }

    /// The currently tracked message id.
    pub fn tracked(&self) -> Option<i64> {
        self.tracked
    }

    /// Point the tracker at a freshly sent message.
    pub fn track(&mut self, message_id: i64) {
        self.tracked = Some(message_id);
    }

    /// Push new status text to the chat, editing in place when possible.
    ///
    /// Returns `true` when the tracked id changed and must be re-persisted.
    /// An error here means even the fallback send failed; the caller logs it
    /// and moves on; the roster mutation is never rolled back.
    pub async fn publish<T: ChatIo>(
        &mut self,
        io: &T,
        chat_id: i64,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<bool> {
        if let Some(id) = self.tracked {
            match io.edit_message(chat_id, id, text, Some(keyboard.clone())).await {
                Ok(()) => return Ok(false),
                Err(err) => {
                    tracing::warn!("edit of status message {id} failed ({err}), sending a new one");
                }
            }
        }

        let new_id = io
            .send_message(chat_id, text, Some(ReplyMarkup::Inline(keyboard)))
            .await?;
        self.tracked = Some(new_id);
        Ok(true)
    }
}

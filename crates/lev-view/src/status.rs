// SPDX-License-Identifier: MIT
//
// Timed status messages shown on the bottom screen row.

use std::time::{Duration, Instant};

/// How long a message stays on screen after being set.
pub const MESSAGE_TIMEOUT: Duration = Duration::from_secs(3);

/// A transient one-line message with the moment it was set.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    text: String,
    set_at: Instant,
}

impl StatusMessage {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            set_at: Instant::now(),
        }
    }

    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True while the message is younger than [`MESSAGE_TIMEOUT`].
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.is_visible_at(Instant::now())
    }

    #[must_use]
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.duration_since(self.set_at) < MESSAGE_TIMEOUT
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn fresh_message_is_visible() {
        let msg = StatusMessage::new("C-x C-c to quit");
        assert!(msg.is_visible());
        assert_eq!(msg.text(), "C-x C-c to quit");
    }

    #[test]
    fn message_expires_after_timeout() {
        let msg = StatusMessage::new("End of buffer");
        let later = msg.set_at + MESSAGE_TIMEOUT + Duration::from_millis(1);
        assert!(!msg.is_visible_at(later));
    }

    #[test]
    fn message_visible_just_before_timeout() {
        let msg = StatusMessage::new("x");
        let almost = msg.set_at + MESSAGE_TIMEOUT - Duration::from_millis(1);
        assert!(msg.is_visible_at(almost));
    }
}

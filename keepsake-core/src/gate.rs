//! Passphrase gate shared by the outer secret-code card and every treasure
//! hunt code page.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CHANCES, PUNISHMENT_BANNER, PUNISHMENT_BANNER_MS, REJECTION_MESSAGE_MS,
    rejection_message,
};
use crate::effects::{Effect, ExpiringMessage, MessageTone, visible_text};

/// Result of a single passphrase submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateOutcome {
    /// The candidate matched; chances are restored for the next gate.
    Accepted,
    /// Wrong phrase, some chances remain.
    Rejected { chances_left: u8 },
    /// Wrong phrase with the last chance: the tally grew and chances reset.
    Exhausted { total_failures: u32 },
}

impl GateOutcome {
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// One "enter the secret phrase" challenge with its chance counter and the
/// running failure tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassphraseGate {
    expected: String,
    chances_remaining: u8,
    total_failures: u32,
}

impl PassphraseGate {
    #[must_use]
    pub fn new(expected: impl Into<String>) -> Self {
        Self::with_tally(expected, 0)
    }

    /// Build a gate that continues an existing failure tally.
    #[must_use]
    pub fn with_tally(expected: impl Into<String>, total_failures: u32) -> Self {
        Self {
            expected: expected.into(),
            chances_remaining: DEFAULT_CHANCES,
            total_failures,
        }
    }

    /// Point the gate at a new phrase. Chances are restored, the tally is kept.
    pub fn rearm(&mut self, expected: impl Into<String>) {
        self.expected = expected.into();
        self.chances_remaining = DEFAULT_CHANCES;
    }

    pub fn submit(&mut self, candidate: &str) -> GateOutcome {
        if phrases_match(candidate, &self.expected) {
            self.chances_remaining = DEFAULT_CHANCES;
            return GateOutcome::Accepted;
        }

        self.chances_remaining = self.chances_remaining.saturating_sub(1);
        if self.chances_remaining > 0 {
            return GateOutcome::Rejected {
                chances_left: self.chances_remaining,
            };
        }

        self.total_failures = self.total_failures.saturating_add(1);
        self.chances_remaining = DEFAULT_CHANCES;
        GateOutcome::Exhausted {
            total_failures: self.total_failures,
        }
    }

    #[must_use]
    pub const fn chances_remaining(&self) -> u8 {
        self.chances_remaining
    }

    #[must_use]
    pub const fn total_failures(&self) -> u32 {
        self.total_failures
    }

    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }
}

/// Case-insensitive exact comparison. Whitespace is significant.
#[must_use]
pub fn phrases_match(candidate: &str, expected: &str) -> bool {
    candidate.to_lowercase() == expected.to_lowercase()
}

/// Transient status line and punishment banner attached to whichever gate
/// is on screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateFeedback {
    status: Option<ExpiringMessage>,
    punishment: Option<ExpiringMessage>,
}

impl GateFeedback {
    /// Update the visible feedback for a submission result.
    pub fn record(&mut self, outcome: GateOutcome, now: DateTime<Utc>) -> Option<Effect> {
        match outcome {
            GateOutcome::Accepted => {
                self.status = None;
                None
            }
            GateOutcome::Rejected { chances_left } => {
                self.status = Some(ExpiringMessage::new(
                    rejection_message(chances_left),
                    MessageTone::Error,
                    now,
                    REJECTION_MESSAGE_MS,
                ));
                None
            }
            GateOutcome::Exhausted { .. } => {
                self.status = Some(ExpiringMessage::new(
                    rejection_message(DEFAULT_CHANCES),
                    MessageTone::Error,
                    now,
                    REJECTION_MESSAGE_MS,
                ));
                self.punishment = Some(ExpiringMessage::new(
                    PUNISHMENT_BANNER,
                    MessageTone::Error,
                    now,
                    PUNISHMENT_BANNER_MS,
                ));
                Some(Effect::Punishment)
            }
        }
    }

    pub fn announce(&mut self, text: impl Into<String>, now: DateTime<Utc>, window_ms: i64) {
        self.status = Some(ExpiringMessage::new(
            text,
            MessageTone::Info,
            now,
            window_ms,
        ));
    }

    pub fn clear(&mut self) {
        self.status = None;
        self.punishment = None;
    }

    #[must_use]
    pub fn status(&self) -> Option<&ExpiringMessage> {
        self.status.as_ref()
    }

    #[must_use]
    pub fn status_text(&self, now: DateTime<Utc>) -> Option<&str> {
        visible_text(self.status.as_ref(), now)
    }

    #[must_use]
    pub fn punishment_visible(&self, now: DateTime<Utc>) -> bool {
        self.punishment
            .as_ref()
            .is_some_and(|banner| banner.is_visible(now))
    }
}

//! Centralized timing and gating constants for Keepsake card logic.
//!
//! Display windows are expressed in milliseconds and converted to
//! `chrono::Duration` at the call site.

// Gating -------------------------------------------------------------------
pub const DEFAULT_CHANCES: u8 = 3;

// Display windows ------------------------------------------------------------
pub const REJECTION_MESSAGE_MS: i64 = 4_000;
pub const UNLOCK_MESSAGE_MS: i64 = 3_000;
pub const PUNISHMENT_BANNER_MS: i64 = 4_000;
pub const CONFETTI_FULL_MS: i64 = 2_000;
pub const CONFETTI_FADE_MS: i64 = 2_000;

// Celebration ----------------------------------------------------------------
pub const DEFAULT_LOADER_MS: i64 = 3_000;
pub const MAX_LOADER_MS: i64 = 60_000;
pub const FALLBACK_COUNTDOWN_SECS: u32 = 10;

// Messages -------------------------------------------------------------------
pub const UNLOCK_MESSAGE: &str = "🎉 Gift Unlocked!";
pub const PUNISHMENT_BANNER: &str = "Punishment: +1 punch 👊";

#[must_use]
pub fn rejection_message(chances_left: u8) -> String {
    format!("Oops! That's not the right code. {chances_left} chances left!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_names_remaining_chances() {
        assert_eq!(
            rejection_message(2),
            "Oops! That's not the right code. 2 chances left!"
        );
    }
}

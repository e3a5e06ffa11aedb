//! Cosmetic effect state: auto-dismissing messages, confetti bursts and the
//! background audio switch.
//!
//! Nothing here owns a timer. Each value records when it started or expires
//! and the render layer asks whether it is still visible at `now`.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{CONFETTI_FADE_MS, CONFETTI_FULL_MS};

/// Side effects emitted by state transitions for the render layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    StartAudio,
    Confetti,
    Punishment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTone {
    Info,
    Error,
}

/// A status line that hides itself once `expires_at` is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringMessage {
    pub text: String,
    pub tone: MessageTone,
    pub expires_at: DateTime<Utc>,
}

impl ExpiringMessage {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        tone: MessageTone,
        now: DateTime<Utc>,
        window_ms: i64,
    ) -> Self {
        Self {
            text: text.into(),
            tone,
            expires_at: now + Duration::milliseconds(window_ms),
        }
    }

    #[must_use]
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Text of an optional message if it is still visible.
#[must_use]
pub fn visible_text(message: Option<&ExpiringMessage>, now: DateTime<Utc>) -> Option<&str> {
    message
        .filter(|msg| msg.is_visible(now))
        .map(|msg| msg.text.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConfettiPhase {
    Full,
    Fading { opacity: f32 },
    Gone,
}

/// Confetti shown at full opacity, then faded out, then removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfettiBurst {
    pub started_at: DateTime<Utc>,
}

impl ConfettiBurst {
    #[must_use]
    pub const fn new(started_at: DateTime<Utc>) -> Self {
        Self { started_at }
    }

    #[must_use]
    pub fn phase(&self, now: DateTime<Utc>) -> ConfettiPhase {
        let elapsed = (now - self.started_at).num_milliseconds().max(0);
        if elapsed < CONFETTI_FULL_MS {
            return ConfettiPhase::Full;
        }
        let fading = elapsed - CONFETTI_FULL_MS;
        if fading < CONFETTI_FADE_MS {
            #[allow(clippy::cast_precision_loss)]
            let opacity = 1.0 - (fading as f32 / CONFETTI_FADE_MS as f32);
            return ConfettiPhase::Fading { opacity };
        }
        ConfettiPhase::Gone
    }

    #[must_use]
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        !matches!(self.phase(now), ConfettiPhase::Gone)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioState {
    #[default]
    Stopped,
    Playing,
    Paused,
    /// The platform refused autoplay; playback waits for the first click.
    AwaitingInteraction,
}

/// Background music switch. Playback itself belongs to the render layer,
/// which reports autoplay refusals through [`BackgroundAudio::autoplay_blocked`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackgroundAudio {
    pub source: String,
    state: AudioState,
}

impl BackgroundAudio {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            state: AudioState::Stopped,
        }
    }

    #[must_use]
    pub const fn state(&self) -> AudioState {
        self.state
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        matches!(self.state, AudioState::Playing)
    }

    pub fn start(&mut self) {
        if matches!(self.state, AudioState::Stopped | AudioState::Paused) {
            self.state = AudioState::Playing;
        }
    }

    pub fn autoplay_blocked(&mut self) {
        log::debug!("autoplay refused for {}", self.source);
        self.state = AudioState::AwaitingInteraction;
    }

    /// Any click on the page resumes playback that autoplay refused.
    pub fn first_interaction(&mut self) {
        if self.state == AudioState::AwaitingInteraction {
            self.state = AudioState::Playing;
        }
    }

    /// The mute/unmute button.
    pub fn toggle(&mut self) {
        self.state = match self.state {
            AudioState::Playing => AudioState::Paused,
            AudioState::Stopped | AudioState::Paused | AudioState::AwaitingInteraction => {
                AudioState::Playing
            }
        };
    }
}

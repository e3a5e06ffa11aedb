//! Keepsake Card Engine
//!
//! Platform-agnostic navigation logic for a digital greeting card: the outer
//! question cards, a celebration countdown, a secret passphrase and a story
//! book with a gated treasure hunt. Rendering, animation and audio playback
//! belong to the embedding layer.

pub mod book;
pub mod config;
pub mod constants;
pub mod countdown;
pub mod effects;
pub mod gate;
pub mod outer;
pub mod session;
pub mod summary;
pub mod treasure;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use book::{Affordances, NavError, StoryBook};
pub use config::{
    CardConfig, ConfigError, GallerySlot, Page, PageKind, RewardMedia, TimelineEntry,
};
pub use countdown::{Countdown, CountdownTick, TimeLeft, time_left};
pub use effects::{
    AudioState, BackgroundAudio, ConfettiBurst, ConfettiPhase, Effect, ExpiringMessage,
    MessageTone,
};
pub use gate::{GateFeedback, GateOutcome, PassphraseGate, phrases_match};
pub use outer::{CardEvent, CardState, CelebrationView, FlowError, OuterFlow, Transition};
pub use session::{CardSession, SessionSnapshot};
pub use summary::{PunchTier, SummaryVerdict, summary_verdict};
pub use treasure::{TreasureRange, TreasureSlot};

/// Trait for abstracting where card configuration comes from.
/// Platform-specific implementations should provide this
pub trait CardLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the card configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or parsed.
    fn load_card(&self) -> Result<CardConfig, Self::Error>;
}

/// Card configurations bundled with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    Classic,
    Riddles,
}

impl Preset {
    pub const ALL: [Self; 2] = [Self::Classic, Self::Riddles];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Riddles => "riddles",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "riddles" | "riddle" => Ok(Self::Riddles),
            other => Err(format!("unknown preset '{other}' (expected classic or riddles)")),
        }
    }
}

impl CardLoader for Preset {
    type Error = serde_json::Error;

    fn load_card(&self) -> Result<CardConfig, Self::Error> {
        match self {
            Self::Classic => CardConfig::classic(),
            Self::Riddles => CardConfig::riddles(),
        }
    }
}

/// Entry point for creating card sessions from a loader.
pub struct CardEngine<L>
where
    L: CardLoader,
{
    loader: L,
}

impl<L> CardEngine<L>
where
    L: CardLoader,
{
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load and validate the configuration without starting a session.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the configuration is inconsistent.
    pub fn load_config(&self) -> anyhow::Result<CardConfig> {
        let config = self
            .loader
            .load_card()
            .context("failed to load card configuration")?;
        config
            .validate()
            .with_context(|| format!("card '{}' failed validation", config.title))?;
        Ok(config)
    }

    /// Start a fresh session on the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the configuration is inconsistent;
    /// a mismatched card never starts.
    pub fn create_session(&self) -> anyhow::Result<CardSession> {
        let config = self.load_config()?;
        log::debug!("starting session for card '{}'", config.title);
        CardSession::new(config).context("card session refused to start")
    }
}

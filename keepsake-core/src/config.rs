//! Static card configuration: pages, treasure range, passphrases and the
//! celebration target.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::constants::{DEFAULT_LOADER_MS, MAX_LOADER_MS};
use crate::treasure::{TreasureRange, TreasureSlot};

const CLASSIC_PRESET: &str = include_str!("../assets/classic.json");
const RIDDLES_PRESET: &str = include_str!("../assets/riddles.json");

/// Visual unlocked by a reward page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewardMedia {
    Image { src: String },
    Video { src: String },
}

impl RewardMedia {
    #[must_use]
    pub fn src(&self) -> &str {
        match self {
            Self::Image { src } | Self::Video { src } => src,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageKind {
    Cover,
    Journey,
    TimeTogether,
    Gallery,
    Letter,
    Code {
        gift: usize,
        #[serde(default)]
        prompt: Option<String>,
    },
    Reward {
        gift: usize,
        media: RewardMedia,
    },
    Summary,
    Final,
}

impl PageKind {
    #[must_use]
    pub const fn treasure_slot(&self) -> Option<TreasureSlot> {
        match self {
            Self::Code { gift, .. } => Some(TreasureSlot::Code { gift: *gift }),
            Self::Reward { gift, .. } => Some(TreasureSlot::Reward { gift: *gift }),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Journey => "journey",
            Self::TimeTogether => "time_together",
            Self::Gallery => "gallery",
            Self::Letter => "letter",
            Self::Code { .. } => "code",
            Self::Reward { .. } => "reward",
            Self::Summary => "summary",
            Self::Final => "final",
        }
    }
}

/// One authored page in the story book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    pub kind: PageKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: String,
    pub event: String,
    #[serde(default)]
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GallerySlot {
    pub id: u32,
    pub src: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Errors raised when card configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("card has no pages")]
    NoPages,
    #[error("treasure range {start}..={end} is inverted")]
    InvertedRange { start: usize, end: usize },
    #[error("treasure range ends at page {end} but the card has {page_count} pages")]
    RangeOutOfBounds { end: usize, page_count: usize },
    #[error("treasure range {start}..={end} spans an odd number of pages")]
    OddRange { start: usize, end: usize },
    #[error("treasure range holds {slots} gifts but {codes} gift codes are configured")]
    GiftCountMismatch { slots: usize, codes: usize },
    #[error("page {index} ({key}) should be a {expected} page for gift {gift}")]
    PageKindMismatch {
        index: usize,
        key: String,
        expected: &'static str,
        gift: usize,
    },
    #[error("page {index} ({key}) is a treasure page outside the treasure range")]
    StrayTreasurePage { index: usize, key: String },
    #[error("last page must be the final page, found {key}")]
    MissingFinalPage { key: String },
    #[error("gift code {gift} is empty")]
    EmptyGiftCode { gift: usize },
    #[error("outer passphrase is empty")]
    EmptyPassphrase,
    #[error("loader duration {loader_ms} ms is outside 0..={max} ms", max = MAX_LOADER_MS)]
    InvalidLoaderDuration { loader_ms: i64 },
    #[error("gallery slot {id} is listed more than once")]
    DuplicateGallerySlot { id: u32 },
}

/// Complete static description of one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardConfig {
    pub title: String,
    pub celebration_target: DateTime<Utc>,
    #[serde(default = "CardConfig::default_loader_ms")]
    pub loader_ms: i64,
    pub outer_passphrase: String,
    pub audio_source: String,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    #[serde(default)]
    pub gallery: Vec<GallerySlot>,
    pub pages: Vec<Page>,
    pub treasure: TreasureRange,
    pub gift_codes: Vec<String>,
}

impl CardConfig {
    const fn default_loader_ms() -> i64 {
        DEFAULT_LOADER_MS
    }

    /// Load a card configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a card.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Thirteen plain gift codes with image rewards.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded preset fails to parse.
    pub fn classic() -> Result<Self, serde_json::Error> {
        Self::from_json(CLASSIC_PRESET)
    }

    /// Riddle prompts on each code page and a video reward.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded preset fails to parse.
    pub fn riddles() -> Result<Self, serde_json::Error> {
        Self::from_json(RIDDLES_PRESET)
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Check every structural invariant the navigation engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some(last) = self.pages.last() else {
            return Err(ConfigError::NoPages);
        };
        if self.outer_passphrase.is_empty() {
            return Err(ConfigError::EmptyPassphrase);
        }
        if !(0..=MAX_LOADER_MS).contains(&self.loader_ms) {
            return Err(ConfigError::InvalidLoaderDuration {
                loader_ms: self.loader_ms,
            });
        }
        self.validate_treasure()?;
        if last.kind != PageKind::Final {
            return Err(ConfigError::MissingFinalPage {
                key: last.key.clone(),
            });
        }
        let mut seen = HashSet::new();
        for slot in &self.gallery {
            if !seen.insert(slot.id) {
                return Err(ConfigError::DuplicateGallerySlot { id: slot.id });
            }
        }
        Ok(())
    }

    fn validate_treasure(&self) -> Result<(), ConfigError> {
        let TreasureRange { start, end } = self.treasure;
        if start > end {
            return Err(ConfigError::InvertedRange { start, end });
        }
        if end >= self.pages.len() {
            return Err(ConfigError::RangeOutOfBounds {
                end,
                page_count: self.pages.len(),
            });
        }
        if self.treasure.len() % 2 != 0 {
            return Err(ConfigError::OddRange { start, end });
        }
        if self.treasure.gift_count() != self.gift_codes.len() {
            return Err(ConfigError::GiftCountMismatch {
                slots: self.treasure.gift_count(),
                codes: self.gift_codes.len(),
            });
        }
        if let Some(gift) = self.gift_codes.iter().position(String::is_empty) {
            return Err(ConfigError::EmptyGiftCode { gift });
        }

        for (index, page) in self.pages.iter().enumerate() {
            let declared = page.kind.treasure_slot();
            match self.treasure.slot(index) {
                Some(expected) if declared != Some(expected) => {
                    return Err(ConfigError::PageKindMismatch {
                        index,
                        key: page.key.clone(),
                        expected: if expected.is_code() { "code" } else { "reward" },
                        gift: expected.gift(),
                    });
                }
                None if declared.is_some() => {
                    return Err(ConfigError::StrayTreasurePage {
                        index,
                        key: page.key.clone(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn gallery_slot(&self, id: u32) -> Option<&GallerySlot> {
        self.gallery.iter().find(|slot| slot.id == id)
    }
}

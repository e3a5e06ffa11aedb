use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use keepsake_core::{CardConfig, CardEngine, CardLoader, Preset};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CardFileError {
    #[error("failed to read card file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse card file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads a card configuration from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct CardFile {
    path: PathBuf,
}

impl CardFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CardLoader for CardFile {
    type Error = CardFileError;

    fn load_card(&self) -> Result<CardConfig, Self::Error> {
        let json = fs::read_to_string(&self.path).map_err(|source| CardFileError::Read {
            path: self.path.clone(),
            source,
        })?;
        CardConfig::from_json(&json).map_err(|source| CardFileError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

/// Validated card shared by every simulated playthrough.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    config: Arc<CardConfig>,
    source: String,
}

impl TesterAssets {
    /// Load from a card file when given, otherwise from the bundled preset.
    pub fn load(preset: Preset, path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let config = CardEngine::new(CardFile::new(path)).load_config()?;
                Ok(Self::from_config(config, path.display().to_string()))
            }
            None => {
                let config = CardEngine::new(preset).load_config()?;
                Ok(Self::from_config(config, format!("preset:{preset}")))
            }
        }
    }

    pub fn from_config(config: CardConfig, source: impl Into<String>) -> Self {
        Self {
            config: Arc::new(config),
            source: source.into(),
        }
    }

    pub fn config(&self) -> &Arc<CardConfig> {
        &self.config
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_card(label: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "keepsake-card-{label}-{}.json",
            std::process::id()
        ));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_presets_by_default() {
        let assets = TesterAssets::load(Preset::Riddles, None).unwrap();
        assert_eq!(assets.source(), "preset:riddles");
        assert_eq!(assets.config().gift_codes.len(), 6);
    }

    #[test]
    fn loads_card_from_file() {
        let json = serde_json::to_string(&CardConfig::classic().unwrap()).unwrap();
        let path = temp_card("ok", &json);
        let assets = TesterAssets::load(Preset::Riddles, Some(&path)).unwrap();
        assert_eq!(assets.config().gift_codes.len(), 13);
    }

    #[test]
    fn reports_unreadable_and_invalid_cards() {
        let missing = std::env::temp_dir().join("keepsake-card-does-not-exist.json");
        let err = TesterAssets::load(Preset::Classic, Some(&missing)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read card file"));

        let path = temp_card("bad", "{\"title\": 5}");
        let err = TesterAssets::load(Preset::Classic, Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse card file"));

        let mut config = CardConfig::classic().unwrap();
        config.pages.pop();
        let path = temp_card("mismatch", &serde_json::to_string(&config).unwrap());
        let err = TesterAssets::load(Preset::Classic, Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("failed validation"));
    }
}

//! Pinyin-specific configuration that extends the base `Config` from core.
//!
//! This configuration includes:
//! - All generic options from `predict_core::Config` (flattened via serde)
//! - Preedit separator options (apostrophes, tone digits)
//!
//! # Example
//!
//! ```rust
//! use pinyin_predict::PinyinConfig;
//!
//! let config = PinyinConfig::from_toml_str("candidate_limit = 5\ntone_digits_as_separators = false\n").unwrap();
//! assert_eq!(config.base().candidate_limit, 5);
//! assert!(!config.tone_digits_as_separators);
//! ```

use serde::{Deserialize, Serialize};

use predict_core::{Config, ConfigError};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PinyinConfig {
    /// Base configuration fields (limits, learning, cache, masking)
    #[serde(flatten)]
    pub base: Config,

    /// `xi'an` forces a boundary between `xi` and `an`
    pub apostrophe_separator: bool,

    /// `ni3hao3` forces boundaries after each tone digit (1-5)
    pub tone_digits_as_separators: bool,
}

impl Default for PinyinConfig {
    fn default() -> Self {
        Self {
            base: Config::default(),
            apostrophe_separator: true,
            tone_digits_as_separators: true,
        }
    }
}

impl PinyinConfig {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = ConfigError::read(path.as_ref())?;
        Ok(Self::from_toml_str(&content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Convert this pinyin config into the base config for `PredictionEngine`.
    pub fn into_base(self) -> Config {
        self.base
    }

    pub fn base(&self) -> &Config {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut Config {
        &mut self.base
    }
}

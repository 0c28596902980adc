//! Matcher configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/spendlink/config/matcher.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! An explicit path (e.g. from `--config`) replaces the override lookup and
//! must exist.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ai::CompletionOptions;
use crate::error::{Error, Result};
use crate::matcher::FallbackPolicy;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/matcher.toml");

/// Tunables for [`crate::matcher::ExpenseAccountMatcher`]
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    /// Results requested per search query
    pub search_limit: usize,
    /// Accept the best partial overlap when nothing reaches the threshold
    pub lenient_fallback: bool,
    /// Take the first candidate instead of asking the AI when nothing matched
    pub autocomplete_fallback: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            search_limit: 15,
            lenient_fallback: true,
            autocomplete_fallback: false,
            temperature: 0.1,
            max_tokens: 256,
        }
    }
}

impl MatcherConfig {
    /// Load from `path`, else the override location, else embedded defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => read_config(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(default_path) => read_config(&default_path)?,
                None => DEFAULT_CONFIG.to_string(),
            },
        };

        parse_config(&content)
    }

    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions::new(self.temperature, self.max_tokens)
    }

    pub fn fallback_policy(&self) -> FallbackPolicy {
        if self.lenient_fallback {
            FallbackPolicy::Lenient
        } else {
            FallbackPolicy::Strict
        }
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("spendlink").join("config").join("matcher.toml"))
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    search: Option<RawSearch>,
    matching: Option<RawMatching>,
    completion: Option<RawCompletion>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSearch {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMatching {
    lenient_fallback: Option<bool>,
    autocomplete_fallback: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCompletion {
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

/// Parse TOML config content, filling gaps with defaults
fn parse_config(content: &str) -> Result<MatcherConfig> {
    let raw: RawConfig =
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid matcher config: {}", e)))?;

    let mut config = MatcherConfig::default();

    if let Some(search) = raw.search {
        if let Some(limit) = search.limit {
            if limit == 0 {
                return Err(Error::Config("search.limit must be at least 1".into()));
            }
            config.search_limit = limit;
        }
    }

    if let Some(matching) = raw.matching {
        if let Some(lenient) = matching.lenient_fallback {
            config.lenient_fallback = lenient;
        }
        if let Some(shortcut) = matching.autocomplete_fallback {
            config.autocomplete_fallback = shortcut;
        }
    }

    if let Some(completion) = raw.completion {
        if let Some(temperature) = completion.temperature {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = completion.max_tokens {
            config.max_tokens = max_tokens;
        }
    }

    Ok(config)
}

//! Pipeline configuration.
//!
//! Values are resolved in this order: built-in defaults, environment variables
//! (a `.env` file is loaded first), then an optional JSON file whose keys
//! override whatever came before.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use serde_json::Value;
use thiserror::Error;

use crate::lexicon::{IdentifierWidth, InvalidWidth};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown lexical strategy '{0}', expected 'direct' or 'lexical-store'")]
    InvalidStrategy(String),
    #[error(transparent)]
    InvalidWidth(#[from] InvalidWidth),
    #[error("{name} is not a valid {expected}: '{value}'")]
    InvalidValue { name: String, value: String, expected: &'static str },
    #[error("malformed strategy override '{0}', expected corpus=strategy")]
    InvalidOverride(String),
    #[error("failed to read config file {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    #[serde(rename = "direct")]
    Direct,
    #[serde(rename = "lexical-store")]
    LexicalStore,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Direct => "direct",
            StrategyKind::LexicalStore => "lexical-store",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(StrategyKind::Direct),
            "lexical-store" | "lexical_store" => Ok(StrategyKind::LexicalStore),
            _ => Err(ConfigError::InvalidStrategy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// One sub-directory of item dumps per translation corpus.
    pub documents_dir: PathBuf,
    pub source_corpus_dir: PathBuf,
    /// Root of the bucketed lexical store.
    pub lexicon_dir: PathBuf,
    pub output_dir: PathBuf,
    pub database_path: PathBuf,
    pub direct_identifier_width: IdentifierWidth,
    pub lexicon_identifier_width: IdentifierWidth,
    pub default_strategy: StrategyKind,
    /// Corpus id (`eng_ult`) to strategy.
    pub strategy_overrides: BTreeMap<String, StrategyKind>,
    pub fallback_to_markup_lemma: bool,
    pub source_language_code: String,
    pub source_version: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            documents_dir: PathBuf::from("input/documents"),
            source_corpus_dir: PathBuf::from("input/koine_ugnt"),
            lexicon_dir: PathBuf::from("input/en_gwt"),
            output_dir: PathBuf::from("output"),
            database_path: PathBuf::from("alignedData.db"),
            direct_identifier_width: IdentifierWidth::Five,
            lexicon_identifier_width: IdentifierWidth::Four,
            default_strategy: StrategyKind::Direct,
            strategy_overrides: BTreeMap::new(),
            fallback_to_markup_lemma: true,
            source_language_code: "koine".to_string(),
            source_version: "ugnt".to_string(),
        }
    }
}

fn parse_width(name: &str, value: &str) -> Result<IdentifierWidth, ConfigError> {
    let n: u8 = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        expected: "identifier width",
    })?;
    Ok(IdentifierWidth::try_from(n)?)
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
            expected: "boolean",
        }),
    }
}

/// Parses `eng_ult=direct,hin_irv=lexical-store`.
pub fn parse_strategy_overrides(value: &str) -> Result<BTreeMap<String, StrategyKind>, ConfigError> {
    let mut overrides = BTreeMap::new();
    for pair in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (corpus, strategy) = pair
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidOverride(pair.to_string()))?;
        if corpus.trim().is_empty() {
            return Err(ConfigError::InvalidOverride(pair.to_string()));
        }
        overrides.insert(corpus.trim().to_string(), strategy.parse()?);
    }
    Ok(overrides)
}

/// Recursively overlays `overlay` onto `base`. Objects merge key by key,
/// anything else replaces.
fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

impl PipelineConfig {
    /// Defaults, then environment, then the JSON file if given.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = PipelineConfig::from_env()?;
        if let Some(path) = config_file {
            config = config.overlay_file(path)?;
        }
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut config = PipelineConfig::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Applies overrides from a variable lookup, so tests don't have to touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("DOCUMENTS_DIR") {
            self.documents_dir = PathBuf::from(v);
        }
        if let Some(v) = get("SOURCE_CORPUS_DIR") {
            self.source_corpus_dir = PathBuf::from(v);
        }
        if let Some(v) = get("LEXICON_DIR") {
            self.lexicon_dir = PathBuf::from(v);
        }
        if let Some(v) = get("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("DATABASE_PATH") {
            self.database_path = PathBuf::from(v);
        }
        if let Some(v) = get("DIRECT_IDENTIFIER_WIDTH") {
            self.direct_identifier_width = parse_width("DIRECT_IDENTIFIER_WIDTH", &v)?;
        }
        if let Some(v) = get("LEXICON_IDENTIFIER_WIDTH") {
            self.lexicon_identifier_width = parse_width("LEXICON_IDENTIFIER_WIDTH", &v)?;
        }
        if let Some(v) = get("LEXICAL_STRATEGY") {
            self.default_strategy = v.parse()?;
        }
        if let Some(v) = get("LEXICAL_STRATEGY_OVERRIDES") {
            self.strategy_overrides.extend(parse_strategy_overrides(&v)?);
        }
        if let Some(v) = get("FALLBACK_TO_MARKUP_LEMMA") {
            self.fallback_to_markup_lemma = parse_bool("FALLBACK_TO_MARKUP_LEMMA", &v)?;
        }
        if let Some(v) = get("SOURCE_LANGUAGE_CODE") {
            self.source_language_code = v;
        }
        if let Some(v) = get("SOURCE_VERSION") {
            self.source_version = v;
        }

        Ok(())
    }

    pub fn overlay_json(self, json: &str) -> Result<Self, ConfigError> {
        let overlay: Value = serde_json::from_str(json)?;
        let mut base = serde_json::to_value(&self)?;
        merge_json(&mut base, overlay);
        Ok(serde_json::from_value(base)?)
    }

    pub fn overlay_file(self, path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        self.overlay_json(&json)
    }

    pub fn strategy_for(&self, corpus_id: &str) -> StrategyKind {
        self.strategy_overrides
            .get(corpus_id)
            .copied()
            .unwrap_or(self.default_strategy)
    }

    pub fn source_corpus_id(&self) -> String {
        format!("{}_{}", self.source_language_code, self.source_version)
    }
}

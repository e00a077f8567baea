use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::timeline::TimelinePolicy;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["agentquote.toml", "config/agentquote.toml"];

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub timeline: TimelineConfig,
    pub quote: QuoteConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogConfig {
    /// JSON catalog snapshot. The built-in demo catalog is used when unset.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimelineConfig {
    pub min_delivery_ratio: f64,
    pub max_delivery_ratio: f64,
    pub extension_discount_floor: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteConfig {
    pub currency: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub quote_currency: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            timeline: TimelineConfig {
                min_delivery_ratio: 0.5,
                max_delivery_ratio: 1.5,
                extension_discount_floor: 0.75,
            },
            quote: QuoteConfig { currency: "USD".to_string() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options
                .config_path
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Pricing policy derived from the `[timeline]` section.
    pub fn timeline_policy(&self) -> TimelinePolicy {
        let defaults = TimelinePolicy::default();
        TimelinePolicy {
            min_delivery_ratio: self.timeline.min_delivery_ratio,
            max_delivery_ratio: self.timeline.max_delivery_ratio,
            extension_discount_floor: Decimal::from_f64(self.timeline.extension_discount_floor)
                .map(|floor| floor.round_dp(4))
                .unwrap_or(defaults.extension_discount_floor),
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
        }

        if let Some(timeline) = patch.timeline {
            if let Some(min_delivery_ratio) = timeline.min_delivery_ratio {
                self.timeline.min_delivery_ratio = min_delivery_ratio;
            }
            if let Some(max_delivery_ratio) = timeline.max_delivery_ratio {
                self.timeline.max_delivery_ratio = max_delivery_ratio;
            }
            if let Some(extension_discount_floor) = timeline.extension_discount_floor {
                self.timeline.extension_discount_floor = extension_discount_floor;
            }
        }

        if let Some(quote) = patch.quote {
            if let Some(currency) = quote.currency {
                self.quote.currency = currency;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("AGENTQUOTE_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("AGENTQUOTE_TIMELINE_MIN_DELIVERY_RATIO") {
            self.timeline.min_delivery_ratio =
                parse_f64("AGENTQUOTE_TIMELINE_MIN_DELIVERY_RATIO", &value)?;
        }
        if let Some(value) = read_env("AGENTQUOTE_TIMELINE_MAX_DELIVERY_RATIO") {
            self.timeline.max_delivery_ratio =
                parse_f64("AGENTQUOTE_TIMELINE_MAX_DELIVERY_RATIO", &value)?;
        }
        if let Some(value) = read_env("AGENTQUOTE_TIMELINE_EXTENSION_DISCOUNT_FLOOR") {
            self.timeline.extension_discount_floor =
                parse_f64("AGENTQUOTE_TIMELINE_EXTENSION_DISCOUNT_FLOOR", &value)?;
        }

        if let Some(value) = read_env("AGENTQUOTE_QUOTE_CURRENCY") {
            self.quote.currency = value;
        }

        let log_level =
            read_env("AGENTQUOTE_LOGGING_LEVEL").or_else(|| read_env("AGENTQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("AGENTQUOTE_LOGGING_FORMAT").or_else(|| read_env("AGENTQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = Some(catalog_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(quote_currency) = overrides.quote_currency {
            self.quote.currency = quote_currency;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_timeline(&self.timeline)?;
        validate_quote(&self.quote)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// First existing config file: the explicit path if given, else the default candidates.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if let Some(path) = &catalog.path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "catalog.path must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_timeline(timeline: &TimelineConfig) -> Result<(), ConfigError> {
    let TimelineConfig { min_delivery_ratio, max_delivery_ratio, extension_discount_floor } =
        *timeline;

    if !(min_delivery_ratio > 0.0 && min_delivery_ratio <= 1.0) {
        return Err(ConfigError::Validation(
            "timeline.min_delivery_ratio must be in range (0, 1]".to_string(),
        ));
    }

    if !(max_delivery_ratio >= 1.0 && max_delivery_ratio.is_finite()) {
        return Err(ConfigError::Validation(
            "timeline.max_delivery_ratio must be a finite value of at least 1".to_string(),
        ));
    }

    if !(extension_discount_floor > 0.0 && extension_discount_floor <= 1.0) {
        return Err(ConfigError::Validation(
            "timeline.extension_discount_floor must be in range (0, 1]".to_string(),
        ));
    }

    Ok(())
}

fn validate_quote(quote: &QuoteConfig) -> Result<(), ConfigError> {
    let currency = quote.currency.as_str();
    if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ConfigError::Validation(format!(
            "quote.currency must be a three-letter upper-case code, got `{currency}`"
        )));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    timeline: Option<TimelinePatch>,
    quote: Option<QuotePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct TimelinePatch {
    min_delivery_ratio: Option<f64>,
    max_delivery_ratio: Option<f64>,
    extension_discount_floor: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct QuotePatch {
    currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

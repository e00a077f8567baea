use std::env;
use std::fs;
use std::path::Path;

use agentquote_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

struct FieldSpec<'a> {
    key_path: &'static str,
    value: String,
    env_keys: &'a [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = [
        FieldSpec {
            key_path: "catalog.path",
            value: config
                .catalog
                .path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<built-in demo catalog>".to_string()),
            env_keys: &["AGENTQUOTE_CATALOG_PATH"],
        },
        FieldSpec {
            key_path: "timeline.min_delivery_ratio",
            value: config.timeline.min_delivery_ratio.to_string(),
            env_keys: &["AGENTQUOTE_TIMELINE_MIN_DELIVERY_RATIO"],
        },
        FieldSpec {
            key_path: "timeline.max_delivery_ratio",
            value: config.timeline.max_delivery_ratio.to_string(),
            env_keys: &["AGENTQUOTE_TIMELINE_MAX_DELIVERY_RATIO"],
        },
        FieldSpec {
            key_path: "timeline.extension_discount_floor",
            value: config.timeline.extension_discount_floor.to_string(),
            env_keys: &["AGENTQUOTE_TIMELINE_EXTENSION_DISCOUNT_FLOOR"],
        },
        FieldSpec {
            key_path: "quote.currency",
            value: config.quote.currency.clone(),
            env_keys: &["AGENTQUOTE_QUOTE_CURRENCY"],
        },
        FieldSpec {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["AGENTQUOTE_LOGGING_LEVEL", "AGENTQUOTE_LOG_LEVEL"],
        },
        FieldSpec {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["AGENTQUOTE_LOGGING_FORMAT", "AGENTQUOTE_LOG_FORMAT"],
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in &fields {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let env_key = env_keys
        .iter()
        .copied()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = env_key {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

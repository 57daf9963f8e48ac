use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use catalog_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let lines = [
        "effective config (source precedence: env > file > default):".to_string(),
        render_line(
            "storage.catalog_path",
            &config.storage.catalog_path.display().to_string(),
            source("storage.catalog_path", &["CATALOG_STORAGE_PATH"]),
        ),
        render_line(
            "catalog.page_size",
            &config.catalog.page_size.to_string(),
            source("catalog.page_size", &["CATALOG_PAGE_SIZE"]),
        ),
        render_line(
            "catalog.duplicate_ids",
            &format!("{:?}", config.catalog.duplicate_ids),
            source("catalog.duplicate_ids", &["CATALOG_DUPLICATE_IDS"]),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["CATALOG_LOGGING_LEVEL", "CATALOG_LOG_LEVEL"]),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            source("logging.format", &["CATALOG_LOGGING_FORMAT", "CATALOG_LOG_FORMAT"]),
        ),
    ];

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("catalog.toml"), PathBuf::from("config/catalog.toml")]
        .into_iter()
        .find(|path| path.exists())
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
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
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

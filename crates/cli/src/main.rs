use std::process::ExitCode;

use catalog_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use catalog_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

fn main() -> ExitCode {
    // Commands report configuration errors themselves; logging just stays off.
    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    catalog_cli::run()
}

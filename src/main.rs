mod app;
mod components;
mod config;
mod message;
mod model;
mod sources;
mod utils;
mod views;

use crate::config::AppConfig;
use crate::sources::StudySource;

pub fn main() -> iced::Result {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .try_init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => exit_with_config_error(err),
    };

    let source = match config.source.as_ref().map(|source| source.build()).transpose() {
        Ok(source) => source,
        Err(err) => exit_with_config_error(err),
    };

    match &source {
        Some(source) => log::info!("Using study source: {}", source.describe()),
        None => log::info!("No study source configured; waiting for a DICOM folder"),
    }

    app::run(config.initial_patient, source)
}

fn exit_with_config_error(err: config::ConfigError) -> ! {
    log::error!("Invalid configuration: {err}");
    eprintln!("ct-study-viewer: {err}");
    std::process::exit(2)
}

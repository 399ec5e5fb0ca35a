//! Triangle demo
//!
//! Reads `triangle.toml` from the working directory when present and draws a
//! single coloured triangle until the window is closed. Exits with status 1 if
//! the configuration, the graphics context or the first frame setup fails.

mod app;

use std::process::ExitCode;

use glfw_engine::prelude::*;

use crate::app::{AppError, TriangleApp};

const CONFIG_FILE: &str = "triangle.toml";

fn load_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load_or_default(CONFIG_FILE)?;
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init();
            log::error!("Failed to load {CONFIG_FILE}: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init_with(&config.logging);

    match TriangleApp::new(config).run() {
        Ok(stats) => {
            log::info!("Rendered {} frames", stats.frames);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

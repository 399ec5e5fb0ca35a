//! # Core Engine Module
//!
//! Shared configuration types used by the rendering subsystem and by
//! applications.

pub mod config;

pub use config::{AppConfig, Config, ConfigError, LoggingConfig, RenderConfig, WindowConfig};

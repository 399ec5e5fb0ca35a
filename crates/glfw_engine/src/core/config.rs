//! # Engine Configuration
//!
//! Settings for the window/context, the frame loop and logging. Every section
//! has defaults matching the triangle demo, so a config file only needs the
//! keys it wants to change:
//!
//! ```toml
//! [window]
//! width = 1024
//! height = 768
//!
//! [render]
//! clear_color = { r = 0.0, g = 0.0, b = 0.0, a = 1.0 }
//! frame_limit = 120
//! ```

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};
use crate::render::backend::ClearColor;
use crate::render::window::ContextProfile;

/// # Window Configuration
///
/// Window geometry and the context-creation hints applied before the window
/// is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Requested window width in screen coordinates
    pub width: u32,
    /// Requested window height in screen coordinates
    pub height: u32,
    /// Window title
    pub title: String,
    /// Requested OpenGL version as (major, minor)
    pub api_version: (u32, u32),
    /// Requested OpenGL profile
    pub profile: ContextProfile,
    /// Request a forward-compatible context
    pub forward_compatible: bool,
    /// Show the window on creation; hidden windows still render
    pub visible: bool,
    /// Refreshes to wait per buffer swap (1 = vsync, 0 = unthrottled)
    pub swap_interval: u32,
}

impl WindowConfig {
    /// Create a window configuration with default hints
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set whether the window is shown
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set the requested API version
    pub fn with_api_version(mut self, major: u32, minor: u32) -> Self {
        self.api_version = (major, minor);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("Window size must be non-zero, got {}x{}", self.width, self.height));
        }

        // Profiles only exist from 3.2 onwards
        if self.profile == ContextProfile::Core && self.api_version < (3, 2) {
            let (major, minor) = self.api_version;
            return Err(format!("Core profile requires OpenGL 3.2 or newer, got {major}.{minor}"));
        }

        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "GLFW Test Window".to_string(),
            api_version: (3, 3),
            profile: ContextProfile::Core,
            forward_compatible: true,
            visible: true,
            swap_interval: 1,
        }
    }
}

/// # Render Configuration
///
/// Frame-loop behaviour and shader program handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Colour the framebuffer is cleared to every frame
    pub clear_color: ClearColor,
    /// Stop after this many frames; `None` runs until the window closes
    pub frame_limit: Option<u64>,
    /// Run program validation after linking
    pub validate_program: bool,
    /// Detach shader objects from the program once it has linked
    pub release_shaders_after_link: bool,
}

impl RenderConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let ClearColor { r, g, b, a } = self.clear_color;
        if [r, g, b, a].iter().any(|channel| !(0.0..=1.0).contains(channel)) {
            return Err(format!("Clear colour channels must lie in [0, 1], got ({r}, {g}, {b}, {a})"));
        }

        if self.frame_limit == Some(0) {
            return Err("Frame limit must be at least 1 when set".to_string());
        }

        Ok(())
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: ClearColor::default(),
            frame_limit: None,
            validate_program: true,
            release_shaders_after_link: true,
        }
    }
}

/// # Logging Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set (e.g. "info", "glfw_engine=debug")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// # Application Configuration
///
/// Top-level configuration combining all sections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window and context settings
    pub window: WindowConfig,
    /// Frame loop settings
    pub render: RenderConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window.validate().map_err(ConfigError::Invalid)?;
        self.render.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

impl Config for AppConfig {}

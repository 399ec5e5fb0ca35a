//! Window and GPU context lifecycle
//!
//! [`GraphicsContext`] owns the windowing subsystem and the single window whose
//! GPU context is current on this thread. Initialization runs in a fixed order
//! (subsystem, hints, window, make current, load entry points, viewport), and
//! the partially built context acts as its own guard: any early return drops
//! it, which destroys the window and terminates the subsystem.

use std::cell::Cell;

use thiserror::Error;

use crate::core::WindowConfig;
use crate::render::backend::Viewport;
use crate::render::session::{ContextLink, GraphicsSession};
use crate::render::window::backend::{ContextHint, WindowSystem};

/// Context creation errors
///
/// All of these are fatal: the caller is expected to report them and exit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The windowing subsystem refused to start
    #[error("Failed to initialise the windowing subsystem: {0}")]
    PlatformInit(String),

    /// No window (and so no context) could be created
    #[error("Unable to create a {width}x{height} window")]
    WindowCreation { width: u32, height: u32 },

    /// Required GPU entry points could not be resolved
    #[error("Failed to load GPU entry points: {0}")]
    ExtensionLoad(String),

    /// This thread already owns a context
    #[error("A graphics context is already active on this thread")]
    AlreadyActive,

    /// The window configuration failed validation
    #[error("Invalid window configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for context operations
pub type ContextResult<T> = Result<T, ContextError>;

thread_local! {
    static CONTEXT_ACTIVE: Cell<bool> = const { Cell::new(false) };
}

/// Marks this thread as owning a graphics context until dropped
struct ActiveContext;

impl ActiveContext {
    fn acquire() -> ContextResult<Self> {
        CONTEXT_ACTIVE.with(|active| {
            if active.replace(true) {
                Err(ContextError::AlreadyActive)
            } else {
                Ok(Self)
            }
        })
    }
}

impl Drop for ActiveContext {
    fn drop(&mut self) {
        CONTEXT_ACTIVE.with(|active| active.set(false));
    }
}

/// Windowing subsystem plus the window whose context is current
///
/// Only one may exist per thread. The guard is thread-local, so a second thread
/// calling [`initialize`](Self::initialize) is not rejected; GLFW itself must
/// only be driven from the main thread. Dropping the context performs
/// [`shutdown`](Self::shutdown), after which the session it returned stops
/// issuing GPU commands. GPU resources should still be dropped first, which
/// normally falls out of declaring them after the context.
pub struct GraphicsContext<S: WindowSystem> {
    // Field order matters for drop: window before system before activation
    link: Option<ContextLink>,
    window: Option<S::Window>,
    system: Option<S>,
    activation: Option<ActiveContext>,
    framebuffer_size: (i32, i32),
}

impl<S: WindowSystem> GraphicsContext<S> {
    /// Create the window and GPU context described by `config`
    ///
    /// Returns the context together with the session through which all GPU
    /// resources are created.
    pub fn initialize(config: &WindowConfig) -> ContextResult<(Self, GraphicsSession<S::Gpu>)> {
        Self::initialize_with(S::init, config)
    }

    /// Same as [`initialize`](Self::initialize) with a custom subsystem start-up
    pub fn initialize_with<F>(init: F, config: &WindowConfig) -> ContextResult<(Self, GraphicsSession<S::Gpu>)>
    where
        F: FnOnce() -> Result<S, String>,
    {
        config.validate().map_err(ContextError::InvalidConfig)?;
        let activation = ActiveContext::acquire()?;

        log::info!("Initialising windowing subsystem...");
        let system = init().map_err(|e| {
            log::error!("Failed to initialise windowing subsystem: {e}");
            ContextError::PlatformInit(e)
        })?;

        let mut context = Self {
            link: None,
            window: None,
            system: Some(system),
            activation: Some(activation),
            framebuffer_size: (0, 0),
        };

        let gpu = context.open_window(config)?;
        let mut session = GraphicsSession::new(gpu);
        context.link = Some(session.link());

        let (width, height) = context.framebuffer_size;
        session.set_viewport(Viewport { x: 0, y: 0, width, height });
        log::info!(
            "Graphics context ready: window {}x{}, framebuffer {width}x{height}",
            config.width,
            config.height
        );

        Ok((context, session))
    }

    fn open_window(&mut self, config: &WindowConfig) -> ContextResult<S::Gpu> {
        let system = self
            .system
            .as_mut()
            .ok_or_else(|| ContextError::PlatformInit("windowing subsystem already terminated".to_string()))?;

        let (major, minor) = config.api_version;
        system.window_hint(ContextHint::ContextVersion(major, minor));
        system.window_hint(ContextHint::Profile(config.profile));
        system.window_hint(ContextHint::ForwardCompatible(config.forward_compatible));
        system.window_hint(ContextHint::Visible(config.visible));

        log::info!("Creating window '{}' ({}x{})...", config.title, config.width, config.height);
        let window = system
            .create_window(config.width, config.height, &config.title)
            .ok_or_else(|| {
                log::error!("Unable to create main window");
                ContextError::WindowCreation {
                    width: config.width,
                    height: config.height,
                }
            })?;
        let window = self.window.insert(window);

        system.make_context_current(window);

        let gpu = system.load_extensions(window).map_err(|e| {
            log::error!("GPU entry point loading failed: {e}");
            ContextError::ExtensionLoad(e)
        })?;

        system.set_swap_interval(config.swap_interval);
        self.framebuffer_size = system.framebuffer_size(window);

        Ok(gpu)
    }

    /// Process pending window events without blocking
    ///
    /// Must be called every frame or the window stops responding.
    pub fn poll_events(&mut self) {
        if let (Some(system), Some(window)) = (self.system.as_mut(), self.window.as_mut()) {
            system.poll_events(window);
        }
    }

    /// Whether the user asked to close the window
    ///
    /// Always true once the context has been shut down.
    pub fn should_close(&self) -> bool {
        match (self.system.as_ref(), self.window.as_ref()) {
            (Some(system), Some(window)) => system.window_should_close(window),
            _ => true,
        }
    }

    /// Ask the window to close at the end of the current frame
    pub fn request_close(&mut self) {
        if let (Some(system), Some(window)) = (self.system.as_mut(), self.window.as_mut()) {
            system.set_window_should_close(window, true);
        }
    }

    /// Swap the back buffer to the display
    pub fn present(&mut self) {
        if let (Some(system), Some(window)) = (self.system.as_mut(), self.window.as_mut()) {
            system.swap_buffers(window);
        }
    }

    /// Framebuffer size in pixels, queried once at initialization
    pub fn framebuffer_size(&self) -> (i32, i32) {
        self.framebuffer_size
    }

    /// Whether the window and subsystem are still alive
    pub fn is_active(&self) -> bool {
        self.activation.is_some() && self.window.is_some()
    }

    /// Destroy the window and terminate the windowing subsystem
    ///
    /// Safe to call any number of times, including after a failed initialization.
    pub fn shutdown(&mut self) {
        if let Some(link) = self.link.take() {
            link.sever();
        }

        if let Some(window) = self.window.take() {
            log::info!("Destroying window");
            if let Some(system) = self.system.as_mut() {
                system.destroy_window(window);
            }
        }

        if let Some(system) = self.system.take() {
            log::info!("Terminating windowing subsystem");
            system.terminate();
        }

        self.activation = None;
    }
}

impl<S: WindowSystem> Drop for GraphicsContext<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

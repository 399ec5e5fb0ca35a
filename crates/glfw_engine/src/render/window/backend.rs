//! Windowing-system trait consumed by [`GraphicsContext`](super::GraphicsContext)
//!
//! This trait mirrors the handful of windowing-library calls the engine needs:
//! initialization, creation hints, window creation, making the context
//! current, loading GPU entry points, event polling and buffer swapping. The
//! production implementation wraps GLFW; tests substitute a scripted mock.

use serde::{Deserialize, Serialize};

use crate::render::backend::GpuBackend;

/// OpenGL profile requested for the context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextProfile {
    /// Core profile: deprecated legacy functions are unavailable
    #[default]
    Core,
    /// Compatibility profile
    Compatibility,
}

/// Context-creation hints, consumed when the next window is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextHint {
    /// Requested API version as (major, minor)
    ContextVersion(u32, u32),
    /// Requested profile
    Profile(ContextProfile),
    /// Request a forward-compatible context
    ForwardCompatible(bool),
    /// Whether the window is shown on creation
    Visible(bool),
}

/// Windowing and context library
///
/// # Thread Safety
/// Implementations are tied to the thread that initialized them. Window and
/// context operations must all happen on that thread.
pub trait WindowSystem: Sized {
    /// Window plus its event source
    type Window;

    /// GPU command backend produced once entry points are loaded
    type Gpu: GpuBackend;

    /// Start the windowing subsystem
    fn init() -> Result<Self, String>;

    /// Set a hint for the next window creation
    ///
    /// Hints are global state that is only read by `create_window`, so they must
    /// be written before it.
    fn window_hint(&mut self, hint: ContextHint);

    /// Create a window with an attached GPU context
    fn create_window(&mut self, width: u32, height: u32, title: &str) -> Option<Self::Window>;

    /// Make the window's context current on the calling thread
    fn make_context_current(&mut self, window: &mut Self::Window);

    /// Resolve GPU entry points through the window's context
    ///
    /// Requires the context to be current. Returns a description of what failed
    /// when required entry points are missing.
    fn load_extensions(&mut self, window: &mut Self::Window) -> Result<Self::Gpu, String>;

    /// Number of screen refreshes to wait between buffer swaps
    fn set_swap_interval(&mut self, interval: u32);

    /// Drawable size in pixels, which may exceed the window size on high-density displays
    fn framebuffer_size(&self, window: &Self::Window) -> (i32, i32);

    /// Process pending events without blocking
    fn poll_events(&mut self, window: &mut Self::Window);

    /// Whether closing the window has been requested
    fn window_should_close(&self, window: &Self::Window) -> bool;

    /// Request or cancel window closure
    fn set_window_should_close(&mut self, window: &mut Self::Window, value: bool);

    /// Present the back buffer
    fn swap_buffers(&mut self, window: &mut Self::Window);

    /// Destroy a window and its context
    fn destroy_window(&mut self, window: Self::Window);

    /// Shut the windowing subsystem down
    fn terminate(self);
}

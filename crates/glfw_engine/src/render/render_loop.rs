//! Per-frame driver
//!
//! Each iteration polls events, clears, draws the optional [`Drawable`] and
//! presents. Program and vertex array are unbound again before presenting so
//! every frame starts from the same binding state.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::core::RenderConfig;
use crate::render::backend::{ClearColor, GpuBackend};
use crate::render::geometry::GeometryBuffer;
use crate::render::session::GraphicsSession;
use crate::render::shader::ShaderProgram;
use crate::render::vertex_layout::LayoutError;
use crate::render::window::{GraphicsContext, WindowSystem};

/// Errors that abort the frame loop
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The drawable's geometry does not match its program's inputs
    #[error("Geometry layout rejected: {0}")]
    Layout(#[from] LayoutError),
}

/// A program and the geometry it draws
pub struct Drawable<'a, B: GpuBackend> {
    /// Program made active for the draw
    pub program: &'a ShaderProgram<B>,
    /// Geometry checked against the program's inputs, then drawn
    pub geometry: &'a GeometryBuffer<B>,
}

impl<'a, B: GpuBackend> Drawable<'a, B> {
    /// Pair `program` with the `geometry` it draws
    pub fn new(program: &'a ShaderProgram<B>, geometry: &'a GeometryBuffer<B>) -> Self {
        Self { program, geometry }
    }
}

impl<B: GpuBackend> Clone for Drawable<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: GpuBackend> Copy for Drawable<'_, B> {}

/// Summary of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Frames presented
    pub frames: u64,
    /// Wall time spent in the loop
    pub elapsed: Duration,
}

impl FrameStats {
    /// Average frames per second, zero for an empty run
    pub fn fps(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            self.frames as f64 / seconds
        } else {
            0.0
        }
    }
}

/// Frame loop settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderLoop {
    clear_color: ClearColor,
    frame_limit: Option<u64>,
}

impl RenderLoop {
    /// Loop clearing to `clear_color` with no frame limit
    pub fn new(clear_color: ClearColor) -> Self {
        Self {
            clear_color,
            frame_limit: None,
        }
    }

    /// Loop settings taken from the render section of the config
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            clear_color: config.clear_color,
            frame_limit: config.frame_limit,
        }
    }

    /// Request close after `limit` frames
    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    /// Colour each frame is cleared to
    pub fn clear_color(&self) -> ClearColor {
        self.clear_color
    }

    /// Frames rendered before close is requested, if any
    pub fn frame_limit(&self) -> Option<u64> {
        self.frame_limit
    }

    /// Render until the window is asked to close
    ///
    /// With no drawable the loop still clears and presents every frame.
    pub fn run<S: WindowSystem>(
        &self,
        context: &mut GraphicsContext<S>,
        session: &mut GraphicsSession<S::Gpu>,
        drawable: Option<Drawable<'_, S::Gpu>>,
    ) -> Result<FrameStats, RenderError> {
        log::info!("Entering render loop");
        if drawable.is_none() {
            log::warn!("No drawable supplied, frames will only be cleared");
        }

        let start = Instant::now();
        let mut frames = 0_u64;

        while !context.should_close() {
            context.poll_events();
            self.frame(session, drawable)?;
            context.present();
            frames += 1;

            if self.frame_limit.is_some_and(|limit| frames >= limit) {
                log::debug!("Frame limit of {frames} reached");
                context.request_close();
            }
        }

        let stats = FrameStats {
            frames,
            elapsed: start.elapsed(),
        };
        log::info!(
            "Render loop finished: {} frames in {:.2?} ({:.1} fps)",
            stats.frames,
            stats.elapsed,
            stats.fps()
        );
        Ok(stats)
    }

    /// Clear and draw one frame without presenting it
    ///
    /// Does nothing once the context has shut down.
    pub fn frame<B: GpuBackend>(
        &self,
        session: &mut GraphicsSession<B>,
        drawable: Option<Drawable<'_, B>>,
    ) -> Result<(), RenderError> {
        if !session.is_live() {
            return Ok(());
        }
        session.clear(self.clear_color);

        let Some(Drawable { program, geometry }) = drawable else {
            return Ok(());
        };

        program.use_program(session);
        if let Err(e) = geometry.bind(session, program) {
            program.unuse(session);
            return Err(e.into());
        }
        geometry.draw(session);
        geometry.unbind(session);
        program.unuse(session);

        Ok(())
    }
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

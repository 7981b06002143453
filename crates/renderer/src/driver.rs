use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::error::DrawError;
use crate::geometry::QUAD_VERTEX_COUNT;
use crate::graphics::{Graphics, Host};
use crate::types::{SurfaceSize, UniformValue};

/// Uniform carrying the surface resolution in pixels.
pub const RESOLUTION_UNIFORM: &str = "r";
/// Uniform carrying seconds elapsed since mount.
pub const TIME_UNIFORM: &str = "t";

/// Monotonic start stamp captured once at mount.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameClock {
    start: Instant,
}

impl FrameClock {
    pub(crate) fn start_at(start: Instant) -> Self {
        Self { start }
    }

    /// Seconds since mount. Never negative, even if `now` predates the start.
    pub(crate) fn elapsed_seconds(&self, now: Instant) -> f32 {
        let millis = now.saturating_duration_since(self.start).as_secs_f64() * 1000.0;
        (millis * 0.001) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Stopped,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A frame was drawn with the given time and the next tick is scheduled.
    Drawn { time: f32 },
    /// The frame was dropped but the loop keeps going.
    Skipped,
    /// The driver is stopped; nothing was drawn or scheduled.
    Idle,
    /// The driver hit an unrecoverable error and stopped itself.
    Halted(DrawError),
}

/// Frames-per-second bookkeeping reported once a second.
#[derive(Debug)]
struct RenderStats {
    window_start: Instant,
    frames: u32,
    total_frames: u64,
    frames_per_second: f32,
}

impl RenderStats {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            total_frames: 0,
            frames_per_second: 0.0,
        }
    }

    fn record(&mut self, now: Instant, time: f32) {
        self.frames += 1;
        self.total_frames += 1;
        let window = now.saturating_duration_since(self.window_start);
        if window >= Duration::from_secs(1) {
            self.frames_per_second = self.frames as f32 / window.as_secs_f32();
            self.frames = 0;
            self.window_start = now;
            debug!(
                fps = self.frames_per_second.round(),
                frame_count = self.total_frames,
                time,
                "render stats"
            );
        }
    }
}

/// Self-rescheduling per-frame loop.
#[derive(Debug)]
pub(crate) struct FrameDriver {
    state: DriverState,
    clock: FrameClock,
    stats: RenderStats,
}

impl FrameDriver {
    /// Starts the loop: captures the clock and schedules the first tick.
    pub(crate) fn start<H: Host>(host: &mut H) -> Self {
        let now = host.now();
        host.request_frame();
        Self {
            state: DriverState::Running,
            clock: FrameClock::start_at(now),
            stats: RenderStats::new(now),
        }
    }

    pub(crate) fn state(&self) -> DriverState {
        self.state
    }

    pub(crate) fn frames_drawn(&self) -> u64 {
        self.stats.total_frames
    }

    /// Runs one frame: uniforms first, then the draw, then the next request.
    pub(crate) fn tick<G: Graphics, H: Host>(
        &mut self,
        graphics: &mut G,
        host: &mut H,
        program: &G::Program,
        vertex_array: &G::VertexArray,
    ) -> TickOutcome {
        if self.state == DriverState::Stopped {
            return TickOutcome::Idle;
        }

        let now = host.now();
        let time = self.clock.elapsed_seconds(now);
        let size = graphics.surface_size();

        graphics.use_program(program);
        graphics.bind_vertex_array(vertex_array);
        graphics.set_uniform(
            program,
            RESOLUTION_UNIFORM,
            UniformValue::Vec2(size.as_resolution()),
        );
        graphics.set_uniform(program, TIME_UNIFORM, UniformValue::Float(time));

        let outcome = match graphics.draw_triangles(0, QUAD_VERTEX_COUNT) {
            Ok(()) => {
                self.stats.record(now, time);
                TickOutcome::Drawn { time }
            }
            Err(DrawError::SurfaceLost) => {
                recover_surface(graphics, size);
                TickOutcome::Skipped
            }
            Err(DrawError::Timeout) => {
                warn!("surface timeout; retrying next frame");
                TickOutcome::Skipped
            }
            Err(DrawError::OutOfMemory) => {
                error!("surface out of memory; stopping frame driver");
                self.state = DriverState::Stopped;
                return TickOutcome::Halted(DrawError::OutOfMemory);
            }
            Err(DrawError::Other(message)) => {
                warn!(error = %message, "surface error; retrying next frame");
                TickOutcome::Skipped
            }
        };

        host.request_frame();
        outcome
    }

    /// Stops rescheduling and drops any pending tick.
    pub(crate) fn stop<H: Host>(&mut self, host: &mut H) {
        if self.state == DriverState::Running {
            self.state = DriverState::Stopped;
            host.cancel_frame();
            debug!(frames = self.stats.total_frames, "frame driver stopped");
        }
    }
}

fn recover_surface<G: Graphics>(graphics: &mut G, size: SurfaceSize) {
    debug!(size = %size, "surface lost or outdated; reconfiguring");
    graphics.resize_surface(size);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::testing::{Call, Handle, RecordingGraphics, RecordingHost};

    fn handles() -> (Handle, Handle) {
        (Handle { id: 10, stage: None }, Handle { id: 20, stage: None })
    }

    #[test]
    fn clock_starts_at_zero_and_never_goes_back() {
        let start = Instant::now();
        let clock = FrameClock::start_at(start);
        assert_eq!(clock.elapsed_seconds(start), 0.0);
        assert!((clock.elapsed_seconds(start + Duration::from_millis(1500)) - 1.5).abs() < 1e-6);
        assert_eq!(clock.elapsed_seconds(start - Duration::from_millis(5)), 0.0);
    }

    #[test]
    fn tick_sets_uniforms_before_drawing() {
        let mut graphics = RecordingGraphics {
            size: SurfaceSize::new(800, 600),
            ..RecordingGraphics::default()
        };
        let mut host = RecordingHost::new(800, 600);
        let mut driver = FrameDriver::start(&mut host);
        assert!(host.take_frame());
        host.advance(Duration::from_millis(250));

        let (program, vertex_array) = handles();
        let outcome = driver.tick(&mut graphics, &mut host, &program, &vertex_array);

        assert_eq!(outcome, TickOutcome::Drawn { time: 0.25 });
        assert_eq!(
            graphics.calls,
            vec![
                Call::UseProgram(10),
                Call::BindVertexArray(20),
                Call::SetUniform("r".into(), UniformValue::Vec2([800.0, 600.0])),
                Call::SetUniform("t".into(), UniformValue::Float(0.25)),
                Call::DrawTriangles(0, 6),
            ]
        );
        assert!(host.frame_pending);
        assert_eq!(host.frame_requests, 2);
    }

    #[test]
    fn elapsed_time_is_non_decreasing_across_ticks() {
        let mut graphics = RecordingGraphics::default();
        let mut host = RecordingHost::new(64, 64);
        let mut driver = FrameDriver::start(&mut host);
        let (program, vertex_array) = handles();

        let mut previous = -1.0;
        for step in [0, 16, 17, 0, 33, 1000] {
            host.advance(Duration::from_millis(step));
            match driver.tick(&mut graphics, &mut host, &program, &vertex_array) {
                TickOutcome::Drawn { time } => {
                    assert!(time >= previous);
                    if previous < 0.0 {
                        assert!(time.abs() < 1e-6);
                    }
                    previous = time;
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(driver.frames_drawn(), 6);
    }

    #[test]
    fn lost_surface_is_reconfigured_and_loop_continues() {
        let mut graphics = RecordingGraphics {
            size: SurfaceSize::new(320, 240),
            draw_results: vec![Err(DrawError::SurfaceLost)],
            ..RecordingGraphics::default()
        };
        let mut host = RecordingHost::new(320, 240);
        let mut driver = FrameDriver::start(&mut host);
        let (program, vertex_array) = handles();

        let outcome = driver.tick(&mut graphics, &mut host, &program, &vertex_array);
        assert_eq!(outcome, TickOutcome::Skipped);
        assert_eq!(
            graphics.calls.last(),
            Some(&Call::ResizeSurface(SurfaceSize::new(320, 240)))
        );
        assert_eq!(driver.state(), DriverState::Running);
        assert!(host.frame_pending);
    }

    #[test]
    fn out_of_memory_halts_without_rescheduling() {
        let mut graphics = RecordingGraphics {
            draw_results: vec![Err(DrawError::OutOfMemory)],
            ..RecordingGraphics::default()
        };
        let mut host = RecordingHost::new(64, 64);
        let mut driver = FrameDriver::start(&mut host);
        assert!(host.take_frame());
        let (program, vertex_array) = handles();

        let outcome = driver.tick(&mut graphics, &mut host, &program, &vertex_array);
        assert_eq!(outcome, TickOutcome::Halted(DrawError::OutOfMemory));
        assert_eq!(driver.state(), DriverState::Stopped);
        assert!(!host.frame_pending);
    }

    #[test]
    fn stopped_driver_does_nothing() {
        let mut graphics = RecordingGraphics::default();
        let mut host = RecordingHost::new(64, 64);
        let mut driver = FrameDriver::start(&mut host);
        driver.stop(&mut host);
        driver.stop(&mut host);
        assert_eq!(host.cancellations, 1);
        assert!(!host.frame_pending);

        let (program, vertex_array) = handles();
        let outcome = driver.tick(&mut graphics, &mut host, &program, &vertex_array);
        assert_eq!(outcome, TickOutcome::Idle);
        assert!(graphics.calls.is_empty());
        assert_eq!(host.frame_requests, 1);
    }
}

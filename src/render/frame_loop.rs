use futures::future::{abortable, AbortHandle, LocalBoxFuture};
use log::{debug, info, warn};

use super::{DrawingSurface, FrameRenderer, RenderOutcome};
use crate::error::ViewerError;
use crate::utils::FrameMetrics;

const FPS_LOG_INTERVAL: u64 = 120;

/// Frame-ready notifications from a video element.
pub trait FrameScheduler {
    /// Registers for exactly one notification and resolves with its
    /// presentation timestamp in milliseconds.
    fn next_frame(&self) -> LocalBoxFuture<'static, Result<f64, ViewerError>>;
}

/// Draws once per frame the source presents.
///
/// Each step registers for one notification and renders only after it fires,
/// so at most one draw is in flight and frames that arrive while drawing are
/// simply not seen.
pub struct RenderLoop<S: DrawingSurface, F> {
    renderer: FrameRenderer<S>,
    scheduler: F,
    metrics: FrameMetrics,
}

impl<S, F> RenderLoop<S, F>
where
    S: DrawingSurface + 'static,
    F: FrameScheduler + 'static,
{
    pub fn new(renderer: FrameRenderer<S>, scheduler: F) -> Self {
        Self {
            renderer,
            scheduler,
            metrics: FrameMetrics::new(),
        }
    }

    pub fn renderer(&self) -> &FrameRenderer<S> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut FrameRenderer<S> {
        &mut self.renderer
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    pub async fn step(&mut self) -> Result<RenderOutcome, ViewerError> {
        let timestamp = self.scheduler.next_frame().await?;
        let outcome = self.renderer.render_frame()?;
        if let RenderOutcome::Drawn(size) = outcome {
            self.metrics.record_frame(timestamp);
            if self.metrics.frames() % FPS_LOG_INTERVAL == 0 {
                debug!(
                    "{}x{} at {:.1} fps",
                    size.width,
                    size.height,
                    self.metrics.get_average_fps()
                );
            }
        }
        Ok(outcome)
    }

    /// Runs until the source stops delivering frames.
    pub async fn run(mut self) {
        loop {
            match self.step().await {
                Ok(_) => {}
                Err(err) if err.ends_render_loop() => {
                    info!("render loop stopped: {}", err);
                    break;
                }
                Err(err) => warn!("frame skipped: {}", err),
            }
        }
    }

    /// `run` as an abortable task for `spawn_local`.
    pub fn spawn(self) -> (LocalBoxFuture<'static, ()>, AbortHandle) {
        let (task, handle) = abortable(self.run());
        (
            Box::pin(async move {
                if task.await.is_err() {
                    debug!("render loop aborted");
                }
            }),
            handle,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    use futures::executor::block_on;

    use super::*;
    use crate::config::OverlayStyle;
    use crate::render::testing::*;
    use crate::types::{FrameSize, Point};

    /// Hands out queued timestamps, then reports the source detached.
    #[derive(Clone, Default)]
    struct ScriptedFrames {
        timestamps: Rc<RefCell<VecDeque<f64>>>,
        registrations: Rc<Cell<usize>>,
    }

    impl ScriptedFrames {
        fn with(timestamps: &[f64]) -> Self {
            let frames = Self::default();
            frames.timestamps.borrow_mut().extend(timestamps);
            frames
        }
    }

    impl FrameScheduler for ScriptedFrames {
        fn next_frame(&self) -> LocalBoxFuture<'static, Result<f64, ViewerError>> {
            self.registrations.set(self.registrations.get() + 1);
            let next = self.timestamps.borrow_mut().pop_front();
            Box::pin(async move { next.ok_or(ViewerError::SourceDetached) })
        }
    }

    fn mounted(video: &FakeVideo, surface: &RecordingSurface) -> FrameRenderer<RecordingSurface> {
        let mut renderer = FrameRenderer::new(OverlayStyle::default());
        renderer.mount_source(video.clone());
        renderer.mount_surface(surface.clone());
        renderer
    }

    #[test]
    fn step_waits_for_frame_then_draws() {
        let video = FakeVideo::default();
        video.0.set(FrameSize::new(1280, 720));
        let surface = RecordingSurface::default();
        surface.size.set(FrameSize::new(640, 480));
        let frames = ScriptedFrames::with(&[16.0]);
        let mut render_loop = RenderLoop::new(mounted(&video, &surface), frames.clone());

        let outcome = block_on(render_loop.step());

        assert_eq!(outcome, Ok(RenderOutcome::Drawn(FrameSize::new(1280, 720))));
        assert_eq!(frames.registrations.get(), 1);
        assert_eq!(
            surface.calls.borrow().last(),
            Some(&Call::Stroke(Point::ORIGIN, Point::new(1280.0, 720.0)))
        );
    }

    #[test]
    fn one_registration_per_frame_until_detached() {
        let video = FakeVideo::default();
        let surface = RecordingSurface::default();
        let frames = ScriptedFrames::with(&[0.0, 33.0, 66.0]);

        block_on(RenderLoop::new(mounted(&video, &surface), frames.clone()).run());

        // three frames drawn, the fourth registration finds the source gone
        assert_eq!(frames.registrations.get(), 4);
        let draws = surface
            .calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, Call::Draw(_)))
            .count();
        assert_eq!(draws, 3);
    }

    #[test]
    fn draw_failures_do_not_stop_the_loop() {
        let video = FakeVideo::default();
        let surface = RecordingSurface {
            fail_draw: true,
            ..RecordingSurface::default()
        };
        let frames = ScriptedFrames::with(&[0.0, 16.0]);

        block_on(RenderLoop::new(mounted(&video, &surface), frames.clone()).run());

        assert_eq!(frames.registrations.get(), 3);
    }

    #[test]
    fn unmounted_frames_are_skipped_and_retried() {
        let video = FakeVideo::default();
        let surface = RecordingSurface::default();
        let frames = ScriptedFrames::with(&[0.0, 16.0]);
        let mut render_loop = RenderLoop::new(
            FrameRenderer::<RecordingSurface>::new(OverlayStyle::default()),
            frames,
        );
        render_loop.renderer_mut().mount_surface(surface.clone());

        assert_eq!(block_on(render_loop.step()), Ok(RenderOutcome::Skipped));
        assert_eq!(render_loop.metrics().frames(), 0);

        render_loop.renderer_mut().mount_source(video);
        assert!(render_loop.renderer().is_ready());
        assert!(matches!(
            block_on(render_loop.step()),
            Ok(RenderOutcome::Drawn(_))
        ));
        assert_eq!(render_loop.metrics().frames(), 1);
    }

    #[test]
    fn aborted_loop_finishes() {
        let video = FakeVideo::default();
        let surface = RecordingSurface::default();
        let (task, handle) = RenderLoop::new(
            mounted(&video, &surface),
            ScriptedFrames::with(&[0.0]),
        )
        .spawn();

        handle.abort();
        block_on(task);

        assert!(surface.calls.borrow().is_empty());
    }
}

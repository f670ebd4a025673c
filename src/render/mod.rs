mod frame_loop;

pub use frame_loop::{FrameScheduler, RenderLoop};

use crate::config::OverlayStyle;
use crate::error::ViewerError;
use crate::types::{FrameSize, Point};

/// Something that holds a current video frame.
pub trait VideoSource {
    /// The frame's natural size; changes when the stream changes resolution.
    fn intrinsic_size(&self) -> FrameSize;
}

pub trait DrawingSurface {
    type Source: VideoSource;

    /// Sets the pixel size. Resizing also clears the surface.
    fn resize(&mut self, size: FrameSize);

    fn draw_frame(&mut self, source: &Self::Source) -> Result<(), ViewerError>;

    fn stroke_line(&mut self, from: Point, to: Point, style: &OverlayStyle);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Source or surface not mounted yet; nothing was touched.
    Skipped,
    Drawn(FrameSize),
}

/// The overlay line: top-left corner to bottom-right corner.
pub fn diagonal(size: FrameSize) -> (Point, Point) {
    (
        Point::ORIGIN,
        Point::new(f64::from(size.width), f64::from(size.height)),
    )
}

pub struct FrameRenderer<S: DrawingSurface> {
    source: Option<S::Source>,
    surface: Option<S>,
    overlay: OverlayStyle,
}

impl<S: DrawingSurface> FrameRenderer<S> {
    pub fn new(overlay: OverlayStyle) -> Self {
        Self {
            source: None,
            surface: None,
            overlay,
        }
    }

    pub fn mount_source(&mut self, source: S::Source) {
        self.source = Some(source);
    }

    pub fn mount_surface(&mut self, surface: S) {
        self.surface = Some(surface);
    }

    pub fn unmount_source(&mut self) -> Option<S::Source> {
        self.source.take()
    }

    pub fn unmount_surface(&mut self) -> Option<S> {
        self.surface.take()
    }

    pub fn is_ready(&self) -> bool {
        self.source.is_some() && self.surface.is_some()
    }

    /// Copies the current frame onto the surface and strokes the diagonal.
    ///
    /// The surface is resized to the source on every call so a resolution
    /// change after switching cameras shows up on the next frame.
    pub fn render_frame(&mut self) -> Result<RenderOutcome, ViewerError> {
        let (Some(source), Some(surface)) = (self.source.as_ref(), self.surface.as_mut()) else {
            return Ok(RenderOutcome::Skipped);
        };

        let size = source.intrinsic_size();
        surface.resize(size);
        surface.draw_frame(source)?;
        let (from, to) = diagonal(size);
        surface.stroke_line(from, to, &self.overlay);

        Ok(RenderOutcome::Drawn(size))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Call {
        Resize(FrameSize),
        Draw(FrameSize),
        Stroke(Point, Point),
    }

    /// Video stand-in whose size can be changed from the test.
    #[derive(Clone, Default)]
    pub struct FakeVideo(pub Rc<Cell<FrameSize>>);

    impl VideoSource for FakeVideo {
        fn intrinsic_size(&self) -> FrameSize {
            self.0.get()
        }
    }

    #[derive(Clone, Default)]
    pub struct RecordingSurface {
        pub size: Rc<Cell<FrameSize>>,
        pub calls: Rc<RefCell<Vec<Call>>>,
        pub fail_draw: bool,
    }

    impl DrawingSurface for RecordingSurface {
        type Source = FakeVideo;

        fn resize(&mut self, size: FrameSize) {
            self.size.set(size);
            self.calls.borrow_mut().push(Call::Resize(size));
        }

        fn draw_frame(&mut self, source: &FakeVideo) -> Result<(), ViewerError> {
            if self.fail_draw {
                return Err(ViewerError::Js {
                    operation: "drawImage",
                    message: "InvalidStateError".into(),
                });
            }
            self.calls
                .borrow_mut()
                .push(Call::Draw(source.intrinsic_size()));
            Ok(())
        }

        fn stroke_line(&mut self, from: Point, to: Point, _style: &OverlayStyle) {
            self.calls.borrow_mut().push(Call::Stroke(from, to));
        }
    }
}

use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement};

use crate::config::OverlayStyle;
use crate::error::ViewerError;
use crate::render::{DrawingSurface, FrameScheduler, VideoSource};
use crate::types::{FrameSize, Point};

#[wasm_bindgen]
extern "C" {
    // requestVideoFrameCallback is not in the stable web-sys surface yet
    #[wasm_bindgen(extends = HtmlVideoElement)]
    type FrameCallbackVideo;

    #[wasm_bindgen(catch, method, js_name = requestVideoFrameCallback)]
    fn request_video_frame_callback(
        this: &FrameCallbackVideo,
        callback: &js_sys::Function,
    ) -> Result<u32, JsValue>;
}

impl VideoSource for HtmlVideoElement {
    fn intrinsic_size(&self) -> FrameSize {
        FrameSize::new(self.video_width(), self.video_height())
    }
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn attach(canvas: HtmlCanvasElement) -> Result<Self, ViewerError> {
        let context = canvas
            .get_context("2d")
            .map_err(ViewerError::js("getContext"))?
            .ok_or(ViewerError::ContextUnavailable)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| ViewerError::UnexpectedType("CanvasRenderingContext2d"))?;

        Ok(Self { canvas, context })
    }
}

impl DrawingSurface for CanvasSurface {
    type Source = HtmlVideoElement;

    // Assigning width/height clears the bitmap and resets context state,
    // even when the value is unchanged.
    fn resize(&mut self, size: FrameSize) {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
    }

    fn draw_frame(&mut self, source: &HtmlVideoElement) -> Result<(), ViewerError> {
        self.context
            .draw_image_with_html_video_element(source, 0.0, 0.0)
            .map_err(ViewerError::js("drawImage"))
    }

    #[allow(deprecated)]
    fn stroke_line(&mut self, from: Point, to: Point, style: &OverlayStyle) {
        let ctx = &self.context;
        ctx.begin_path();
        ctx.set_stroke_style(&JsValue::from_str(&style.stroke_style));
        ctx.set_line_width(style.line_width);
        ctx.move_to(from.x, from.y);
        ctx.line_to(to.x, to.y);
        ctx.stroke();
    }
}

/// Frame-ready notifications via `HTMLVideoElement.requestVideoFrameCallback`.
pub struct VideoFrameScheduler {
    video: FrameCallbackVideo,
}

impl VideoFrameScheduler {
    pub fn new(video: &HtmlVideoElement) -> Self {
        Self {
            video: video.clone().unchecked_into(),
        }
    }
}

impl FrameScheduler for VideoFrameScheduler {
    fn next_frame(&self) -> LocalBoxFuture<'static, Result<f64, ViewerError>> {
        let (sender, receiver) = oneshot::channel();
        let callback = Closure::once_into_js(move |now: f64, _metadata: JsValue| {
            let _ = sender.send(now);
        });
        let registered = self
            .video
            .request_video_frame_callback(callback.unchecked_ref());

        Box::pin(async move {
            if registered.is_err() {
                return Err(ViewerError::FrameCallbackUnavailable);
            }
            receiver.await.map_err(|_| ViewerError::SourceDetached)
        })
    }
}

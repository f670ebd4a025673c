mod bindings;
pub mod canvas;
pub mod layout;
pub mod media;

pub use bindings::CameraViewer;

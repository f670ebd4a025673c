pub mod metrics;
pub mod sequence;

pub use metrics::FrameMetrics;
pub use sequence::{Sequence, Ticket};

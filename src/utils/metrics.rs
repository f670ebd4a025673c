use std::collections::VecDeque;

/// Rolling window of frame-to-frame intervals, in milliseconds.
pub struct FrameMetrics {
    frame_times: VecDeque<f64>,
    last_timestamp: Option<f64>,
    frames: u64,
    window_size: usize,
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self::with_window(60)
    }

    pub fn with_window(window_size: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(window_size),
            last_timestamp: None,
            frames: 0,
            window_size: window_size.max(1),
        }
    }

    /// Records a frame presented at `timestamp` (ms, monotonic clock).
    pub fn record_frame(&mut self, timestamp: f64) {
        self.frames += 1;
        if let Some(last) = self.last_timestamp.replace(timestamp) {
            self.record_frame_time(timestamp - last);
        }
    }

    pub fn record_frame_time(&mut self, time: f64) {
        self.frame_times.push_back(time);
        if self.frame_times.len() > self.window_size {
            self.frame_times.pop_front();
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn get_average_fps(&self) -> f64 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let average = self.frame_times.iter().sum::<f64>() / self.frame_times.len() as f64;
        if average <= 0.0 {
            return 0.0;
        }
        1000.0 / average
    }
}

impl Default for FrameMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Rolling window of frame-to-frame intervals, in milliseconds.
///
/// Fed with the timestamps of executed frames; reports the achieved rate for
/// overlays and headless reports.
#[derive(Debug, Clone)]
pub struct FrameStats {
    intervals: Vec<f64>,
    capacity: usize,
    cursor: usize,
    filled: bool,
    last_timestamp: Option<f64>,
}

impl FrameStats {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            intervals: vec![0.0; capacity],
            capacity,
            cursor: 0,
            filled: false,
            last_timestamp: None,
        }
    }

    /// Record an executed frame at `now_ms`. The first call only anchors the
    /// window; timestamps that go backwards are ignored.
    pub fn record_frame(&mut self, now_ms: f64) {
        if let Some(last) = self.last_timestamp {
            if now_ms < last {
                return;
            }
            self.push_interval(now_ms - last);
        }
        self.last_timestamp = Some(now_ms);
    }

    pub fn push_interval(&mut self, interval_ms: f64) {
        self.intervals[self.cursor] = interval_ms;
        self.cursor = (self.cursor + 1) % self.capacity;
        if self.cursor == 0 {
            self.filled = true;
        }
    }

    fn window(&self) -> &[f64] {
        let count = if self.filled { self.capacity } else { self.cursor };
        &self.intervals[..count]
    }

    pub fn count(&self) -> usize {
        self.window().len()
    }

    pub fn average_ms(&self) -> f64 {
        let w = self.window();
        if w.is_empty() {
            return 0.0;
        }
        w.iter().sum::<f64>() / w.len() as f64
    }

    pub fn min_ms(&self) -> f64 {
        self.window().iter().copied().reduce(f64::min).unwrap_or(0.0)
    }

    pub fn max_ms(&self) -> f64 {
        self.window().iter().copied().reduce(f64::max).unwrap_or(0.0)
    }

    /// Achieved frames per second over the window; 0 before two frames.
    pub fn fps(&self) -> f64 {
        let avg = self.average_ms();
        if avg > 0.0 { 1000.0 / avg } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_reports_zero() {
        let stats = FrameStats::new(8);
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.max_ms(), 0.0);
    }

    #[test]
    fn tracks_intervals_between_frames() {
        let mut stats = FrameStats::new(4);
        for t in [0.0, 10.0, 30.0, 60.0] {
            stats.record_frame(t);
        }
        assert_eq!(stats.count(), 3);
        assert_eq!(stats.average_ms(), 20.0);
        assert_eq!(stats.min_ms(), 10.0);
        assert_eq!(stats.max_ms(), 30.0);
        assert_eq!(stats.fps(), 50.0);
    }

    #[test]
    fn window_wraps_around() {
        let mut stats = FrameStats::new(2);
        stats.push_interval(10.0);
        stats.push_interval(20.0);
        stats.push_interval(30.0);
        assert_eq!(stats.count(), 2);
        assert_eq!(stats.average_ms(), 25.0);
    }

    #[test]
    fn backwards_timestamps_ignored() {
        let mut stats = FrameStats::new(4);
        stats.record_frame(100.0);
        stats.record_frame(50.0);
        stats.record_frame(120.0);
        assert_eq!(stats.count(), 1);
        assert_eq!(stats.average_ms(), 20.0);
    }
}

use crate::FrameError;

/// Rate limiter for per-frame callbacks.
///
/// Wraps a host frame source (it does not replace it): each host frame asks
/// [`FrameThrottle::should_run`] whether to do work. Frames that arrive too
/// early are dropped, never queued.
///
/// On execution the remainder `elapsed % interval` is carried forward instead
/// of resetting to `now`, so the long-run average converges on the target rate
/// even when the host delivers frames at irregular times.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    target_fps: u32,
    interval_ms: f64,
    last_executed: f64,
}

impl FrameThrottle {
    pub fn new(target_fps: u32) -> Result<Self, FrameError> {
        if target_fps == 0 {
            return Err(FrameError::InvalidTargetRate(target_fps));
        }
        Ok(Self {
            target_fps,
            interval_ms: 1000.0 / target_fps as f64,
            last_executed: 0.0,
        })
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Decide whether the frame stamped `now_ms` should execute.
    pub fn should_run(&mut self, now_ms: f64) -> bool {
        let elapsed = now_ms - self.last_executed;
        if elapsed >= self.interval_ms {
            self.last_executed = now_ms - (elapsed % self.interval_ms);
            true
        } else {
            false
        }
    }

    /// Forget timing history; the next frame at or after one interval runs.
    pub fn reset(&mut self, now_ms: f64) {
        self.last_executed = now_ms - self.interval_ms;
    }
}

/// Closure form of [`FrameThrottle`] for callers that only need the gate.
pub fn create_throttle(target_fps: u32) -> Result<impl FnMut(f64) -> bool, FrameError> {
    let mut throttle = FrameThrottle::new(target_fps)?;
    Ok(move |now_ms: f64| throttle.should_run(now_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_runs(fps: u32, step_ms: f64, window_ms: f64) -> usize {
        let mut gate = create_throttle(fps).unwrap();
        let mut t = 0.0;
        let mut runs = 0;
        while t <= window_ms {
            if gate(t) {
                runs += 1;
            }
            t += step_ms;
        }
        runs
    }

    #[test]
    fn zero_rate_rejected() {
        assert!(matches!(
            FrameThrottle::new(0),
            Err(FrameError::InvalidTargetRate(0))
        ));
    }

    #[test]
    fn thirty_fps_at_ten_ms_steps() {
        let runs = count_runs(30, 10.0, 1000.0);
        assert!((29..=31).contains(&runs), "runs = {runs}");
    }

    #[test]
    fn converges_over_long_windows() {
        // A reset-to-now gate would settle at 25/s here (every 4th 10 ms
        // frame); carrying the remainder keeps 30/s.
        let runs = count_runs(30, 10.0, 60_000.0);
        assert!((1799..=1801).contains(&runs), "runs = {runs}");
    }

    #[test]
    fn irregular_timing_converges() {
        let mut throttle = FrameThrottle::new(45).unwrap();
        let steps = [7.0, 16.0, 9.0, 21.0, 12.0, 16.7, 3.0];
        let mut t = 0.0;
        let mut runs = 0;
        let mut i = 0;
        while t < 10_000.0 {
            if throttle.should_run(t) {
                runs += 1;
            }
            t += steps[i % steps.len()];
            i += 1;
        }
        assert!((440..=451).contains(&runs), "runs = {runs}");
    }

    #[test]
    fn skipped_frames_are_not_replayed() {
        let mut throttle = FrameThrottle::new(60).unwrap();
        assert!(throttle.should_run(20.0));
        // a long stall produces one execution, not a burst
        assert!(throttle.should_run(1020.0));
        assert!(!throttle.should_run(1021.0));
    }

    #[test]
    fn early_frames_rejected() {
        let mut throttle = FrameThrottle::new(10).unwrap();
        assert!(!throttle.should_run(50.0));
        assert!(throttle.should_run(100.0));
        assert!(!throttle.should_run(150.0));
        assert!(throttle.should_run(200.0));
    }

    #[test]
    fn reset_allows_immediate_frame() {
        let mut throttle = FrameThrottle::new(10).unwrap();
        assert!(throttle.should_run(100.0));
        throttle.reset(120.0);
        assert!(throttle.should_run(120.0));
    }
}

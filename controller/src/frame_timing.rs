//! Frame timing for the control loop.
//!
//! Tracks intervals between frame timestamps and maintains rolling
//! statistics for the HUD and status logging.

/// Rolling frame interval statistics over a window of samples.
#[derive(Debug)]
pub struct FrameTiming {
    /// Seconds between consecutive frames.
    pub intervals: Vec<f64>,
    /// Maximum number of samples to keep.
    pub window_size: usize,
    /// Total frames recorded.
    pub total_frames: u64,
    /// Frames that arrived later than `budget_s` after their predecessor.
    pub late_frames: u64,
    /// Frame budget in seconds (e.g. 0.05 for 20 Hz).
    pub budget_s: f64,
    last_timestamp: Option<f64>,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(120, 0.1)
    }
}

impl FrameTiming {
    pub fn new(window_size: usize, budget_s: f64) -> Self {
        Self {
            intervals: Vec::with_capacity(window_size),
            window_size,
            total_frames: 0,
            late_frames: 0,
            budget_s,
            last_timestamp: None,
        }
    }

    /// Record a frame captured at `timestamp_s`.
    ///
    /// Non-increasing timestamps count the frame but add no interval.
    pub fn record_frame(&mut self, timestamp_s: f64) {
        self.total_frames += 1;
        if let Some(last) = self.last_timestamp {
            let interval = timestamp_s - last;
            if interval > 0.0 {
                Self::push_sample(&mut self.intervals, interval, self.window_size);
                if interval > self.budget_s {
                    self.late_frames += 1;
                }
            }
        }
        self.last_timestamp = Some(timestamp_s);
    }

    fn push_sample(samples: &mut Vec<f64>, value: f64, window_size: usize) {
        samples.push(value);
        if samples.len() > window_size {
            samples.remove(0);
        }
    }

    /// Compute percentile from a sorted slice.
    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }
        let idx = ((sorted.len() as f64 - 1.0) * p / 100.0).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    /// Frames per second from the median interval.
    pub fn fps(&self) -> f64 {
        self.stats().fps
    }

    /// Get interval statistics as percentiles.
    pub fn stats(&self) -> FrameTimingStats {
        let mut sorted = self.intervals.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let p50 = Self::percentile(&sorted, 50.0);
        FrameTimingStats {
            interval_p50_ms: p50 * 1000.0,
            interval_p99_ms: Self::percentile(&sorted, 99.0) * 1000.0,
            fps: if p50 > 0.0 { 1.0 / p50 } else { 0.0 },
            late_pct: if self.total_frames > 0 {
                (self.late_frames as f64 / self.total_frames as f64) * 100.0
            } else {
                0.0
            },
            total_frames: self.total_frames,
            late_frames: self.late_frames,
        }
    }

    /// Format stats as an s-expression for status output.
    pub fn stats_sexp(&self) -> String {
        let s = self.stats();
        format!(
            "(:interval-p50 {:.1} :interval-p99 {:.1} :fps {:.0} :late-pct {:.1} :total-frames {} :late-frames {})",
            s.interval_p50_ms, s.interval_p99_ms, s.fps, s.late_pct, s.total_frames, s.late_frames,
        )
    }
}

/// Computed frame timing statistics.
#[derive(Debug, Clone)]
pub struct FrameTimingStats {
    pub interval_p50_ms: f64,
    pub interval_p99_ms: f64,
    pub fps: f64,
    pub late_pct: f64,
    pub total_frames: u64,
    pub late_frames: u64,
}

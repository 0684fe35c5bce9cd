//! Window Collector
//!
//! Captures the fixed-length sample window that follows an alarm. The
//! alarm sample itself is the first window sample; the collector then
//! consumes further samples until the window holds exactly the
//! configured length, in either raw-value or first-difference mode.
//!
//! Completion is reported on the sample *after* the last window sample,
//! which is when the matcher result becomes observable in the output
//! stream. Only one window can be in flight: while the collector is
//! active the detector's wait flag is pinned, so no new alarm can start
//! a nested capture.

/// What a collector step produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorStep {
    /// No capture in progress.
    Idle,
    /// Capture in progress, window not complete yet.
    Collecting,
    /// The window just completed; fetch it with [`WindowCollector::window`].
    Complete,
}

/// Gathers post-alarm samples into a reusable fixed-length buffer.
#[derive(Debug, Clone)]
pub struct WindowCollector {
    /// Window length `L` (a power of two).
    length: usize,
    /// Capture first differences instead of raw values.
    use_diff: bool,
    buffer: Vec<f64>,
    /// Samples still to consume after the alarm sample; 0 when idle.
    remaining: usize,
    /// Monotonically increasing id, assigned at window start.
    pattern_id: u64,
    active: bool,
}

impl WindowCollector {
    pub fn new(length: usize, use_diff: bool) -> Self {
        Self {
            length,
            use_diff,
            buffer: Vec::with_capacity(length),
            remaining: 0,
            pattern_id: 0,
            active: false,
        }
    }

    fn capture_value(&self, value: f64, diff: f64) -> f64 {
        if self.use_diff {
            diff
        } else {
            value
        }
    }

    /// Begin a new window on an alarm sample. Allocates the next
    /// pattern id and stores the alarm sample as the first window
    /// element. Any capture already in flight is discarded.
    pub fn begin(&mut self, value: f64, diff: f64) -> u64 {
        self.pattern_id += 1;
        self.buffer.clear();
        self.buffer.push(self.capture_value(value, diff));
        self.remaining = self.length;
        self.active = true;
        self.pattern_id
    }

    /// Feed one sample. Call on every sample; idle steps return
    /// [`CollectorStep::Idle`] untouched.
    pub fn step(&mut self, value: f64, diff: f64) -> CollectorStep {
        if !self.active {
            return CollectorStep::Idle;
        }
        if self.buffer.len() < self.length {
            let v = self.capture_value(value, diff);
            self.buffer.push(v);
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.active = false;
            CollectorStep::Complete
        } else {
            CollectorStep::Collecting
        }
    }

    /// The completed window (exactly `length` values). Valid after
    /// [`CollectorStep::Complete`] until the next [`begin`](Self::begin).
    pub fn window(&self) -> &[f64] {
        &self.buffer
    }

    /// True while a capture is in progress.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Id of the current (or most recent) window; 0 before the first.
    pub fn pattern_id(&self) -> u64 {
        self.pattern_id
    }

    /// Configured window length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Abandon any capture in progress, keeping the id counter.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.remaining = 0;
        self.active = false;
    }
}

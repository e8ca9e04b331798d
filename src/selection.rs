/// Smallest allowed selection length, in seconds.
pub const MIN_GAP: f64 = 0.5;

/// A `[start, end]` sub-range of a source of known duration.
///
/// Always satisfies `0 <= start < end <= duration` and
/// `end - start >= MIN_GAP`. Setters clamp instead of rejecting, so no
/// input can break the invariant. If the whole source is shorter than
/// `MIN_GAP` the range is pinned to `[0, duration]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRange {
    start: f64,
    end: f64,
    duration: f64,
}

impl SelectionRange {
    /// Select the whole source. Returns `None` when `duration` is not a
    /// positive finite number.
    pub fn initialize(duration: f64) -> Option<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return None;
        }
        Some(Self {
            start: 0.0,
            end: duration,
            duration,
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Length of the selected clip in seconds.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    pub fn start_fraction(&self) -> f64 {
        self.start / self.duration
    }

    pub fn end_fraction(&self) -> f64 {
        self.end / self.duration
    }

    /// Whether `t` lies in the closed range.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    fn pinned(&self) -> bool {
        self.duration < MIN_GAP
    }

    /// Move the start, clamped to `[0, end - MIN_GAP]`. NaN is ignored.
    pub fn set_start(&mut self, value: f64) {
        if value.is_nan() || self.pinned() {
            return;
        }
        let upper = (self.end - MIN_GAP).max(0.0);
        self.start = value.clamp(0.0, upper);
        // `end - MIN_GAP` rounds, and may land a hair above the exact bound.
        while self.end - self.start < MIN_GAP && self.start > 0.0 {
            self.start = self.start.next_down().max(0.0);
        }
    }

    /// Move the end, clamped to `[start + MIN_GAP, duration]`. NaN is ignored.
    pub fn set_end(&mut self, value: f64) {
        if value.is_nan() || self.pinned() {
            return;
        }
        let lower = (self.start + MIN_GAP).min(self.duration);
        self.end = value.clamp(lower, self.duration);
        while self.end - self.start < MIN_GAP && self.end < self.duration {
            self.end = self.end.next_up().min(self.duration);
        }
    }
}

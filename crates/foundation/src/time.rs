/// Time primitives
///
/// A `Time` is a position on the chart's time dimension (a frame ordinal or
/// parsed time value), not wall-clock time.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct Time(pub f64);

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeSpan {
    pub start: Time,
    pub end: Time,
}

impl TimeSpan {
    pub fn new(start: Time, end: Time) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: Time) -> bool {
        t.0 >= self.start.0 && t.0 <= self.end.0
    }

    /// Clamps `t` into the span.
    pub fn clamp(&self, t: Time) -> Time {
        Time(t.0.clamp(self.start.0, self.end.0))
    }
}

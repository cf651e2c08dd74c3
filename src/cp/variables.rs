//! CP variable types.

use serde::{Deserialize, Serialize};

/// A fixed-duration interval: `[start, start + duration)`.
///
/// The start is the decision; its domain is `[start_min, start_max]` and the
/// end may not pass `end_max`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalVar {
    /// Variable name (unique within a model).
    pub name: String,
    /// Earliest start.
    pub start_min: i64,
    /// Latest start.
    pub start_max: i64,
    /// Fixed length.
    pub duration: i64,
    /// Latest end.
    pub end_max: i64,
}

impl IntervalVar {
    /// Creates an interval variable.
    pub fn new(
        name: impl Into<String>,
        start_min: i64,
        start_max: i64,
        duration: i64,
        end_max: i64,
    ) -> Self {
        Self {
            name: name.into(),
            start_min,
            start_max,
            duration,
            end_max,
        }
    }

    /// Interval that may start anywhere in `[0, horizon - duration]`.
    pub fn within_horizon(name: impl Into<String>, duration: i64, horizon: i64) -> Self {
        Self::new(name, 0, horizon - duration, duration, horizon)
    }

    /// Earliest possible end.
    #[inline]
    pub fn end_min(&self) -> i64 {
        self.start_min + self.duration
    }

    /// Whether `start` lies in the domain.
    pub fn admits_start(&self, start: i64) -> bool {
        start >= self.start_min && start <= self.start_max && start + self.duration <= self.end_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_horizon() {
        let iv = IntervalVar::within_horizon("op", 8, 100);
        assert_eq!(iv.start_min, 0);
        assert_eq!(iv.start_max, 92);
        assert_eq!(iv.end_max, 100);
        assert_eq!(iv.end_min(), 8);
    }

    #[test]
    fn test_admits_start() {
        let iv = IntervalVar::new("op", 5, 20, 10, 28);
        assert!(!iv.admits_start(4));
        assert!(iv.admits_start(5));
        assert!(iv.admits_start(18));
        assert!(!iv.admits_start(19)); // ends at 29 > end_max
        assert!(!iv.admits_start(21));
    }
}

//! Integer-keyed sampled curves.
//!
//! Cost schedules and effect magnitudes are authored as `(level, value)`
//! samples. Evaluation interpolates linearly between samples and returns
//! `None` outside the keyed range so callers can fall back to a flat
//! amount.

use serde::{Deserialize, Serialize};

/// Piecewise-linear curve keyed by node level.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelCurve {
    /// Samples sorted by level, deduplicated on construction.
    points: Vec<(i32, f32)>,
}

impl LevelCurve {
    /// Builds a curve from arbitrary-order samples. Later duplicates of
    /// a level key win.
    pub fn new(samples: impl IntoIterator<Item = (i32, f32)>) -> Self {
        let mut points: Vec<(i32, f32)> = Vec::new();
        for (level, value) in samples {
            match points.iter_mut().find(|(l, _)| *l == level) {
                Some(existing) => existing.1 = value,
                None => points.push((level, value)),
            }
        }
        points.sort_by_key(|(level, _)| *level);
        Self { points }
    }

    /// Convenience constructor: `value = per_level * level`.
    pub fn linear(per_level: f32, max_level: i32) -> Self {
        Self::new((0..=max_level.max(0)).map(|l| (l, per_level * l as f32)))
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evaluates the curve at `level`, interpolating between samples.
    /// Returns `None` when the curve is empty or `level` falls outside
    /// the keyed range.
    pub fn eval(&self, level: i32) -> Option<f32> {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return None,
        };
        if level < first.0 || level > last.0 {
            return None;
        }
        // Exact hit or the segment that brackets `level`.
        match self.points.binary_search_by_key(&level, |(l, _)| *l) {
            Ok(i) => Some(self.points[i].1),
            Err(i) => {
                let (l0, v0) = self.points[i - 1];
                let (l1, v1) = self.points[i];
                let t = (level - l0) as f32 / (l1 - l0) as f32;
                Some(v0 + (v1 - v0) * t)
            }
        }
    }

    /// Evaluates at `level`, rounding to the nearest non-negative integer.
    pub fn eval_rounded(&self, level: i32) -> Option<u32> {
        self.eval(level).map(|v| v.round().max(0.0) as u32)
    }
}

use crate::algebra::Vec3;
use crate::curve::{interpolate, Interpolation};

/// A position at a time, in seconds since the dataset start.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub position: Vec3,
}

/// Time-ordered position samples plus a continuous evaluator over them.
///
/// Samples are stored as parallel arrays with strictly increasing times; adding
/// a sample at an existing time replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledPosition {
    times: Vec<f64>,
    positions: Vec<Vec3>,
    interpolation: Interpolation,
}

impl Default for SampledPosition {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SampledPosition {
    pub fn new(degree: usize) -> Self {
        let interpolation = if degree <= 1 {
            Interpolation::Linear
        } else {
            Interpolation::Polynomial { degree }
        };
        Self {
            times: Vec::new(),
            positions: Vec::new(),
            interpolation,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn get(&self, index: usize) -> Option<Sample> {
        Some(Sample {
            time: *self.times.get(index)?,
            position: *self.positions.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        self.times
            .iter()
            .zip(&self.positions)
            .map(|(&time, &position)| Sample { time, position })
    }

    /// Samples with `from <= time <= to`, in time order.
    pub fn window(&self, from: f64, to: f64) -> impl Iterator<Item = Sample> + '_ {
        let start = self.times.partition_point(|&t| t < from);
        let end = self.times.partition_point(|&t| t <= to);
        let end = end.max(start);
        self.times[start..end]
            .iter()
            .zip(&self.positions[start..end])
            .map(|(&time, &position)| Sample { time, position })
    }

    /// First and last sample times.
    pub fn interval(&self) -> Option<(f64, f64)> {
        Some((*self.times.first()?, *self.times.last()?))
    }

    pub fn add_sample(&mut self, time: f64, position: Vec3) {
        let index = self.times.partition_point(|&t| t < time);
        if self.times.get(index) == Some(&time) {
            self.positions[index] = position;
        } else {
            self.times.insert(index, time);
            self.positions.insert(index, position);
        }
    }

    pub fn clear(&mut self) {
        self.times.clear();
        self.positions.clear();
    }

    /// Position at `time`, clamped to the first or last sample outside the covered
    /// interval. `None` when there are no samples.
    pub fn position_at(&self, time: f64) -> Option<Vec3> {
        if self.is_empty() || time.is_nan() {
            return None;
        }
        Some(interpolate(&self.times, &self.positions, self.interpolation, time))
    }
}

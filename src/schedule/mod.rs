//! Conditioning schedules over sampling steps.

pub mod editing;

pub use editing::{resolve_at_step, resolve_database, ResolvedPrompts};

use crate::curve::Geometry;
use crate::encode::Embedding;
use crate::tensor::{InterpolationParams, InterpolationTensor};

/// One schedule entry: `cond` applies through `end_step` inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    pub end_step: i64,
    pub cond: Embedding,
}

/// The compiled result: which conditioning drives each sampling step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// The conditioning active at a step; steps past the end keep the
    /// last entry.
    pub fn at_step(&self, step: i64) -> Option<&Embedding> {
        self.entries
            .iter()
            .find(|entry| entry.end_step >= step)
            .or_else(|| self.entries.last())
            .map(|entry| &entry.cond)
    }
}

/// Samples the blending plan at every step and merges runs of steps
/// whose conditionings stay within tolerance.
pub struct ScheduleBuilder {
    total_steps: i64,
    merge_tolerance: f32,
}

impl ScheduleBuilder {
    pub fn new(total_steps: i64) -> Self {
        Self {
            total_steps,
            merge_tolerance: 0.0,
        }
    }

    pub fn merge_tolerance(mut self, tolerance: f32) -> Self {
        self.merge_tolerance = tolerance;
        self
    }

    /// Sample `tensor` at each step. `t` runs over `[0, 1)`: the first
    /// step sits at 0, the endpoint lands one step past the run.
    pub fn build(
        &self,
        tensor: &InterpolationTensor,
        embeddings: &[Embedding],
        geometry: &Geometry,
    ) -> Schedule {
        let steps = self.total_steps.max(1);
        let mut entries: Vec<ScheduleEntry> = Vec::new();
        for step in 0..steps {
            let params = InterpolationParams {
                t: step as f64 / steps as f64,
                step,
                total_steps: self.total_steps,
            };
            let cond = tensor.interpolate(params, embeddings, geometry);
            match entries.last_mut() {
                Some(last) if last.cond.max_abs_diff(&cond) <= f64::from(self.merge_tolerance) => {
                    last.end_step = step;
                }
                _ => entries.push(ScheduleEntry {
                    end_step: step,
                    cond,
                }),
            }
        }
        Schedule { entries }
    }
}

//! Second build pass: reduce the conditioning tensor for one step.

use super::axis::{Axis, InterpolationParams};
use crate::curve::Geometry;
use crate::encode::Embedding;

/// One scheduled conditioning: `cond` indexes the deduplicated
/// embedding list and applies through `end_step` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledCond {
    pub end_step: i64,
    pub cond: usize,
}

/// Run-length schedule for one database entry, ascending by step.
pub type LeafSchedule = Vec<ScheduledCond>;

/// Conditioning tensor: nesting mirrors the axis branch structure,
/// leaves carry the per-entry schedules.
#[derive(Debug, Clone, PartialEq)]
pub enum CondTensor {
    Leaf(LeafSchedule),
    Nested(Vec<CondTensor>),
}

/// The built blending plan: a conditioning tensor and its axes,
/// outermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationTensor {
    tensor: CondTensor,
    axes: Vec<Axis>,
}

impl InterpolationTensor {
    pub fn new(tensor: CondTensor, axes: Vec<Axis>) -> Self {
        Self { tensor, axes }
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Blend the whole tensor down to one conditioning.
    pub fn interpolate(
        &self,
        params: InterpolationParams,
        embeddings: &[Embedding],
        geometry: &Geometry,
    ) -> Embedding {
        let axes: Vec<&Axis> = self.axes.iter().collect();
        reduce(&self.tensor, &axes, params, embeddings, geometry)
    }
}

/// Reduce innermost-last: each branch first applies the axes created
/// inside it, then the axes shared with its siblings, so branches of
/// different depth still line up.
fn reduce(
    tensor: &CondTensor,
    axes: &[&Axis],
    params: InterpolationParams,
    embeddings: &[Embedding],
    geometry: &Geometry,
) -> Embedding {
    let Some((axis, rest)) = axes.split_first() else {
        return resolve(tensor, params.step, embeddings);
    };
    let CondTensor::Nested(branches) = tensor else {
        return resolve(tensor, params.step, embeddings);
    };
    let empty = Vec::new();
    let points: Vec<Embedding> = branches
        .iter()
        .enumerate()
        .map(|(i, branch)| {
            let nested = axis.nested.get(i).unwrap_or(&empty);
            let chain: Vec<&Axis> = nested.iter().chain(rest.iter().copied()).collect();
            reduce(branch, &chain, params, embeddings, geometry)
        })
        .collect();
    axis.interpolator.blend(params, &points, geometry)
}

/// Look up the conditioning scheduled at `step`. Steps past the last
/// entry keep it; an exhausted axis list descends the first branch.
fn resolve(tensor: &CondTensor, step: i64, embeddings: &[Embedding]) -> Embedding {
    match tensor {
        CondTensor::Leaf(schedule) => {
            let entry = schedule
                .iter()
                .find(|entry| entry.end_step >= step)
                .or_else(|| schedule.last());
            match entry {
                Some(entry) => embeddings.get(entry.cond).cloned().unwrap_or_default(),
                None => Embedding::default(),
            }
        }
        CondTensor::Nested(branches) => match branches.first() {
            Some(first) => resolve(first, step, embeddings),
            None => Embedding::default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::ast::CurveKind;
    use crate::tensor::axis::Interpolator;
    use assert_approx_eq::assert_approx_eq;

    fn e(v: f32) -> Embedding {
        Embedding::new(vec![v])
    }

    fn leaf(cond: usize) -> CondTensor {
        CondTensor::Leaf(vec![ScheduledCond {
            end_step: i64::MAX,
            cond,
        }])
    }

    fn params(step: i64, total_steps: i64) -> InterpolationParams {
        InterpolationParams {
            t: step as f64 / total_steps as f64,
            step,
            total_steps,
        }
    }

    fn linear_axis(boundaries: Vec<f64>, nested: Vec<Vec<Axis>>) -> Axis {
        Axis {
            interpolator: Interpolator::Curve {
                kind: CurveKind::Linear,
                boundaries,
            },
            nested,
        }
    }

    #[test]
    fn leaf_schedule_resolves_by_step() {
        let tensor = InterpolationTensor::new(
            CondTensor::Leaf(vec![
                ScheduledCond {
                    end_step: 4,
                    cond: 0,
                },
                ScheduledCond {
                    end_step: 9,
                    cond: 1,
                },
            ]),
            vec![],
        );
        let embeddings = [e(1.0), e(2.0)];
        let g = Geometry::default();
        assert_eq!(
            tensor.interpolate(params(0, 10), &embeddings, &g),
            e(1.0)
        );
        assert_eq!(
            tensor.interpolate(params(4, 10), &embeddings, &g),
            e(1.0)
        );
        assert_eq!(
            tensor.interpolate(params(5, 10), &embeddings, &g),
            e(2.0)
        );
        // steps past the schedule keep the last conditioning
        assert_eq!(
            tensor.interpolate(params(42, 10), &embeddings, &g),
            e(2.0)
        );
    }

    #[test]
    fn single_axis_blends_branches() {
        let tensor = InterpolationTensor::new(
            CondTensor::Nested(vec![leaf(0), leaf(1)]),
            vec![linear_axis(vec![0.0, 10.0], vec![vec![], vec![]])],
        );
        let embeddings = [e(0.0), e(1.0)];
        let g = Geometry::default();
        let mid = tensor.interpolate(params(5, 10), &embeddings, &g);
        assert_approx_eq!(mid.values()[0] as f64, 0.5);
    }

    #[test]
    fn nested_branch_axes_apply_before_shared_ones() {
        // outer axis over [inner pair, single leaf]
        let inner = linear_axis(vec![0.0, 10.0], vec![vec![], vec![]]);
        let tensor = InterpolationTensor::new(
            CondTensor::Nested(vec![
                CondTensor::Nested(vec![leaf(0), leaf(1)]),
                leaf(2),
            ]),
            vec![linear_axis(vec![0.0, 10.0], vec![vec![inner], vec![]])],
        );
        let embeddings = [e(0.0), e(2.0), e(4.0)];
        let g = Geometry::default();
        // halfway: first branch is blend(0, 2) = 1, second is 4
        let mid = tensor.interpolate(params(5, 10), &embeddings, &g);
        assert_approx_eq!(mid.values()[0] as f64, 2.5);
    }

    #[test]
    fn exhausted_axes_descend_the_first_branch() {
        let tensor = InterpolationTensor::new(
            CondTensor::Nested(vec![leaf(1), leaf(0)]),
            vec![],
        );
        let embeddings = [e(7.0), e(9.0)];
        let g = Geometry::default();
        assert_eq!(
            tensor.interpolate(params(0, 10), &embeddings, &g),
            e(9.0)
        );
    }

    #[test]
    fn empty_leaf_falls_back_to_default() {
        let tensor = InterpolationTensor::new(CondTensor::Leaf(vec![]), vec![]);
        let g = Geometry::default();
        assert_eq!(
            tensor.interpolate(params(0, 10), &[], &g),
            Embedding::default()
        );
    }
}

//! Interpolation axes — how one bracket level blends its branches.

use crate::curve::{self, scale_t, Geometry};
use crate::dsl::ast::CurveKind;
use crate::encode::Embedding;

/// Per-step inputs shared by every axis blend.
///
/// `t` is the normalized progress `step / total_steps`, so `t` covers
/// `[0, 1)` over a run; `step` selects schedule entries at the leaves.
#[derive(Debug, Clone, Copy)]
pub struct InterpolationParams {
    pub t: f64,
    pub step: i64,
    pub total_steps: i64,
}

/// How an axis maps run progress onto its control points.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpolator {
    /// Curve over boundary positions. Progress rescales into the span
    /// between the first and last boundary, then [`scale_t`] stretches
    /// it so each segment's share matches its boundary spacing.
    Curve {
        kind: CurveKind,
        boundaries: Vec<f64>,
    },
    /// Alternation with a speed: progress wraps around the arms,
    /// cycling `speed` times per full pass over the points.
    Wraparound { speed: f64, begin: f64 },
}

impl Interpolator {
    pub fn blend(
        &self,
        params: InterpolationParams,
        points: &[Embedding],
        geometry: &Geometry,
    ) -> Embedding {
        let position = params.t * params.total_steps as f64;
        match self {
            Interpolator::Curve { kind, boundaries } => {
                let first = boundaries.first().copied().unwrap_or(0.0);
                let last = boundaries.last().copied().unwrap_or(0.0);
                let scaled = (position - first) / (last - first).max(1.0);
                curve::compute(*kind, scale_t(scaled, boundaries), points, geometry)
            }
            Interpolator::Wraparound { speed, begin } => {
                let span = points.len().saturating_sub(1).max(1) as f64;
                let mut t = ((position - begin) / span * speed).fract();
                if t < 0.0 {
                    t += 1.0;
                }
                curve::linear(t, points, geometry)
            }
        }
    }
}

/// One interpolation axis. `nested` holds, per branch, the axes that
/// were created inside that branch; they apply before any axis shared
/// by all branches.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub interpolator: Interpolator,
    pub nested: Vec<Vec<Axis>>,
}

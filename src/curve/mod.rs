//! Interpolation curves over conditioning control points.
//!
//! Every curve reduces its control points through pairwise [`Geometry`]
//! blends and expects `t` already scaled into `[0, 1]`. Degenerate
//! inputs (one point, or none) resolve locally instead of failing.

pub mod geometry;
pub mod scaler;

pub use geometry::Geometry;
pub use scaler::scale_t;

use crate::dsl::ast::CurveKind;
use crate::encode::Embedding;

pub fn compute(kind: CurveKind, t: f64, points: &[Embedding], geometry: &Geometry) -> Embedding {
    match kind {
        CurveKind::Linear => linear(t, points, geometry),
        CurveKind::Bezier => bezier(t, points, geometry),
        CurveKind::Catmull => catmull(t, points, geometry),
    }
}

/// Piecewise-linear: pick the segment under `t` and blend inside it.
pub fn linear(t: f64, points: &[Embedding], geometry: &Geometry) -> Embedding {
    match points {
        [] => Embedding::default(),
        [only] => only.clone(),
        [a, b] => geometry.blend(a, b, t),
        _ => {
            let segments = points.len() - 1;
            let segment = ((t * segments as f64) as usize).min(segments);
            let from = &points[segment];
            let to = points.get(segment + 1).unwrap_or(from);
            geometry.blend(from, to, (t * segments as f64).fract())
        }
    }
}

/// De Casteljau reduction over all control points.
pub fn bezier(t: f64, points: &[Embedding], geometry: &Geometry) -> Embedding {
    match points {
        [] => Embedding::default(),
        [only] => only.clone(),
        [a, b] => geometry.blend(a, b, t),
        _ => {
            let mut work = points.to_vec();
            while work.len() > 1 {
                for i in 0..work.len() - 1 {
                    work[i] = geometry.blend(&work[i], &work[i + 1], t);
                }
                work.pop();
            }
            work.remove(0)
        }
    }
}

/// Catmull-Rom: evaluate the cubic Bezier window of the segment under
/// `t`, with ghost endpoints mirrored past the curve boundary.
pub fn catmull(t: f64, points: &[Embedding], geometry: &Geometry) -> Embedding {
    if points.len() <= 2 {
        return linear(t, points, geometry);
    }
    let count = points.len();
    let segments = count - 1;
    let segment = ((t * segments as f64) as usize).min(segments);
    let p1 = points[segment].clone();
    let p2 = if segment + 1 < count {
        points[segment + 1].clone()
    } else {
        points[count - 1].clone()
    };
    let p0 = if segment >= 1 {
        points[segment - 1].clone()
    } else {
        points[0].scaled(2.0).sub(&points[1])
    };
    let p3 = if segment + 2 < count {
        points[segment + 2].clone()
    } else {
        points[count - 1].scaled(2.0).sub(&points[count - 2])
    };
    let tangent_out = p1.add(&p2.sub(&p0).scaled(1.0 / 6.0));
    let tangent_in = p2.sub(&p3.sub(&p1).scaled(1.0 / 6.0));
    let local = (t * segments as f64).fract();
    bezier(local, &[p1, tangent_out, tangent_in, p2], geometry)
}

//! Pairwise blend geometry — linear, with an optional spherical mix.

use crate::encode::Embedding;

/// How two control points blend inside every curve segment.
///
/// `slerp_scale` mixes a spherical blend over the plain linear one: 0
/// keeps pure lerp, 1 is fully spherical. The spherical blend rotates the
/// angle between the operands and scales the magnitude linearly, falling
/// back to lerp when the operands are near-parallel (closer than
/// `slerp_epsilon`, where 0 means parallel and 1 perpendicular) or when
/// either norm vanishes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub slerp_scale: f64,
    pub slerp_epsilon: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            slerp_scale: 0.0,
            slerp_epsilon: 0.0001,
        }
    }
}

impl Geometry {
    pub fn new(slerp_scale: f64, slerp_epsilon: f64) -> Self {
        Self {
            slerp_scale,
            slerp_epsilon,
        }
    }

    pub fn blend(&self, a: &Embedding, b: &Embedding, t: f64) -> Embedding {
        let linear = a.lerp(b, t);
        if self.slerp_scale == 0.0 {
            return linear;
        }
        match self.slerp(a, b, t) {
            Some(spherical) => linear.lerp(&spherical, self.slerp_scale),
            None => linear,
        }
    }

    fn slerp(&self, a: &Embedding, b: &Embedding, t: f64) -> Option<Embedding> {
        let norm_a = a.norm();
        let norm_b = b.norm();
        if norm_a < f64::EPSILON || norm_b < f64::EPSILON {
            return None;
        }
        let cos = (a.dot(b) / (norm_a * norm_b)).clamp(-1.0, 1.0);
        if 1.0 - cos.abs() < self.slerp_epsilon {
            return None;
        }
        let omega = cos.acos();
        let sin_omega = omega.sin();
        let weight_a = (((1.0 - t) * omega).sin()) / (sin_omega * norm_a);
        let weight_b = ((t * omega).sin()) / (sin_omega * norm_b);
        let magnitude = norm_a + (norm_b - norm_a) * t;
        Some(a.scaled(weight_a).add(&b.scaled(weight_b)).scaled(magnitude))
    }
}

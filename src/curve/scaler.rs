//! Step scaler — reparametrizes curve time over non-uniform markers.

/// Piecewise-linear reparametrization of `t` over marker positions.
///
/// Each gap between consecutive positions claims the share of `t`
/// proportional to its step distance, and the result maps that back to
/// uniform curve space where every gap is the same width. Uniform
/// spacing leaves `t` unchanged. Clamps to exactly 0 and 1 at the
/// boundaries.
pub fn scale_t(t: f64, positions: &[f64]) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let mut bounds: Vec<f64> = positions.windows(2).map(|w| w[1] - w[0]).collect();
    let total: f64 = bounds.iter().sum();
    if total <= 0.0 {
        return 1.0;
    }
    for b in &mut bounds {
        *b /= total;
    }
    for i in 1..bounds.len() {
        bounds[i] += bounds[i - 1];
    }
    bounds.insert(0, 0.0);

    let mut segment = 0;
    for (i, bound) in bounds.iter().enumerate() {
        if t > *bound {
            segment = i;
        } else {
            break;
        }
    }
    if segment + 1 >= bounds.len() {
        return 1.0;
    }
    let local = (t - bounds[segment]) / (bounds[segment + 1] - bounds[segment]);
    (segment as f64 + local) / (bounds.len() - 1) as f64
}

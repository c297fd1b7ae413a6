//! First build pass: walk the AST and extend the prompt database.
//!
//! Text and attention groups append literal prompt syntax. Step edits
//! re-emit themselves as `[...:n]` with the marker resolved to a whole
//! step, so the second pass stays purely textual. Interpolations and
//! sped-up alternations extrude the database into branches under a new
//! axis. Weight ramps expand into one gated attention group per step.

use super::axis::Interpolator;
use super::builder::TensorBuilder;
use crate::dsl::ast::{Binding, Expr, Scope};
use crate::dsl::error::CompileError;

/// Half-open run of internal steps an expression extends over.
///
/// Internal steps sit one past the sampler's: a whole-number marker
/// `n` becomes position `n + 1`, and the full prompt spans
/// `1..total_steps + 1`. Emitted edit syntax prints `position - 1`,
/// which lands back on the sampler's own numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepsRange {
    pub begin: i64,
    pub end: i64,
}

impl StepsRange {
    pub fn new(begin: i64, end: i64) -> Self {
        Self { begin, end }
    }

    pub fn full(total_steps: i64) -> Self {
        Self {
            begin: 1,
            end: total_steps + 1,
        }
    }

    pub fn size(&self) -> i64 {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }
}

/// A resolved numeric literal. Whole numbers address steps directly;
/// fractions strictly inside (0, 1) address a share of the run.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar {
    Int(i64),
    Float(f64),
}

impl Scalar {
    /// Internal step position of a marker. Floats outside (0, 1) step
    /// like whole numbers, truncated.
    fn position(&self, total_steps: i64) -> i64 {
        match self {
            Scalar::Int(n) => n + 1,
            Scalar::Float(f) if 0.0 < *f && *f < 1.0 => (f * total_steps as f64) as i64,
            Scalar::Float(f) => (f + 1.0) as i64,
        }
    }

    /// The number printed into emitted edit syntax.
    fn gate(&self, total_steps: i64) -> i64 {
        self.position(total_steps) - 1
    }

    fn value(&self) -> f64 {
        match self {
            Scalar::Int(n) => *n as f64,
            Scalar::Float(f) => *f,
        }
    }
}

impl Expr {
    /// Extend the builder with this expression over `range`.
    ///
    /// `scope` maps substitution names to their captured values; it is
    /// cloned wherever it grows, so bindings never leak upward or into
    /// sibling branches.
    pub fn extend<'a>(
        &'a self,
        builder: &mut TensorBuilder,
        range: StepsRange,
        total_steps: i64,
        scope: &Scope<'a>,
    ) -> Result<(), CompileError> {
        match self {
            Expr::Text(text) => {
                builder.append(text);
            }
            Expr::Number(value) => {
                builder.append(&format_float(*value));
            }
            Expr::Seq(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        builder.append(" ");
                    }
                    child.extend(builder, range, total_steps, scope)?;
                }
            }
            Expr::Weighted {
                child,
                weight,
                negative,
            } => {
                builder.append(if *negative { "[" } else { "(" });
                child.extend(builder, range, total_steps, scope)?;
                if let Some(weight) = weight {
                    let value = eval_scalar(weight, builder, total_steps, scope)?.value();
                    builder.append(&format!(":{}", format_float(value)));
                }
                builder.append(if *negative { "]" } else { ")" });
            }
            Expr::WeightRamp { child, from, to } => {
                let from = match from {
                    Some(expr) => eval_scalar(expr, builder, total_steps, scope)?.value(),
                    None => 1.0,
                };
                let to = match to {
                    Some(expr) => eval_scalar(expr, builder, total_steps, scope)?.value(),
                    None => 1.0,
                };
                let size = range.size();
                for step in range.begin..range.end {
                    let progress = (step - range.begin) as f64 / (size - 1).max(1) as f64;
                    let weight = from + (to - from) * progress;
                    let gate_begin = step > range.begin;
                    let gate_end = step + 1 < range.end;
                    if gate_end {
                        builder.append("[");
                    }
                    if gate_begin {
                        builder.append("[");
                    }
                    builder.append("(");
                    child.extend(builder, StepsRange::new(step, step + 1), total_steps, scope)?;
                    builder.append(&format!(":{})", format_float(weight)));
                    if gate_begin {
                        builder.append(&format!(":{}]", step - 1));
                    }
                    if gate_end {
                        builder.append(&format!("::{step}]"));
                    }
                }
            }
            Expr::StepGate { children, step } => match step {
                None => {
                    builder.append("[");
                    for child in children {
                        child.extend(builder, range, total_steps, scope)?;
                        builder.append(":");
                    }
                    builder.append("]");
                }
                Some(step) => {
                    let scalar = eval_scalar(step, builder, total_steps, scope)?;
                    let position = scalar.position(total_steps);
                    let before = StepsRange::new(range.begin, position.min(range.end));
                    let after = StepsRange::new(position.max(range.begin), range.end);
                    builder.append("[");
                    match children.as_slice() {
                        [after_child] => {
                            if !after.is_empty() {
                                after_child.extend(builder, after, total_steps, scope)?;
                            }
                        }
                        [before_child, after_child] => {
                            if !before.is_empty() {
                                before_child.extend(builder, before, total_steps, scope)?;
                            }
                            builder.append(":");
                            if !after.is_empty() {
                                after_child.extend(builder, after, total_steps, scope)?;
                            }
                        }
                        _ => {}
                    }
                    builder.append(&format!(":{}]", scalar.gate(total_steps)));
                }
            },
            Expr::Interpolate {
                children,
                steps,
                curve,
            } => {
                let mut bounds = Vec::with_capacity(steps.len());
                for step in steps {
                    bounds.push(match step {
                        Some(expr) => Some(
                            eval_scalar(expr, builder, total_steps, scope)?.position(total_steps)
                                as f64,
                        ),
                        None => None,
                    });
                }
                if let Some(first) = bounds.first_mut() {
                    if first.is_none() {
                        *first = Some(range.begin as f64);
                    }
                }
                if let Some(last) = bounds.last_mut() {
                    if last.is_none() {
                        *last = Some(range.end as f64);
                    }
                }
                let boundaries = subdivide(&bounds);
                builder.extrude(
                    children.len(),
                    Interpolator::Curve {
                        kind: *curve,
                        boundaries,
                    },
                    |branch, fork| children[branch].extend(fork, range, total_steps, scope),
                )?;
            }
            Expr::Alternate { children, speed } => match speed {
                None => {
                    builder.append("[");
                    for (i, child) in children.iter().enumerate() {
                        if i > 0 {
                            builder.append("|");
                        }
                        child.extend(builder, range, total_steps, scope)?;
                    }
                    builder.append("]");
                }
                Some(speed) => {
                    let speed = eval_scalar(speed, builder, total_steps, scope)?.value();
                    // repeat the first arm so the cycle closes on itself
                    builder.extrude(
                        children.len() + 1,
                        Interpolator::Wraparound {
                            speed,
                            begin: (range.begin - 1) as f64,
                        },
                        |branch, fork| {
                            children[branch % children.len()].extend(
                                fork,
                                range,
                                total_steps,
                                scope,
                            )
                        },
                    )?;
                }
            },
            Expr::Declare {
                name,
                params,
                value,
                body,
            } => {
                let mut scope = scope.clone();
                scope.insert(
                    name.as_str(),
                    Binding {
                        value: value.as_ref(),
                        params: params.as_slice(),
                    },
                );
                body.extend(builder, range, total_steps, &scope)?;
            }
            Expr::Substitute { name, args } => {
                let Some(binding) = scope.get(name.as_str()).copied() else {
                    return Err(CompileError::unbound(name, 0, 0));
                };
                if binding.params.len() != args.len() {
                    return Err(CompileError::arity(
                        name,
                        binding.params.len(),
                        args.len(),
                        0,
                        0,
                    ));
                }
                let mut scope = scope.clone();
                for (param, arg) in binding.params.iter().zip(args) {
                    scope.insert(
                        param.as_str(),
                        Binding {
                            value: arg,
                            params: &[],
                        },
                    );
                }
                builder.enter(name)?;
                binding.value.extend(builder, range, total_steps, &scope)?;
                builder.leave();
            }
        }
        Ok(())
    }
}

/// Evaluate an expression that must denote a number (weight, marker,
/// speed). The expression builds into a scratch database first, so
/// substitutions work anywhere a number does.
fn eval_scalar<'a>(
    expr: &'a Expr,
    builder: &TensorBuilder,
    total_steps: i64,
    scope: &Scope<'a>,
) -> Result<Scalar, CompileError> {
    let mut scratch = builder.scratch();
    expr.extend(&mut scratch, StepsRange::full(total_steps), total_steps, scope)?;
    let text = scratch
        .prompt_database()
        .first()
        .map(|entry| entry.trim().to_string())
        .unwrap_or_default();
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Scalar::Int(n));
    }
    if let Ok(f) = text.parse::<f64>() {
        return Ok(Scalar::Float(f));
    }
    Err(CompileError::eval(
        format!("expected a number, got '{text}'"),
        0,
        0,
    ))
}

/// Fill unspecified interior boundaries by even spacing between their
/// resolved neighbors. The first and last entry are always resolved
/// before this runs.
fn subdivide(bounds: &[Option<f64>]) -> Vec<f64> {
    let mut out = Vec::with_capacity(bounds.len());
    let mut i = 0;
    while i < bounds.len() {
        match bounds[i] {
            Some(value) => {
                out.push(value);
                i += 1;
            }
            None => {
                let prev = out.last().copied().unwrap_or(0.0);
                let mut j = i;
                while j < bounds.len() && bounds[j].is_none() {
                    j += 1;
                }
                let next = bounds.get(j).copied().flatten().unwrap_or(prev);
                let gap = (j - i + 1) as f64;
                for k in 0..(j - i) {
                    out.push(prev + (next - prev) * ((k + 1) as f64 / gap));
                }
                i = j;
            }
        }
    }
    out
}

/// Weights always print in float notation, so `(x:2)` re-emits as
/// `(x:2.0)` and survives a numeric re-parse.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

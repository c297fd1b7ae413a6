//! Abstract syntax tree for the prompt DSL.

use std::collections::HashMap;

/// Interpolation curve selected by a trailing `:curveName` segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    Linear,
    Bezier,
    Catmull,
}

impl CurveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(CurveKind::Linear),
            "bezier" => Some(CurveKind::Bezier),
            "catmull" => Some(CurveKind::Catmull),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CurveKind::Linear => "linear",
            CurveKind::Bezier => "bezier",
            CurveKind::Catmull => "catmull",
        }
    }
}

/// A parsed prompt expression.
///
/// Numeric positions (weights, step markers, speeds) are themselves
/// expressions so substitutions can stand in for them. Step markers parsed
/// from literal digits stay as `Text`: the integer/float spelling decides
/// how they resolve against the step range during the build.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal text run, escapes included verbatim.
    Text(String),
    /// A parsed float literal (attention weights). Re-emitted in the host's
    /// float notation, so `(x:1)` prints as `(x:1.0)`.
    Number(f64),
    /// Whitespace-separated terms; emitted joined by single spaces.
    Seq(Vec<Expr>),
    /// `(child)`, `(child:weight)` or `[child]` attention group.
    Weighted {
        child: Box<Expr>,
        weight: Option<Box<Expr>>,
        negative: bool,
    },
    /// `(child:from,to)` — attention weight ramped across the active range.
    WeightRamp {
        child: Box<Expr>,
        from: Option<Box<Expr>>,
        to: Option<Box<Expr>>,
    },
    /// `[a:b:step]` / `[b:step]` prompt edit; `step` is `None` for the
    /// degenerate `[a:b:]` form, which passes through unchanged.
    StepGate {
        children: Vec<Expr>,
        step: Option<Box<Expr>>,
    },
    /// `[e1:...:eN:s1,...,sN(:curve)]` — one interpolation axis.
    Interpolate {
        children: Vec<Expr>,
        steps: Vec<Option<Expr>>,
        curve: CurveKind,
    },
    /// `[a|b|c]` or `[a|b|c:speed]`.
    Alternate {
        children: Vec<Expr>,
        speed: Option<Box<Expr>>,
    },
    /// `$name(params?) = value\nbody` — binds `name` for the rest of the
    /// enclosing sequence. The value is captured unevaluated.
    Declare {
        name: String,
        params: Vec<String>,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    /// `$name` or `$name(arg1, arg2)`.
    Substitute { name: String, args: Vec<Expr> },
}

/// One scope binding: the declared value AST and its parameter names.
#[derive(Debug, Clone, Copy)]
pub struct Binding<'a> {
    pub value: &'a Expr,
    pub params: &'a [String],
}

/// Symbol scope threaded through the build. Cloned on every extension so
/// sibling branches never observe each other's bindings.
pub type Scope<'a> = HashMap<&'a str, Binding<'a>>;

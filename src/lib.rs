//! Crossfade — a prompt-blending compiler for diffusion conditioning.
//!
//! Prompts may embed blending constructs: `[a:b:5]` step edits,
//! `[a:b:0,10]` curve interpolations, `[a|b]` alternations, `(x:0,1)`
//! attention ramps and `$name = ...` declarations. Compilation turns
//! one such prompt into the minimal set of literal sub-prompts for a
//! text encoder plus a per-step schedule of blended conditionings.

pub mod config;
pub mod curve;
pub mod dsl;
pub mod encode;
pub mod schedule;
pub mod tensor;

pub use config::BlendConfig;
pub use dsl::{CompileError, Compiler, ErrorKind, Expr};
pub use encode::{Embedding, Encoder, SeededEncoder};
pub use schedule::{Schedule, ScheduleEntry};

use dsl::ast::Scope;
use encode::pad_to_longest;
use schedule::{resolve_database, ScheduleBuilder};
use tensor::{StepsRange, TensorBuilder};

/// Compile a prompt into a per-step conditioning schedule.
///
/// Runs the whole pipeline: parse, extend into a prompt database,
/// resolve step edits per step, encode each distinct literal prompt
/// once, then blend the plan at every step.
pub fn compile(
    prompt: &str,
    total_steps: i64,
    encoder: &dyn Encoder,
    config: &BlendConfig,
) -> Result<Schedule, CompileError> {
    let expr = Compiler::parse(prompt)?;
    let mut builder = TensorBuilder::new();
    expr.extend(
        &mut builder,
        StepsRange::full(total_steps),
        total_steps,
        &Scope::new(),
    )?;
    let resolved = resolve_database(builder.prompt_database(), total_steps);
    let mut embeddings = encoder.encode(&resolved.variants);
    let filler = encoder.empty();
    pad_to_longest(&mut embeddings, &filler);
    let tensor = builder.build(&resolved.schedules);
    Ok(ScheduleBuilder::new(total_steps)
        .merge_tolerance(config.merge_tolerance)
        .build(&tensor, &embeddings, &config.geometry()))
}

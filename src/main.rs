//! Crossfade CLI — compile one prompt and print what the compiler sees.
//!
//! Shows every stage: the extruded prompt database, the deduplicated
//! literal prompts handed to the encoder, and the final conditioning
//! schedule. The bundled seeded encoder stands in for a real text
//! encoder so schedules are inspectable offline.

use clap::Parser;

use crossfade::config::BlendConfig;
use crossfade::dsl::ast::Scope;
use crossfade::dsl::Compiler;
use crossfade::encode::{pad_to_longest, Encoder, SeededEncoder};
use crossfade::schedule::{resolve_database, ScheduleBuilder};
use crossfade::tensor::{StepsRange, TensorBuilder};

use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(version, about = "Compile a blending prompt into a conditioning schedule")]
struct Args {
    /// The prompt to compile.
    prompt: String,

    /// Number of sampling steps.
    #[arg(long, default_value_t = 20)]
    steps: i64,

    /// Embedding width per 77-token chunk.
    #[arg(long, default_value_t = 768)]
    dims: usize,

    /// Seed for the stand-in encoder.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Config file (defaults to ~/.crossfade/config.yaml).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    println!("crossfade v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => match BlendConfig::load_from(path) {
            Some(config) => config,
            None => {
                eprintln!("could not read config at {}", path.display());
                process::exit(1);
            }
        },
        None => BlendConfig::load().unwrap_or_default(),
    };

    // 1. Parse
    let expr = match Compiler::parse(&args.prompt) {
        Ok(expr) => expr,
        Err(e) => {
            eprintln!("parse error: {e}");
            process::exit(1);
        }
    };

    // 2. Extend into the prompt database
    let mut builder = TensorBuilder::new();
    if let Err(e) = expr.extend(
        &mut builder,
        StepsRange::full(args.steps),
        args.steps,
        &Scope::new(),
    ) {
        eprintln!("build error: {e}");
        process::exit(1);
    }

    println!(
        "\nprompt database ({} {}):",
        builder.prompt_database().len(),
        plural(builder.prompt_database().len(), "entry", "entries"),
    );
    for entry in builder.prompt_database() {
        println!("  {entry}");
    }

    // 3. Resolve step edits, dedup the literal prompts
    let resolved = resolve_database(builder.prompt_database(), args.steps);
    println!(
        "\nencoding {} distinct {}:",
        resolved.variants.len(),
        plural(resolved.variants.len(), "prompt", "prompts"),
    );
    for variant in &resolved.variants {
        println!("  {variant}");
    }

    // 4. Encode once, pad to the longest chunk count
    let encoder = SeededEncoder::new(args.seed, args.dims);
    let mut embeddings = encoder.encode(&resolved.variants);
    let filler = encoder.empty();
    pad_to_longest(&mut embeddings, &filler);

    // 5. Blend per step
    let tensor = builder.build(&resolved.schedules);
    let schedule = ScheduleBuilder::new(args.steps)
        .merge_tolerance(config.merge_tolerance)
        .build(&tensor, &embeddings, &config.geometry());

    println!(
        "\nschedule ({} {} over {} steps):",
        schedule.entries().len(),
        plural(schedule.entries().len(), "entry", "entries"),
        args.steps,
    );
    let mut begin = 0;
    for entry in schedule.entries() {
        println!(
            "  steps {:>3}..={:<3}  dim {:>5}  norm {:.3}",
            begin,
            entry.end_step,
            entry.cond.len(),
            entry.cond.norm(),
        );
        begin = entry.end_step + 1;
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

//! Prompt database integration tests — DSL source in, literal prompts out.
//!
//! The first compile pass rewrites every blend construct into the plain
//! sub-prompts a text encoder will see. These tests pin that rewriting
//! down construct by construct, asserting the exact database entries.

use crossfade::dsl::Scope;
use crossfade::tensor::{StepsRange, TensorBuilder};
use crossfade::{Compiler, ErrorKind};

const TOTAL_STEPS: i64 = 100;

/// Helper: parse and build `source`, returning the prompt database.
fn database(source: &str) -> Vec<String> {
    database_at(source, TOTAL_STEPS)
}

/// Helper: same, with an explicit step count for cases whose emitted
/// markers depend on it.
fn database_at(source: &str, total_steps: i64) -> Vec<String> {
    let expr = Compiler::parse(source).unwrap_or_else(|e| panic!("parse '{source}': {e}"));
    let mut builder = TensorBuilder::new();
    expr.extend(
        &mut builder,
        StepsRange::full(total_steps),
        total_steps,
        &Scope::new(),
    )
    .unwrap_or_else(|e| panic!("build '{source}': {e}"));
    builder.prompt_database().to_vec()
}

/// Helper: assert a prompt compiles to exactly one database entry.
fn assert_single(source: &str, expected: &str) {
    assert_eq!(database(source), [expected], "prompt: {source}");
}

// ============================================================
// Test 1: Plain prompts pass through untouched
// ============================================================

#[test]
fn plain_text_passes_through() {
    assert_single("a photo of a cat", "a photo of a cat");
    assert_single("(masterpiece:1.2) cat", "(masterpiece:1.2) cat");
    assert_single("(soft light)", "(soft light)");
    assert_single("[muddy]", "[muddy]");
}

#[test]
fn whitespace_collapses_between_words() {
    assert_single("a   photo \t of\na cat", "a photo of a cat");
}

#[test]
fn punctuation_is_plain_text() {
    assert_single("text, separated with, comas", "text, separated with, comas");
    assert_single("{prompt}", "{prompt}");
    assert_single(":", ":");
}

#[test]
fn escaped_brackets_stay_literal() {
    assert_single(r"\[not an edit\]", r"\[not an edit\]");
    assert_single(r"portrait \(object\)", r"portrait \(object\)");
    assert_single(r"50\% cotton", r"50\% cotton");
}

#[test]
fn dollars_without_a_name_stay_literal() {
    assert_single(r"\$var = abc", r"\$var = abc");
    assert_single(r"\\$ arst", r"\\$ arst");
    assert_single("$$ arst", "$$ arst");
}

#[test]
fn integer_weights_print_as_floats() {
    assert_single("(cat:2)", "(cat:2.0)");
    assert_single("(cat:1.35)", "(cat:1.35)");
}

// ============================================================
// Test 2: Step edits keep their skeleton, markers normalized
// ============================================================

#[test]
fn step_edits_keep_their_skeleton() {
    assert_single("[start:end:25]", "[start:end:25]");
    assert_single("[end:25]", "[end:25]");
    assert_single("[a:b:]", "[a:b:]");
}

#[test]
fn nested_edits_round_trip() {
    assert_single("[[nested range::3]:2]", "[[nested range::3]:2]");
    assert_single("[[nested range:2]::3]", "[[nested range:2]::3]");
    assert_single("sugar [range:,abc:3] thingy", "sugar [range:,abc:3] thingy");
}

#[test]
fn fractional_markers_rescale_to_steps() {
    assert_single("[end:0.25]", "[end:24]");
    assert_eq!(database_at("[end:0.5]", 20), ["[end:9]"]);
}

#[test]
fn whole_float_markers_do_not_rescale() {
    // the share-of-the-run reading stops outside (0, 1)
    assert_eq!(database_at("[x:y:1.3]", 10), ["[x:y:1]"]);
    assert_eq!(database_at("[x:y:0.0]", 10), ["[:y:0]"]);
}

#[test]
fn markers_accept_substitutions() {
    assert_single("$n = 15\n[a:$n]", "[a:15]");
    assert_single("$t = 0.25\n[end:$t]", "[end:24]");
    assert_single("$step = 5\n[legacy:editing:$step]", "[legacy:editing:5]");
}

// ============================================================
// Test 3: Weight ramps unroll into per-step attention groups
// ============================================================

#[test]
fn weight_ramps_unroll_per_step() {
    assert_eq!(
        database_at("(x:0,1)", 3),
        ["[(x:0.0)::1][[(x:0.5):1]::2][(x:1.0):2]"]
    );
}

#[test]
fn ramp_bounds_default_to_one() {
    assert_eq!(database_at("(x:,2)", 2), ["[(x:1.0)::1][(x:2.0):1]"]);
}

#[test]
fn ramp_bounds_accept_substitutions() {
    assert_eq!(
        database_at("$hi = 2\n(x:,$hi)", 2),
        ["[(x:1.0)::1][(x:2.0):1]"]
    );
    assert_single(
        "$a = 0\n$b = 12\n[[(prompt:$a,$b):0]::2]",
        "[[[(prompt:0.0)::1][(prompt:12.0):1]:0]::2]",
    );
}

#[test]
fn ramps_inside_an_edit_span_only_their_side() {
    assert_eq!(
        database_at("[a:(x:1,2):1]", 3),
        ["[a:[(x:1.0)::2][(x:2.0):2]:1]"]
    );
}

#[test]
fn gated_ramps_expand_into_single_step_groups() {
    assert_single(
        "sugar [[(weight interpolation:0,12):0]::1] thingy",
        "sugar [[(weight interpolation:0.0):0]::1] thingy",
    );
    assert_single(
        "sugar [[(weight interpolation:0,12):0]::2] thingy",
        "sugar [[[(weight interpolation:0.0)::1][(weight interpolation:12.0):1]:0]::2] thingy",
    );
}

// ============================================================
// Test 4: Interpolations split the database into branches
// ============================================================

#[test]
fn interpolation_splits_into_branches() {
    assert_eq!(database("[a:b:,]"), ["a", "b"]);
    assert_eq!(database("[a:b:c:,,]"), ["a", "b", "c"]);
    assert_eq!(
        database("[first light:last light:,]"),
        ["first light", "last light"]
    );
}

#[test]
fn surrounding_text_distributes_into_branches() {
    assert_eq!(database("photo of [a:b:,]"), ["photo of a", "photo of b"]);
    assert_eq!(database("[a:b:,] on a hill"), ["a on a hill", "b on a hill"]);
}

#[test]
fn parallel_interpolations_cross_product() {
    assert_eq!(database("[a:b:,] [c:d:,]"), ["a c", "b c", "a d", "b d"]);
}

#[test]
fn curve_names_ride_the_marker_list() {
    assert_eq!(database("[a:b:,:bezier]"), ["a", "b"]);
    assert_eq!(database("[a:b:c:,,:catmull]"), ["a", "b", "c"]);
}

#[test]
fn nested_interpolations_distribute_their_wrapper() {
    assert_eq!(database("[[a:b:,]:12]"), ["[a:12]", "[b:12]"]);
    assert_eq!(database("[[a:b:,]::7]"), ["[a::7]", "[b::7]"]);
}

#[test]
fn nested_constructs_ride_interpolation_arms() {
    assert_eq!(
        database("[(nested attention:2.0):abc:,]"),
        ["(nested attention:2.0)", "abc"]
    );
    assert_eq!(
        database("[[nested editing:15]:abc:,]"),
        ["[nested editing:15]", "abc"]
    );
    assert_eq!(database("[[nested:expr:,]:abc:,]"), ["nested", "expr", "abc"]);
}

#[test]
fn markers_leave_the_database_alone() {
    assert_eq!(database("a [b:c:-1, 10] d"), ["a b d", "a c d"]);
    assert_eq!(
        database("$begin = 2\n$end = 7\n[prompt:interpolation:$begin, $end]"),
        ["prompt", "interpolation"]
    );
}

// ============================================================
// Test 5: Alternations
// ============================================================

#[test]
fn plain_alternation_stays_literal() {
    assert_single("[day|night]", "[day|night]");
}

#[test]
fn sped_alternation_repeats_its_first_arm() {
    assert_eq!(database("[day|night:1]"), ["day", "night", "day"]);
    assert_eq!(database("[a|b|c:2]"), ["a", "b", "c", "a"]);
}

// ============================================================
// Test 6: Symbol definitions
// ============================================================

#[test]
fn definitions_substitute_into_the_body() {
    assert_single("$style = oil painting\n$style of a cat", "oil painting of a cat");
    assert_single("$s = neon\n$s $s", "neon neon");
}

#[test]
fn definitions_chain_and_nest() {
    assert_single("$a = sunny\n$b = meadow\n$a $b", "sunny meadow");
    assert_single("$base = cat\n$more = $base with a hat\n$more", "cat with a hat");
}

#[test]
fn parameterized_definitions_bind_arguments() {
    assert_single("$shot(subj) = photo of $subj\n$shot(a dog)", "photo of a dog");
    assert_single("$id() = fixed\n$id()", "fixed");
}

#[test]
fn a_definition_without_a_body_leaves_an_empty_prompt() {
    assert_single("$var = abc", "");
}

#[test]
fn group_values_span_newlines() {
    assert_single(
        "$a = (multiline\nprompt\nvalue:1.0)\n$a",
        "(multiline prompt value:1.0)",
    );
    assert_single(
        "$a = ($aa = nested variable\nmultiline\n$aa:1.0)\n$a",
        "(multiline nested variable:1.0)",
    );
}

#[test]
fn redefinition_applies_to_later_references() {
    // bodies substitute with the scope at the point of use
    assert_single("$x = one\n$y = $x\n$x = two\n$x $y", "two two");
}

#[test]
fn definitions_feed_weights() {
    assert_single("$w = 1.4\n(cat:$w)", "(cat:1.4)");
}

// ============================================================
// Test 7: Constructs compose in one prompt
// ============================================================

#[test]
fn blend_constructs_compose() {
    assert_eq!(
        database("masterpiece [castle:ruins:0.2,0.8:bezier] at [dawn|dusk]"),
        [
            "masterpiece castle at [dawn|dusk]",
            "masterpiece ruins at [dawn|dusk]"
        ]
    );
}

// ============================================================
// Test 8: Malformed prompts surface typed errors
// ============================================================

#[test]
fn marker_count_must_match_branches() {
    let err = Compiler::parse("[a:b:c:,]").unwrap_err();
    assert_eq!(err.kind, ErrorKind::SyntaxError);
}

#[test]
fn step_edits_take_at_most_two_subjects() {
    let err = Compiler::parse("[a:b:c:5]").unwrap_err();
    assert_eq!(err.kind, ErrorKind::SyntaxError);
}

#[test]
fn step_edits_take_no_curve_name() {
    let err = Compiler::parse("[a:b:5:bezier]").unwrap_err();
    assert_eq!(err.kind, ErrorKind::SyntaxError);
    assert!(err.message.contains("at least two step markers"));
}

#[test]
fn unclosed_groups_are_rejected() {
    let err = Compiler::parse("photo of (cat").unwrap_err();
    assert_eq!(err.kind, ErrorKind::SyntaxError);
    assert!(err.message.contains("unclosed"));
}

#[test]
fn self_referential_definitions_bottom_out() {
    let expr = Compiler::parse("$a = x $a\n$a").unwrap();
    let mut builder = TensorBuilder::new();
    let err = expr
        .extend(
            &mut builder,
            StepsRange::full(TOTAL_STEPS),
            TOTAL_STEPS,
            &Scope::new(),
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::EvalError);
}

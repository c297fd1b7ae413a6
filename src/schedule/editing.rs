//! Step-edit resolution over emitted prompt text.
//!
//! The build pass leaves host-style edit syntax in database entries:
//! `[after:n]`, `[before:after:n]` and `[a|b|c]`. This pass rewrites
//! one entry into the literal prompt visible at a given step, then
//! collapses the per-step results into run-length schedules over a
//! deduplicated prompt list so each distinct prompt is encoded once.

use std::collections::HashMap;

use crate::tensor::{LeafSchedule, ScheduledCond};

/// Resolve every edit construct in `text` for one sampling step.
pub fn resolve_at_step(text: &str, step: i64, total_steps: i64) -> String {
    let chars: Vec<char> = text.chars().collect();
    resolve_span(&chars, step, total_steps)
}

fn resolve_span(chars: &[char], step: i64, total_steps: i64) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            out.push(c);
            if i + 1 < chars.len() {
                out.push(chars[i + 1]);
            }
            i += 2;
            continue;
        }
        if c == '[' {
            if let Some(close) = matching_bracket(chars, i) {
                out.push_str(&resolve_bracket(&chars[i + 1..close], step, total_steps));
                i = close + 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Index of the `]` matching the `[` at `open`.
fn matching_bracket(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn resolve_bracket(inner: &[char], step: i64, total_steps: i64) -> String {
    let parts = split_top_level(inner, ':');
    if parts.len() >= 2 {
        let last: String = parts[parts.len() - 1].iter().collect();
        if let Some(boundary) = parse_boundary(last.trim(), total_steps) {
            return match &parts[..parts.len() - 1] {
                [after] => {
                    if step < boundary {
                        String::new()
                    } else {
                        resolve_span(after, step, total_steps)
                    }
                }
                [before, after] => {
                    if step < boundary {
                        resolve_span(before, step, total_steps)
                    } else {
                        resolve_span(after, step, total_steps)
                    }
                }
                _ => verbatim(inner, step, total_steps),
            };
        }
    }
    let arms = split_top_level(inner, '|');
    if arms.len() >= 2 {
        let arm = &arms[(step % arms.len() as i64) as usize];
        return resolve_span(arm, step, total_steps);
    }
    verbatim(inner, step, total_steps)
}

/// Not an edit after all: keep the brackets, still resolve inside.
fn verbatim(inner: &[char], step: i64, total_steps: i64) -> String {
    format!("[{}]", resolve_span(inner, step, total_steps))
}

/// Split on `sep` at nesting depth zero. Both bracket pairs nest, so a
/// `:` inside `(x:1.0)` never splits an edit; escapes never count.
fn split_top_level(chars: &[char], sep: char) -> Vec<Vec<char>> {
    let mut parts: Vec<Vec<char>> = vec![Vec::new()];
    let mut depth = 0usize;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            if let Some(part) = parts.last_mut() {
                part.push(c);
                if i + 1 < chars.len() {
                    part.push(chars[i + 1]);
                }
            }
            i += 2;
            continue;
        }
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 && c == sep {
            parts.push(Vec::new());
        } else if let Some(part) = parts.last_mut() {
            part.push(c);
        }
        i += 1;
    }
    parts
}

/// A trailing segment that reads as a number marks an edit boundary.
/// Strict fractions scale by the step count; everything else truncates
/// to a whole step.
fn parse_boundary(text: &str, total_steps: i64) -> Option<i64> {
    let value: f64 = text.parse().ok()?;
    Some(if value > 0.0 && value < 1.0 {
        (value * total_steps as f64) as i64
    } else {
        value as i64
    })
}

/// Flattened output of step resolution: every distinct literal prompt
/// once, and per database entry a run-length schedule indexing it.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPrompts {
    pub variants: Vec<String>,
    pub schedules: Vec<LeafSchedule>,
}

/// Resolve every database entry at every step. Literal prompts dedup in
/// first-seen order across all entries, so the encoder runs once per
/// distinct prompt no matter how many schedules share it.
pub fn resolve_database(database: &[String], total_steps: i64) -> ResolvedPrompts {
    let mut variants: Vec<String> = Vec::new();
    let mut interned: HashMap<String, usize> = HashMap::new();
    let mut schedules = Vec::with_capacity(database.len());
    for entry in database {
        let mut schedule: LeafSchedule = Vec::new();
        for step in 0..total_steps.max(1) {
            let text = resolve_at_step(entry, step, total_steps);
            let cond = match interned.get(&text) {
                Some(&index) => index,
                None => {
                    let index = variants.len();
                    interned.insert(text.clone(), index);
                    variants.push(text);
                    index
                }
            };
            match schedule.last_mut() {
                Some(last) if last.cond == cond => last.end_step = step,
                _ => schedule.push(ScheduledCond {
                    end_step: step,
                    cond,
                }),
            }
        }
        schedules.push(schedule);
    }
    ResolvedPrompts {
        variants,
        schedules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_picks_the_side_for_the_step() {
        assert_eq!(resolve_at_step("a [b:c:5] d", 0, 20), "a b d");
        assert_eq!(resolve_at_step("a [b:c:5] d", 4, 20), "a b d");
        assert_eq!(resolve_at_step("a [b:c:5] d", 5, 20), "a c d");
    }

    #[test]
    fn one_sided_gate_leaves_its_gap() {
        // the emitted side is empty before the boundary; surrounding
        // spaces are the caller's
        assert_eq!(resolve_at_step("a [x:5] d", 0, 20), "a  d");
        assert_eq!(resolve_at_step("a [x:5] d", 5, 20), "a x d");
    }

    #[test]
    fn fractional_boundary_scales_by_total() {
        assert_eq!(resolve_at_step("[x:y:0.5]", 9, 20), "x");
        assert_eq!(resolve_at_step("[x:y:0.5]", 10, 20), "y");
    }

    #[test]
    fn alternation_cycles_by_step() {
        assert_eq!(resolve_at_step("[a|b|c]", 0, 20), "a");
        assert_eq!(resolve_at_step("[a|b|c]", 4, 20), "b");
        assert_eq!(resolve_at_step("[a|b|c]", 5, 20), "c");
    }

    #[test]
    fn chosen_sides_resolve_recursively() {
        assert_eq!(resolve_at_step("[[a:b:2]:c:4]", 0, 20), "a");
        assert_eq!(resolve_at_step("[[a:b:2]:c:4]", 2, 20), "b");
        assert_eq!(resolve_at_step("[[a:b:2]:c:4]", 4, 20), "c");
        assert_eq!(resolve_at_step("[[a:b:2]|c]", 1, 20), "c");
    }

    #[test]
    fn non_edit_brackets_stay_verbatim() {
        assert_eq!(resolve_at_step("[muddy]", 3, 20), "[muddy]");
        assert_eq!(resolve_at_step("[a:b:]", 3, 20), "[a:b:]");
        assert_eq!(resolve_at_step("([x:y:2]:1.3)", 2, 20), "(y:1.3)");
    }

    #[test]
    fn nested_group_colon_does_not_split() {
        assert_eq!(resolve_at_step("[(x:1.3):y:2]", 0, 20), "(x:1.3)");
        assert_eq!(resolve_at_step("[(x:1.3):y:2]", 2, 20), "y");
    }

    #[test]
    fn escaped_brackets_never_resolve() {
        assert_eq!(resolve_at_step(r"\[a:5\]", 0, 20), r"\[a:5\]");
    }

    #[test]
    fn run_length_encoding_merges_steps() {
        let resolved = resolve_database(&["[a:b:2]".to_string()], 4);
        assert_eq!(resolved.variants, ["a", "b"]);
        assert_eq!(
            resolved.schedules[0],
            [
                ScheduledCond {
                    end_step: 1,
                    cond: 0,
                },
                ScheduledCond {
                    end_step: 3,
                    cond: 1,
                },
            ]
        );
    }

    #[test]
    fn variants_dedup_across_entries() {
        let resolved = resolve_database(&["x".to_string(), "x".to_string()], 2);
        assert_eq!(resolved.variants, ["x"]);
        assert_eq!(resolved.schedules.len(), 2);
        assert_eq!(
            resolved.schedules[1],
            [ScheduledCond {
                end_step: 1,
                cond: 0,
            }]
        );
    }

    #[test]
    fn zero_steps_still_produces_an_entry() {
        let resolved = resolve_database(&["plain".to_string()], 0);
        assert_eq!(resolved.variants, ["plain"]);
        assert_eq!(
            resolved.schedules[0],
            [ScheduledCond {
                end_step: 0,
                cond: 0,
            }]
        );
    }
}

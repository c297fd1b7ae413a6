//! Recursive-descent parser for the prompt DSL.
//!
//! Prompts are ordinary text with structural islands: `(...)` attention
//! groups, `[...]` edits/interpolations/alternations, and `$name`
//! declarations and substitutions. Everything else is literal text, so
//! the parser scans characters directly and threads a [`Stop`] set that
//! says which delimiters are structural in the current context. `:` in
//! plain text is just text; `:` inside a bracket splits segments.

use super::ast::{CurveKind, Expr};
use super::cursor::Cursor;
use super::error::CompileError;

/// Delimiters that end the current sequence. Only the enclosing
/// construct knows which ones bind, so each nesting level passes its
/// own set down.
#[derive(Debug, Clone, Copy, Default)]
struct Stop {
    colon: bool,
    pipe: bool,
    comma: bool,
    paren: bool,
    bracket: bool,
    newline: bool,
}

impl Stop {
    fn hits(&self, c: char) -> bool {
        match c {
            ':' => self.colon,
            '|' => self.pipe,
            ',' => self.comma,
            ')' => self.paren,
            ']' => self.bracket,
            '\n' => self.newline,
            _ => false,
        }
    }
}

/// One `:`-separated bracket segment with its raw source span. The
/// trailing segments of a bracket are re-read from source as marker
/// lists or curve names, so the parsed expression and its span travel
/// together.
struct Segment {
    expr: Expr,
    start: usize,
    end: usize,
    line: usize,
    col: usize,
}

pub struct Parser {
    cur: Cursor,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self {
            cur: Cursor::new(source),
        }
    }

    pub fn parse(mut self) -> Result<Expr, CompileError> {
        let expr = self.parse_sequence(Stop::default())?;
        if let Some(c) = self.cur.peek() {
            return Err(CompileError::syntax(
                format!("unexpected '{c}'"),
                self.cur.line(),
                self.cur.col(),
            ));
        }
        Ok(expr)
    }

    /// Parse whitespace-separated terms until a stop delimiter or the
    /// end of input. A declaration swallows the rest of the sequence as
    /// its body, so it is always the last child.
    fn parse_sequence(&mut self, stop: Stop) -> Result<Expr, CompileError> {
        let mut children = Vec::new();
        loop {
            self.cur.skip_whitespace(stop.newline);
            let Some(c) = self.cur.peek() else { break };
            if stop.hits(c) {
                break;
            }
            let expr = match c {
                '[' => self.parse_bracket()?,
                '(' => self.parse_group()?,
                ']' => {
                    return Err(CompileError::syntax(
                        "unexpected ']'",
                        self.cur.line(),
                        self.cur.col(),
                    ))
                }
                ')' => {
                    return Err(CompileError::syntax(
                        "unexpected ')'",
                        self.cur.line(),
                        self.cur.col(),
                    ))
                }
                '$' if self.symbol_ahead() => self.parse_dollar(stop)?,
                _ => self.parse_text(stop),
            };
            let done = matches!(expr, Expr::Declare { .. });
            children.push(expr);
            if done {
                break;
            }
        }
        Ok(if children.len() == 1 {
            children.remove(0)
        } else {
            Expr::Seq(children)
        })
    }

    /// Consume one run of literal text. Breaks on whitespace, structural
    /// characters, the current stop set, and `$` only when a symbol name
    /// follows (`$5` stays text). A backslash keeps itself and the next
    /// character verbatim.
    fn parse_text(&mut self, stop: Stop) -> Expr {
        let mut text = String::new();
        while let Some(c) = self.cur.peek() {
            if c == '\\' {
                text.push(c);
                self.cur.advance();
                if let Some(escaped) = self.cur.advance() {
                    text.push(escaped);
                }
                continue;
            }
            if c.is_whitespace() || matches!(c, '[' | '(' | ']' | ')') || stop.hits(c) {
                break;
            }
            if c == '$' && self.symbol_ahead() {
                break;
            }
            text.push(c);
            self.cur.advance();
        }
        Expr::Text(text)
    }

    /// `(child)`, `(child:weight)` or `(child:from,to)`.
    fn parse_group(&mut self) -> Result<Expr, CompileError> {
        let line = self.cur.line();
        let col = self.cur.col();
        self.cur.advance();
        let child = self.parse_sequence(Stop {
            colon: true,
            paren: true,
            ..Stop::default()
        })?;
        match self.cur.peek() {
            Some(')') => {
                self.cur.advance();
                Ok(Expr::Weighted {
                    child: Box::new(child),
                    weight: None,
                    negative: false,
                })
            }
            Some(':') => {
                self.cur.advance();
                let expr = self.parse_weight(child)?;
                self.expect(')')?;
                Ok(expr)
            }
            _ => Err(CompileError::syntax("unclosed '('", line, col)),
        }
    }

    /// Everything after the `:` of an attention group. A bare term is a
    /// fixed weight; a `,` makes it a ramp with optional open ends.
    fn parse_weight(&mut self, child: Expr) -> Result<Expr, CompileError> {
        let line = self.cur.line();
        let col = self.cur.col();
        let from = self.parse_weight_term()?;
        self.cur.skip_whitespace(true);
        if self.cur.peek() == Some(',') {
            self.cur.advance();
            let to = self.parse_weight_term()?;
            return Ok(Expr::WeightRamp {
                child: Box::new(child),
                from: from.map(Box::new),
                to: to.map(Box::new),
            });
        }
        match from {
            Some(weight) => Ok(Expr::Weighted {
                child: Box::new(child),
                weight: Some(Box::new(weight)),
                negative: false,
            }),
            None => Err(CompileError::syntax("expected a weight", line, col)),
        }
    }

    /// One ramp bound: absent, a substitution, or a number literal.
    fn parse_weight_term(&mut self) -> Result<Option<Expr>, CompileError> {
        self.cur.skip_whitespace(true);
        match self.cur.peek() {
            None | Some(',') | Some(')') => Ok(None),
            Some('$') if self.symbol_ahead() => Ok(Some(self.parse_substitute()?)),
            _ => Ok(Some(self.parse_number()?)),
        }
    }

    fn parse_number(&mut self) -> Result<Expr, CompileError> {
        let line = self.cur.line();
        let col = self.cur.col();
        let start = self.cur.pos();
        if matches!(self.cur.peek(), Some('+') | Some('-')) {
            self.cur.advance();
        }
        while matches!(self.cur.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.cur.advance();
        }
        let raw = self.cur.slice(start, self.cur.pos());
        if raw.is_empty() {
            return Err(CompileError::syntax("expected a weight", line, col));
        }
        match raw.parse::<f64>() {
            Ok(value) => Ok(Expr::Number(value)),
            Err(_) => Err(CompileError::syntax(
                format!("invalid number '{raw}'"),
                line,
                col,
            )),
        }
    }

    /// Dispatch on the first delimiter after the opening segment: `]`
    /// closes a negative-attention group, `|` starts an alternation, `:`
    /// starts the segment list of an edit or interpolation.
    fn parse_bracket(&mut self) -> Result<Expr, CompileError> {
        let line = self.cur.line();
        let col = self.cur.col();
        self.cur.advance();
        let first = self.parse_segment(Stop {
            colon: true,
            pipe: true,
            bracket: true,
            ..Stop::default()
        })?;
        match self.cur.peek() {
            Some(']') => {
                self.cur.advance();
                Ok(Expr::Weighted {
                    child: Box::new(first.expr),
                    weight: None,
                    negative: true,
                })
            }
            Some('|') => self.parse_alternation(first.expr, line, col),
            Some(':') => self.parse_steps(first, line, col),
            _ => Err(CompileError::syntax("unclosed '['", line, col)),
        }
    }

    /// `[a|b|c]` with an optional trailing `:speed`.
    fn parse_alternation(
        &mut self,
        first: Expr,
        line: usize,
        col: usize,
    ) -> Result<Expr, CompileError> {
        let mut children = vec![first];
        while self.cur.peek() == Some('|') {
            self.cur.advance();
            children.push(self.parse_sequence(Stop {
                colon: true,
                pipe: true,
                bracket: true,
                ..Stop::default()
            })?);
        }
        match self.cur.peek() {
            Some(']') => {
                self.cur.advance();
                Ok(Expr::Alternate {
                    children,
                    speed: None,
                })
            }
            Some(':') => {
                self.cur.advance();
                let speed = self.parse_sequence(Stop {
                    bracket: true,
                    ..Stop::default()
                })?;
                self.expect(']')?;
                Ok(Expr::Alternate {
                    children,
                    speed: Some(Box::new(speed)),
                })
            }
            _ => Err(CompileError::syntax("unclosed '['", line, col)),
        }
    }

    fn parse_segment(&mut self, stop: Stop) -> Result<Segment, CompileError> {
        let line = self.cur.line();
        let col = self.cur.col();
        let start = self.cur.pos();
        let expr = self.parse_sequence(stop)?;
        Ok(Segment {
            expr,
            start,
            end: self.cur.pos(),
            line,
            col,
        })
    }

    fn parse_steps(
        &mut self,
        first: Segment,
        line: usize,
        col: usize,
    ) -> Result<Expr, CompileError> {
        let mut segments = vec![first];
        while self.cur.peek() == Some(':') {
            self.cur.advance();
            segments.push(self.parse_segment(Stop {
                colon: true,
                bracket: true,
                ..Stop::default()
            })?);
        }
        match self.cur.peek() {
            Some(']') => {
                self.cur.advance();
            }
            _ => return Err(CompileError::syntax("unclosed '['", line, col)),
        }
        self.classify_bracket(segments, line, col)
    }

    /// Decide between a step edit and an interpolation. The last segment
    /// is re-read from source as a comma-separated marker list; a
    /// segment before it naming a curve selects the interpolation curve.
    /// One marker means edit (a curve cannot apply), several mean
    /// interpolation with one marker per expression.
    fn classify_bracket(
        &mut self,
        mut segments: Vec<Segment>,
        line: usize,
        col: usize,
    ) -> Result<Expr, CompileError> {
        let mut curve = CurveKind::Linear;
        let mut curve_seg = None;
        if segments.len() >= 3 {
            let last = &segments[segments.len() - 1];
            let raw = self.cur.slice(last.start, last.end);
            if let Some(kind) = CurveKind::from_name(raw.trim()) {
                curve = kind;
                curve_seg = segments.pop();
            }
        }
        let marker_seg = match segments.pop() {
            Some(seg) => seg,
            None => return Err(CompileError::syntax("unclosed '['", line, col)),
        };
        let raw = self.cur.slice(marker_seg.start, marker_seg.end);
        let markers = parse_markers(&raw, marker_seg.line, marker_seg.col)?;
        let children: Vec<Expr> = segments.into_iter().map(|s| s.expr).collect();
        if markers.len() == 1 {
            if let Some(seg) = curve_seg {
                return Err(CompileError::syntax(
                    format!("curve '{}' takes at least two step markers", curve.name()),
                    seg.line,
                    seg.col,
                ));
            }
            if children.len() > 2 {
                return Err(CompileError::syntax(
                    "step edit takes at most two expressions",
                    line,
                    col,
                ));
            }
            let step = markers.into_iter().flatten().next().map(Box::new);
            return Ok(Expr::StepGate { children, step });
        }
        if children.len() != markers.len() {
            return Err(CompileError::syntax(
                format!(
                    "{} expressions with {} step markers",
                    children.len(),
                    markers.len()
                ),
                line,
                col,
            ));
        }
        Ok(Expr::Interpolate {
            children,
            steps: markers,
            curve,
        })
    }

    /// `$name`, then either `= value\n...` (declaration) or a plain
    /// substitution. The lookahead past the name is rolled back when no
    /// `=` follows, so `$x y` keeps the space separating two terms.
    fn parse_dollar(&mut self, stop: Stop) -> Result<Expr, CompileError> {
        let line = self.cur.line();
        let col = self.cur.col();
        let (name, args) = self.parse_symbol()?;
        let mark = self.cur.mark();
        self.cur.skip_whitespace(true);
        if self.cur.peek() == Some('=') {
            self.cur.advance();
            return self.parse_declaration(name, args, stop, line, col);
        }
        self.cur.restore(mark);
        Ok(Expr::Substitute { name, args })
    }

    fn parse_substitute(&mut self) -> Result<Expr, CompileError> {
        let (name, args) = self.parse_symbol()?;
        Ok(Expr::Substitute { name, args })
    }

    /// Name and optional `(arg, ...)` list after a `$`. The argument
    /// parens must touch the name; `$x (y)` is a substitution followed
    /// by an attention group.
    fn parse_symbol(&mut self) -> Result<(String, Vec<Expr>), CompileError> {
        self.cur.advance();
        let start = self.cur.pos();
        while matches!(self.cur.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.cur.advance();
        }
        let name = self.cur.slice(start, self.cur.pos());
        let mut args = Vec::new();
        if self.cur.peek() == Some('(') {
            self.cur.advance();
            self.cur.skip_whitespace(false);
            if self.cur.peek() != Some(')') {
                loop {
                    args.push(self.parse_sequence(Stop {
                        comma: true,
                        paren: true,
                        ..Stop::default()
                    })?);
                    if self.cur.peek() == Some(',') {
                        self.cur.advance();
                        continue;
                    }
                    break;
                }
            }
            self.expect(')')?;
        }
        Ok((name, args))
    }

    /// `$name(params?) = value\nbody`. The value ends at the first
    /// newline outside any bracket; the body is the rest of the
    /// enclosing sequence, so the binding scopes forward only.
    fn parse_declaration(
        &mut self,
        name: String,
        args: Vec<Expr>,
        stop: Stop,
        line: usize,
        col: usize,
    ) -> Result<Expr, CompileError> {
        let mut params = Vec::new();
        for arg in args {
            match arg {
                Expr::Text(ident) if is_symbol(&ident) => params.push(ident),
                _ => {
                    return Err(CompileError::syntax(
                        format!("invalid parameter list for '${name}'"),
                        line,
                        col,
                    ))
                }
            }
        }
        let value = self.parse_sequence(Stop {
            newline: true,
            ..stop
        })?;
        if self.cur.peek() == Some('\n') {
            self.cur.advance();
        }
        let body = self.parse_sequence(stop)?;
        Ok(Expr::Declare {
            name,
            params,
            value: Box::new(value),
            body: Box::new(body),
        })
    }

    fn symbol_ahead(&self) -> bool {
        self.cur.peek() == Some('$')
            && matches!(self.cur.peek_at(1), Some(c) if c.is_alphabetic() || c == '_')
    }

    fn expect(&mut self, expected: char) -> Result<(), CompileError> {
        self.cur.skip_whitespace(true);
        if self.cur.peek() == Some(expected) {
            self.cur.advance();
            Ok(())
        } else {
            Err(CompileError::syntax(
                format!("expected '{expected}'"),
                self.cur.line(),
                self.cur.col(),
            ))
        }
    }
}

/// Split a raw marker segment on `,`. Each entry is empty (defaulted
/// later), a `$name` substitution, or a numeric literal kept as text so
/// its integer/float spelling survives into step resolution.
fn parse_markers(raw: &str, line: usize, col: usize) -> Result<Vec<Option<Expr>>, CompileError> {
    raw.split(',')
        .map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return Ok(None);
            }
            if let Some(name) = part.strip_prefix('$') {
                if is_symbol(name) {
                    return Ok(Some(Expr::Substitute {
                        name: name.to_string(),
                        args: Vec::new(),
                    }));
                }
            }
            if part.parse::<f64>().is_ok() {
                return Ok(Some(Expr::Text(part.to_string())));
            }
            Err(CompileError::syntax(
                format!("invalid step marker '{part}'"),
                line,
                col,
            ))
        })
        .collect()
}

fn is_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

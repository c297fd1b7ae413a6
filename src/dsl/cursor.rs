//! Character cursor — positioned scanning over prompt source text.
//!
//! The grammar is context-sensitive (`:`, `|`, `,` and newline are
//! structural only inside the construct that expects them), so there is no
//! token stream; the parser drives this cursor directly.

/// Saved cursor position for backtracking.
#[derive(Debug, Clone, Copy)]
pub struct Mark {
    pos: usize,
    line: usize,
    col: usize,
}

/// A scanning cursor with line/column tracking for error reporting.
pub struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Cursor {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            col: self.col,
        }
    }

    pub fn restore(&mut self, mark: Mark) {
        self.pos = mark.pos;
        self.line = mark.line;
        self.col = mark.col;
    }

    /// Raw source text between two scan positions.
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    /// Consume whitespace. Newlines stay put when `stop_at_newline` is set
    /// (they terminate declaration values).
    pub fn skip_whitespace(&mut self, stop_at_newline: bool) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() || (c == '\n' && stop_at_newline) {
                break;
            }
            self.advance();
        }
    }
}

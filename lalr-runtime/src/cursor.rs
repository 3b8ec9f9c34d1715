/// A 0-based line/column position in source text.
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// 0-based line number.
    pub line: usize,
    /// 0-based column number (byte position in the line).
    pub column: usize,
}

impl Position {
    /// Creates a new `Position`.
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Tracks the current byte offset and line/column while the lexer consumes
/// input.
///
/// Unlike a general purpose cursor this one only moves forward: the lexer
/// commits to a token before touching the cursor, so there is nothing to
/// retreat over.
#[derive(Debug, Clone, Default)]
pub struct LexerCursor {
    pub pos: usize,
    pub position: Position,
}

impl LexerCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by consuming a byte `b`, updating the line/column position.
    #[inline]
    pub fn advance(&mut self, b: u8) {
        if b == b'\n' {
            self.position.line += 1;
            self.position.column = 0;
        } else {
            self.position.column += 1;
        }
        self.pos += 1;
    }

    /// Advance over every byte in `bytes`.
    pub fn advance_all(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.advance(b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let mut cursor = LexerCursor::new();
        cursor.advance_all(b"ab\ncd");
        assert_eq!(cursor.pos, 5);
        assert_eq!(cursor.position, Position::new(1, 2));
    }

    #[test]
    fn newline_resets_column() {
        let mut cursor = LexerCursor::new();
        cursor.advance_all(b"abc\n");
        assert_eq!(cursor.position, Position::new(1, 0));
        assert_eq!(cursor.position.to_string(), "1:0");
    }
}

//! # Calculator Error Type
//!
//! [`CalcError`] is the single error surface of [`Calculator`]. Statement
//! level problems such as division by zero or a malformed statement that the
//! grammar recovers from are not errors: they yield `None` for that
//! statement. Only input the parser cannot get through ends up here.
//!
//! [`Calculator`]: crate::Calculator
use lalr_runtime::{LalrError, Position};
use smartstring::alias::String;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcError {
    /// The automaton or a handler binding could not be set up.
    #[error("grammar error: {0}")]
    Lalr(#[from] LalrError),

    /// The parser rejected the input.
    ///
    /// `line` is 1-based.
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// No token matches the input at `position`.
    #[error("unrecognized input at {position}")]
    Lexical { position: Position },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn calc_error_is_send_sync_static() {
        _assert_send_sync_static::<CalcError>();
    }

    #[test]
    fn messages() {
        let err = CalcError::Syntax {
            line: 2,
            message: "syntax error".into(),
        };
        assert_eq!(err.to_string(), "line 2: syntax error");

        let err = CalcError::Lexical {
            position: Position::new(0, 4),
        };
        assert_eq!(err.to_string(), "unrecognized input at 0:4");

        let err: CalcError = LalrError::MissingLexer.into();
        assert!(matches!(err, CalcError::Lalr(_)));
    }
}

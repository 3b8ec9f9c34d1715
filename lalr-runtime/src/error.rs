//! Error types for building automata and configuring parsers.
//!
//! Grammar-level problems met while parsing (syntax errors, malformed
//! transitions) are never returned as `Err`: the execution loop reports them
//! through a [`Reporter`](crate::Reporter) and moves the parser into a
//! terminal state. [`LalrError`] covers everything that can go wrong *before*
//! a parse starts: assembling and validating a [`ParserStateMachine`],
//! compiling lexical sub-automata and resolving handler identifiers.
//!
//! # Examples
//!
//! ```rust
//! # use lalr_runtime::{LalrError, ParserStateMachine};
//! let builder = ParserStateMachine::builder();
//! let err = builder.build().unwrap_err();
//! assert!(matches!(err, LalrError::MissingStartSymbol));
//! ```
//!
//! [`ParserStateMachine`]: crate::ParserStateMachine

use smartstring::alias::String;
use thiserror::Error;

/// Represents all failures surfaced as `Err` by this crate.
#[derive(Debug, Error)]
pub enum LalrError {
    /// The builder was asked to produce an automaton without a start symbol.
    #[error("automaton has no start symbol")]
    MissingStartSymbol,

    /// The builder was asked to produce an automaton without any state.
    #[error("automaton has no states")]
    NoStates,

    /// A transition or query names a state that does not exist.
    #[error("invalid state index {state} (state count {count})")]
    InvalidState {
        /// The offending state index.
        state: usize,
        /// The number of states in the automaton.
        count: usize,
    },

    /// A transition, token or query names a symbol that does not exist.
    #[error("invalid symbol index {symbol} (symbol count {count})")]
    InvalidSymbol {
        /// The offending symbol index.
        symbol: usize,
        /// The number of symbols in the automaton.
        count: usize,
    },

    /// A reduce transition names an action that does not exist.
    #[error("invalid action index {action} (action count {count})")]
    InvalidAction {
        /// The offending action index.
        action: usize,
        /// The number of actions in the automaton.
        count: usize,
    },

    /// Two transitions were defined for the same (state, symbol) pair.
    #[error("duplicate transition on {symbol:?} in state {state}")]
    DuplicateTransition {
        /// The state holding both transitions.
        state: usize,
        /// The display name of the symbol.
        symbol: String,
    },

    /// A handler was registered under an identifier the action table does
    /// not contain.
    #[error("unknown action {0:?}")]
    UnknownAction(String),

    /// A lexical handler was registered under an identifier the token
    /// sub-automaton does not contain.
    #[error("unknown lexer action {0:?}")]
    UnknownLexerAction(String),

    /// `parse` was called on an automaton that carries no token
    /// sub-automaton.
    #[error("automaton has no lexical sub-automaton")]
    MissingLexer,

    /// A token pattern failed to parse as a regular expression.
    #[error("invalid pattern {pattern:?}: {message}")]
    Pattern {
        /// The pattern as supplied (after literal escaping).
        pattern: String,
        /// The underlying syntax error, rendered.
        message: String,
    },

    /// Compiling token patterns into an NFA failed.
    #[error("nfa build error {0}")]
    Nfa(#[from] regex_automata::nfa::thompson::BuildError),

    /// Determinizing the token NFA failed.
    #[error("dfa build error {0}")]
    Dfa(#[from] regex_automata::dfa::dense::BuildError),

    /// Running a token DFA over input failed.
    #[error("match error {0}")]
    Match(#[from] regex_automata::MatchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn lalr_error_is_send_sync_static() {
        _assert_send_sync_static::<LalrError>();
    }

    #[test]
    fn messages_name_the_offender() {
        let err = LalrError::InvalidState { state: 7, count: 3 };
        assert_eq!(err.to_string(), "invalid state index 7 (state count 3)");

        let err = LalrError::UnknownAction("concat".into());
        assert!(err.to_string().contains("\"concat\""));
    }
}

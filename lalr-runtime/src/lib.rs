//! Runtime for table-driven LALR(1) parsers.
//!
//! An immutable [`ParserStateMachine`] describes symbols, states,
//! transitions and actions. A [`Parser`] drives it over tokens, folding each
//! reduction into a caller-defined value through handlers registered by
//! action identifier, and recovers from syntax errors through productions
//! that mention the reserved `error` symbol.

mod automaton;
mod cursor;
mod error;
mod handler;
mod lexer;
mod node;
mod parser;
mod report;
mod symbol;

pub use crate::automaton::{
    ActionId, ParserState, ParserStateMachine, ParserStateMachineBuilder, ParserTransition,
    SemanticAction, StateId, TransitionType,
};
pub use crate::cursor::{LexerCursor, Position};
pub use crate::error::LalrError;
pub use crate::handler::{ActionFn, ActionHandlers};
pub use crate::lexer::{
    DfaLexer, Lexer, LexerActionFn, LexerActionId, LexerMatch, LexerStateMachine, LexerStats,
    LexerToken, TokenType,
};
pub use crate::node::{NodeValue, ParserNode};
pub use crate::parser::{ParseStatus, Parser, ParserStats};
pub use crate::report::{Diagnostic, ErrorCode, LogReporter, RecordingReporter, Reporter};
pub use crate::symbol::{ParserSymbol, SymbolId, SymbolType};

//! The shift/reduce/accept loop with error-symbol recovery.
//!
//! A [`Parser`] borrows an immutable [`ParserStateMachine`] and owns
//! everything that changes during a parse: the stack, the status flags, the
//! handler tables and the reporter. Tokens arrive either one at a time through
//! [`Parser::advance`] or from a [`Lexer`] through [`Parser::parse_with`] and
//! [`Parser::parse`].

use crate::automaton::{ActionId, ParserStateMachine, StateId, TransitionType};
use crate::cursor::Position;
use crate::error::LalrError;
use crate::handler::ActionHandlers;
use crate::lexer::{DfaLexer, Lexer, LexerActionFn};
use crate::node::{NodeValue, ParserNode};
use crate::report::{ErrorCode, LogReporter, Reporter};
use crate::symbol::SymbolId;
use smartstring::alias::String;
use std::fmt::{self, Write};
use std::rc::Rc;

/// Where a parser stands between two calls to [`Parser::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    Normal,
    /// The stack is unwinding toward a state that can shift the error
    /// symbol. Normal processing resumes once it is shifted.
    Recovering,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserStats {
    pub tokens: usize,
    pub shifts: usize,
    pub reductions: usize,
    pub recoveries: usize,
    pub discards: usize,
}

enum Outcome {
    Shifted,
    Blocked,
    Stopped,
}

pub struct Parser<'a, T> {
    automaton: &'a ParserStateMachine,
    stack: Vec<ParserNode<T>>,
    status: ParseStatus,
    full: bool,
    position: Position,
    handlers: ActionHandlers<'a, T>,
    lexer_handlers: Vec<Option<Rc<LexerActionFn>>>,
    reporter: Option<Box<dyn Reporter + 'a>>,
    trace: bool,
    stats: ParserStats,
}

impl<'a, T: Default> Parser<'a, T> {
    pub fn new(automaton: &'a ParserStateMachine) -> Self {
        let lexer_actions = automaton
            .lexer_state_machine()
            .map_or(0, |lexer| lexer.actions().len());
        let mut parser = Self {
            automaton,
            stack: Vec::new(),
            status: ParseStatus::Normal,
            full: false,
            position: Position::default(),
            handlers: ActionHandlers::new(automaton),
            lexer_handlers: vec![None; lexer_actions],
            reporter: None,
            trace: false,
            stats: ParserStats::default(),
        };
        parser.reset();
        parser
    }

    /// Clears the stack down to a single sentinel at the start state and
    /// clears every per-parse flag. Handlers, reporter and trace setting
    /// are kept.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack
            .push(ParserNode::sentinel(self.automaton.start_state()));
        self.status = ParseStatus::Normal;
        self.full = false;
        self.position = Position::default();
        self.stats = ParserStats::default();
    }

    pub fn automaton(&self) -> &'a ParserStateMachine {
        self.automaton
    }

    pub fn set_action_handler<F>(
        &mut self,
        identifier: &str,
        handler: F,
    ) -> Result<ActionId, LalrError>
    where
        F: FnMut(&[ParserNode<T>]) -> T + 'a,
    {
        self.handlers
            .set(self.automaton, identifier, Some(Box::new(handler)))
    }

    pub fn clear_action_handler(&mut self, identifier: &str) -> Result<ActionId, LalrError> {
        self.handlers.set(self.automaton, identifier, None)
    }

    /// Installs the handler used for reductions whose action has no handler
    /// of its own, or that carry no action at all.
    pub fn set_default_action_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&[ParserNode<T>]) -> T + 'a,
    {
        self.handlers.set_default(Some(Box::new(handler)));
    }

    pub fn clear_default_action_handler(&mut self) {
        self.handlers.set_default(None);
    }

    /// Binds a lexical action used by the built-in lexer in [`Parser::parse`].
    pub fn set_lexer_action_handler<F>(
        &mut self,
        identifier: &str,
        handler: F,
    ) -> Result<(), LalrError>
    where
        F: Fn(&[u8], &mut String) -> usize + 'static,
    {
        let lexer = self
            .automaton
            .lexer_state_machine()
            .ok_or(LalrError::MissingLexer)?;
        let action = lexer
            .find_action(identifier)
            .ok_or_else(|| LalrError::UnknownLexerAction(identifier.into()))?;
        self.lexer_handlers[action.index()] = Some(Rc::new(handler));
        Ok(())
    }

    pub fn set_trace_enabled(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn is_trace_enabled(&self) -> bool {
        self.trace
    }

    pub fn set_reporter<R: Reporter + 'a>(&mut self, reporter: R) {
        self.reporter = Some(Box::new(reporter));
    }

    pub fn clear_reporter(&mut self) {
        self.reporter = None;
    }

    pub fn status(&self) -> ParseStatus {
        self.status
    }

    pub fn accepted(&self) -> bool {
        self.status == ParseStatus::Accepted
    }

    pub fn rejected(&self) -> bool {
        self.status == ParseStatus::Rejected
    }

    /// Whether the last [`Parser::parse`] or [`Parser::parse_with`] consumed
    /// its whole input. A parse can be accepted with trailing input left.
    pub fn fully_consumed(&self) -> bool {
        self.full
    }

    /// Position of the last token taken from a lexer.
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn stack(&self) -> &[ParserNode<T>] {
        &self.stack
    }

    pub fn stats(&self) -> ParserStats {
        self.stats.clone()
    }

    /// The synthesized value of the accepted input, `None` before
    /// acceptance.
    pub fn result(&self) -> Option<&T> {
        if !self.accepted() {
            return None;
        }
        self.stack.first().and_then(|node| node.synthesized())
    }

    /// Moves the accepted value out, leaving the stack empty until the next
    /// [`Parser::reset`].
    pub fn take_result(&mut self) -> Option<T> {
        if !self.accepted() {
            return None;
        }
        self.stack.pop().and_then(|node| node.into_synthesized())
    }

    /// Feeds one token. Returns `false` once the parse is accepted or
    /// rejected; further calls are ignored until [`Parser::reset`].
    pub fn advance(&mut self, symbol: SymbolId, lexeme: &str) -> bool {
        if matches!(self.status, ParseStatus::Accepted | ParseStatus::Rejected) {
            return false;
        }
        self.stats.tokens += 1;
        if log::log_enabled!(log::Level::Trace) {
            self.dump_state(symbol);
        }

        match self.consume(symbol, lexeme) {
            Outcome::Shifted => true,
            Outcome::Stopped => false,
            Outcome::Blocked => {
                if !self.recover() {
                    return false;
                }
                match self.consume(symbol, lexeme) {
                    Outcome::Shifted => true,
                    Outcome::Stopped => false,
                    Outcome::Blocked => self.discard(symbol, lexeme),
                }
            }
        }
    }

    /// Resets the parser, then pulls tokens from `lexer` over `input` until
    /// the parse is accepted or rejected.
    ///
    /// The lexer repeats the end symbol once input is exhausted, so automata
    /// that shift it keep receiving it. A run of end symbols longer than the
    /// number of states cannot lead anywhere and rejects the parse.
    pub fn parse_with<'i, L>(&mut self, lexer: &mut L, input: &'i [u8])
    where
        L: Lexer<'i>,
    {
        let end = self.automaton.end_symbol();
        let mut ends = 0;
        self.reset();
        lexer.reset(input);
        loop {
            lexer.advance();
            self.position = lexer.position();
            let symbol = lexer.symbol();
            if !self.advance(symbol, lexer.lexeme()) {
                break;
            }
            if symbol == end {
                ends += 1;
                if ends > self.automaton.states().len() {
                    self.report_error(ErrorCode::Syntax, format_args!("unexpected end of input"));
                    self.status = ParseStatus::Rejected;
                    break;
                }
            }
        }
        self.full = lexer.full();
        log::debug!(
            "parse finished: status {:?}, fully consumed {}, {:?}",
            self.status,
            self.full,
            self.stats
        );
    }

    /// Parses `input` with a [`DfaLexer`] over the automaton's lexical
    /// sub-automata. Fails only when the automaton carries no token
    /// sub-automaton; grammar errors are reported, not returned.
    pub fn parse(&mut self, input: &[u8]) -> Result<(), LalrError> {
        let mut lexer = DfaLexer::new(self.automaton)?;
        lexer.set_handlers(&self.lexer_handlers);
        self.parse_with(&mut lexer, input);
        Ok(())
    }

    fn top_state(&self) -> Option<StateId> {
        self.stack.last().map(|node| node.state())
    }

    fn consume(&mut self, symbol: SymbolId, lexeme: &str) -> Outcome {
        while let Some(state) = self.top_state() {
            match self.automaton.find_transition(state, symbol).map(|t| t.kind) {
                Some(TransitionType::Reduce {
                    symbol: reduced,
                    length,
                    action,
                }) => {
                    if !self.reduce(reduced, length, action) {
                        return Outcome::Stopped;
                    }
                }
                Some(TransitionType::Shift { state }) => {
                    self.shift(state, symbol, lexeme);
                    return Outcome::Shifted;
                }
                Some(TransitionType::Null) => {
                    log::debug!("null transition in state {} treated as missing", state.index());
                    return Outcome::Blocked;
                }
                None => return Outcome::Blocked,
            }
        }
        Outcome::Blocked
    }

    fn shift(&mut self, state: StateId, symbol: SymbolId, lexeme: &str) {
        let automaton = self.automaton;
        if self.trace {
            self.report_trace(format_args!(
                "SHIFT: ({} {})",
                automaton.symbol(symbol).name(),
                lexeme
            ));
        }
        log::trace!("Shift {} -> <{}>", automaton.symbol(symbol).name(), state.index());
        self.stack.push(ParserNode::shifted(state, symbol, lexeme));
        self.stats.shifts += 1;
    }

    /// Returns `false` when the reduction ended the parse, either by
    /// accepting or by hitting a malformed table.
    fn reduce(&mut self, reduced: SymbolId, length: usize, action: Option<ActionId>) -> bool {
        let automaton = self.automaton;
        if length >= self.stack.len() {
            self.report_error(
                ErrorCode::UnexpectedTransition,
                format_args!(
                    "reduction of {} nodes to {} with {} on the stack",
                    length,
                    automaton.symbol(reduced).name(),
                    self.stack.len()
                ),
            );
            self.status = ParseStatus::Rejected;
            return false;
        }
        let begin = self.stack.len() - length;
        if self.trace {
            self.trace_reduce(reduced, begin);
        }

        if reduced == automaton.start_symbol() {
            if self.stack.len() != 2 {
                self.report_error(
                    ErrorCode::UnexpectedTransition,
                    format_args!("accept with {} nodes on the stack", self.stack.len()),
                );
                self.status = ParseStatus::Rejected;
                return false;
            }
            log::trace!("Accept");
            self.stack.remove(0);
            self.status = ParseStatus::Accepted;
            return false;
        }

        log::trace!("Reduce {} ({})", automaton.symbol(reduced).name(), length);
        let value = self.handlers.dispatch(action, &self.stack[begin..]);
        self.stack.truncate(begin);
        let Some(top) = self.top_state() else {
            return false;
        };
        match automaton.find_transition(top, reduced).map(|t| t.kind) {
            Some(TransitionType::Shift { state }) => {
                self.stack.push(ParserNode::reduced(state, reduced, value));
                self.stats.reductions += 1;
                true
            }
            _ => {
                self.report_error(
                    ErrorCode::UnexpectedTransition,
                    format_args!(
                        "no goto on {} from state {}",
                        automaton.symbol(reduced).name(),
                        top.index()
                    ),
                );
                self.status = ParseStatus::Rejected;
                false
            }
        }
    }

    /// Unwinds the stack until a state can act on the error symbol. Returns
    /// `true` once the error symbol has been shifted.
    fn recover(&mut self) -> bool {
        let error = self.automaton.error_symbol();
        self.status = ParseStatus::Recovering;
        self.stats.recoveries += 1;
        while let Some(state) = self.top_state() {
            match self.automaton.find_transition(state, error).map(|t| t.kind) {
                Some(TransitionType::Shift { state }) => {
                    log::trace!("Recover: shift error in <{}>", state.index());
                    self.shift(state, error, "");
                    self.status = ParseStatus::Normal;
                    return true;
                }
                Some(TransitionType::Reduce {
                    symbol,
                    length,
                    action,
                }) => {
                    if !self.reduce(symbol, length, action) {
                        return false;
                    }
                }
                None => {
                    log::trace!("Recover: pop <{}>", state.index());
                    self.stack.pop();
                }
                Some(TransitionType::Null) => {
                    self.report_error(
                        ErrorCode::UnexpectedTransition,
                        format_args!("null transition on error in state {}", state.index()),
                    );
                    self.status = ParseStatus::Rejected;
                    debug_assert!(false, "null transition on error in state {}", state.index());
                    return false;
                }
            }
        }
        self.report_error(ErrorCode::Syntax, format_args!("syntax error"));
        self.status = ParseStatus::Rejected;
        false
    }

    fn discard(&mut self, symbol: SymbolId, lexeme: &str) -> bool {
        self.stats.discards += 1;
        log::trace!(
            "Discard ({} {})",
            self.automaton.symbol(symbol).name(),
            lexeme
        );
        if symbol == self.automaton.end_symbol() {
            self.report_error(ErrorCode::Syntax, format_args!("unexpected end of input"));
            self.status = ParseStatus::Rejected;
            return false;
        }
        true
    }

    fn trace_reduce(&mut self, reduced: SymbolId, begin: usize) {
        let automaton = self.automaton;
        let mut children = String::new();
        for node in &self.stack[begin..] {
            let name = node
                .symbol()
                .map_or("", |symbol| automaton.symbol(symbol).name());
            let _ = match node.value() {
                NodeValue::Lexeme(lexeme) => write!(children, " ({} {})", name, lexeme),
                NodeValue::Value(_) | NodeValue::Absent => write!(children, " ({} *)", name),
            };
        }
        self.report_trace(format_args!(
            "REDUCE: {} <-{}",
            automaton.symbol(reduced).name(),
            children
        ));
    }

    /// Reported lines are 1-based.
    fn report_error(&mut self, code: ErrorCode, message: fmt::Arguments<'_>) {
        let line = self.position.line + 1;
        match self.reporter.as_mut() {
            Some(reporter) => reporter.report_error(line, code, message),
            None => LogReporter.report_error(line, code, message),
        }
    }

    fn report_trace(&mut self, message: fmt::Arguments<'_>) {
        match self.reporter.as_mut() {
            Some(reporter) => reporter.report_trace(message),
            None => LogReporter.report_trace(message),
        }
    }

    pub fn dump_state(&self, incoming: SymbolId) {
        let mut output = String::new();
        for node in &self.stack {
            let name = node
                .symbol()
                .map_or("", |symbol| self.automaton.symbol(symbol).name());
            let _ = write!(output, "<{}>  {}  ", node.state().index(), name);
        }
        let _ = write!(output, "<-  {}", self.automaton.symbol(incoming).name());
        log::trace!("{}", output);
    }
}

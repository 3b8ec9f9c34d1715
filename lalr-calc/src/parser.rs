//! # Calculator Parser
//!
//! This module couples the calculator automaton from [`grammar`] with
//! calculator-specific semantic actions. It exposes:
//!
//! - [`CalcValue`]: the value synthesized at every grammar symbol,
//! - [`Calculator`]: owns the automaton and evaluates source text into one
//!   result per statement.
//!
//! ## Behavior highlights
//! - **Operator precedence & associativity** are encoded in the grammar
//!   (`expr`/`term`/`factor` layering); all binary operators are
//!   left-associative.
//! - **Arithmetic** is checked: overflow, division by zero and integer
//!   literals out of `i64` range make the enclosing statement evaluate to
//!   `None`.
//! - **Error recovery** happens at statement level through the
//!   `statement -> error ';'` production: a malformed statement yields `None`
//!   and parsing continues with the next one.
//!
//! [`grammar`]: crate::grammar

use crate::grammar::{self, calc_automaton};
use crate::CalcError;
use lalr_runtime::{Parser, ParserNode, ParserStateMachine, RecordingReporter};
use smartstring::alias::String;

/// Value attached to a grammar symbol during a parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CalcValue {
    /// Nothing to report: a failed computation or a recovered statement.
    #[default]
    None,
    Number(i64),
    /// One entry per statement, in source order.
    Statements(Vec<Option<i64>>),
}

impl CalcValue {
    fn number(node: &ParserNode<CalcValue>) -> Option<i64> {
        match node.synthesized() {
            Some(CalcValue::Number(n)) => Some(*n),
            _ => None,
        }
    }
}

fn binary(nodes: &[ParserNode<CalcValue>], op: char, f: fn(i64, i64) -> Option<i64>) -> CalcValue {
    match (CalcValue::number(&nodes[0]), CalcValue::number(&nodes[2])) {
        (Some(a), Some(b)) => match f(a, b) {
            Some(n) => CalcValue::Number(n),
            None => {
                log::warn!("{} {} {} is out of range", a, op, b);
                CalcValue::None
            }
        },
        _ => CalcValue::None,
    }
}

fn integer(nodes: &[ParserNode<CalcValue>]) -> CalcValue {
    match nodes[0].lexeme().parse::<i64>() {
        Ok(n) => CalcValue::Number(n),
        Err(err) => {
            log::warn!("integer {:?}: {}", nodes[0].lexeme(), err);
            CalcValue::None
        }
    }
}

fn append(nodes: &[ParserNode<CalcValue>]) -> CalcValue {
    let mut values = match nodes[0].synthesized() {
        Some(CalcValue::Statements(values)) => values.clone(),
        _ => Vec::new(),
    };
    values.push(CalcValue::number(&nodes[1]));
    CalcValue::Statements(values)
}

/// Consumes a block comment body after the opening `/*`, up to and including
/// the closing `*/` or the end of input.
fn block_comment(rest: &[u8], lexeme: &mut String) -> usize {
    let len = rest
        .windows(2)
        .position(|w| w == b"*/")
        .map_or(rest.len(), |i| i + 2);
    lexeme.push_str(&std::string::String::from_utf8_lossy(&rest[..len]));
    len
}

/// Evaluates calculator programs.
///
/// ```rust
/// # use lalr_calc::Calculator;
/// let calculator = Calculator::new().unwrap();
/// let values = calculator.evaluate("1 + 2 * 3; (1 + 2) * 3; 1 / 0;").unwrap();
/// assert_eq!(values, vec![Some(7), Some(9), None]);
/// ```
#[derive(Debug)]
pub struct Calculator {
    automaton: ParserStateMachine,
    trace: bool,
}

impl Calculator {
    pub fn new() -> Result<Self, CalcError> {
        Ok(Self {
            automaton: calc_automaton()?,
            trace: false,
        })
    }

    /// When enabled, shift/reduce traces are logged at `info` level.
    pub fn set_trace_enabled(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn automaton(&self) -> &ParserStateMachine {
        &self.automaton
    }

    /// Creates a parser with every calculator action bound.
    pub fn parser(&self) -> Result<Parser<'_, CalcValue>, CalcError> {
        let mut parser = Parser::new(&self.automaton);
        parser.set_action_handler(grammar::APPEND, append)?;
        parser.set_action_handler(grammar::FIRST, |nodes| {
            CalcValue::Statements(vec![CalcValue::number(&nodes[0])])
        })?;
        parser.set_action_handler(grammar::STATEMENT, |nodes| {
            nodes[0].synthesized().cloned().unwrap_or_default()
        })?;
        parser.set_action_handler(grammar::RECOVER, |_| {
            log::debug!("statement skipped after syntax error");
            CalcValue::None
        })?;
        parser.set_action_handler(grammar::ADD, |nodes| binary(nodes, '+', i64::checked_add))?;
        parser.set_action_handler(grammar::SUB, |nodes| binary(nodes, '-', i64::checked_sub))?;
        parser.set_action_handler(grammar::MUL, |nodes| binary(nodes, '*', i64::checked_mul))?;
        parser.set_action_handler(grammar::DIV, |nodes| binary(nodes, '/', i64::checked_div))?;
        parser.set_action_handler(grammar::PASS, |nodes| {
            nodes[0].synthesized().cloned().unwrap_or_default()
        })?;
        parser.set_action_handler(grammar::GROUP, |nodes| {
            nodes[1].synthesized().cloned().unwrap_or_default()
        })?;
        parser.set_action_handler(grammar::INTEGER, integer)?;
        parser.set_lexer_action_handler(grammar::BLOCK_COMMENT, block_comment)?;
        Ok(parser)
    }

    /// Evaluates every statement of `input`.
    ///
    /// Statements that fail to compute, or that were skipped by error
    /// recovery, evaluate to `None`.
    pub fn evaluate(&self, input: &str) -> Result<Vec<Option<i64>>, CalcError> {
        let recorder = RecordingReporter::new();
        let mut parser = self.parser()?;
        parser.set_reporter(recorder.clone());
        parser.set_trace_enabled(self.trace);
        parser.parse(input.as_bytes())?;

        for line in recorder.traces() {
            log::info!("{}", line);
        }
        if !parser.fully_consumed() {
            return Err(CalcError::Lexical {
                position: parser.position(),
            });
        }
        if let Some((line, _, message)) = recorder.errors().into_iter().next() {
            return Err(CalcError::Syntax { line, message });
        }
        log::debug!("{:?}", parser.stats());
        match parser.take_result() {
            Some(CalcValue::Statements(values)) => Ok(values),
            other => Err(CalcError::Syntax {
                line: parser.position().line + 1,
                message: format!("unexpected result {:?}", other).into(),
            }),
        }
    }
}

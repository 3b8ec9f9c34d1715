//! The narrow diagnostics interface used by the parser.
//!
//! The parser never formats to a destination itself. Errors and trace lines
//! are handed to a [`Reporter`] as pre-built [`fmt::Arguments`], so a
//! reporter that drops a message never pays for rendering it. When no
//! reporter is installed, the parser falls back to the `log` facade.

use smartstring::alias::String;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Classifies the errors a parser can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Error recovery exhausted the stack, or the input ended in a state
    /// that could not synchronise.
    Syntax,
    /// The automaton produced a transition the engine cannot act on.
    UnexpectedTransition,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Syntax => f.write_str("syntax"),
            ErrorCode::UnexpectedTransition => f.write_str("unexpected-transition"),
        }
    }
}

/// Sink for parser diagnostics.
pub trait Reporter {
    fn report_error(&mut self, line: usize, code: ErrorCode, message: fmt::Arguments<'_>);

    fn report_trace(&mut self, message: fmt::Arguments<'_>);
}

/// A reporter that forwards everything to the `log` facade.
///
/// This is what the parser does when no reporter is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report_error(&mut self, line: usize, code: ErrorCode, message: fmt::Arguments<'_>) {
        log::error!("line {}: {} error: {}", line, code, message);
    }

    fn report_trace(&mut self, message: fmt::Arguments<'_>) {
        log::info!("{}", message);
    }
}

/// One diagnostic captured by a [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Error {
        line: usize,
        code: ErrorCode,
        message: String,
    },
    Trace {
        message: String,
    },
}

/// A reporter that keeps every diagnostic in memory.
///
/// Clones share the same record, so a test can hand one clone to the parser
/// and inspect the other afterwards.
///
/// ```rust
/// # use lalr_runtime::{ErrorCode, RecordingReporter, Reporter};
/// let recorder = RecordingReporter::new();
/// let mut sink = recorder.clone();
/// sink.report_error(3, ErrorCode::Syntax, format_args!("syntax error"));
/// assert_eq!(recorder.errors().len(), 1);
/// assert_eq!(recorder.traces().len(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    records: Rc<RefCell<Vec<Diagnostic>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.records.borrow().clone()
    }

    /// Returns `(line, code, message)` for every recorded error, in order.
    pub fn errors(&self) -> Vec<(usize, ErrorCode, String)> {
        self.records
            .borrow()
            .iter()
            .filter_map(|d| match d {
                Diagnostic::Error {
                    line,
                    code,
                    message,
                } => Some((*line, *code, message.clone())),
                Diagnostic::Trace { .. } => None,
            })
            .collect()
    }

    pub fn traces(&self) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter_map(|d| match d {
                Diagnostic::Trace { message } => Some(message.clone()),
                Diagnostic::Error { .. } => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl Reporter for RecordingReporter {
    fn report_error(&mut self, line: usize, code: ErrorCode, message: fmt::Arguments<'_>) {
        self.records.borrow_mut().push(Diagnostic::Error {
            line,
            code,
            message: fmt::format(message).into(),
        });
    }

    fn report_trace(&mut self, message: fmt::Arguments<'_>) {
        self.records.borrow_mut().push(Diagnostic::Trace {
            message: fmt::format(message).into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_reporter_separates_errors_and_traces() {
        let recorder = RecordingReporter::new();
        let mut sink = recorder.clone();
        sink.report_trace(format_args!("SHIFT: ({} {})", "a", "a"));
        sink.report_error(2, ErrorCode::Syntax, format_args!("syntax error"));

        assert_eq!(recorder.traces(), vec![String::from("SHIFT: (a a)")]);
        assert_eq!(
            recorder.errors(),
            vec![(2, ErrorCode::Syntax, String::from("syntax error"))]
        );
        assert_eq!(recorder.diagnostics().len(), 2);

        recorder.clear();
        assert!(recorder.diagnostics().is_empty());
    }

    #[test]
    fn log_reporter_accepts_everything() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut reporter = LogReporter;
        reporter.report_trace(format_args!("trace"));
        reporter.report_error(0, ErrorCode::UnexpectedTransition, format_args!("bad"));
    }
}

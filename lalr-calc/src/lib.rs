//! # lalr-calc
//!
//! A small demonstration crate built on **lalr-runtime**: an integer
//! calculator whose LALR(1) tables are assembled with the runtime's builder
//! and whose semantics are plain functions registered by action identifier.
//!
//! ## Overview
//!
//! - [`grammar`] builds the automaton and its token sub-automata.
//! - [`parser`] binds semantic actions and evaluates source text
//!   ([`Calculator`]).
//! - [`error`] defines [`CalcError`].
//!
//! ## Example
//!
//! ```rust
//! use lalr_calc::Calculator;
//!
//! let calculator = Calculator::new().unwrap();
//! let values = calculator.evaluate("1 + ; 2 * 3;").unwrap();
//! assert_eq!(values, vec![None, Some(6)]);
//! ```
pub mod error;
pub mod grammar;
pub mod parser;

pub use error::CalcError;
pub use grammar::calc_automaton;
pub use parser::{CalcValue, Calculator};

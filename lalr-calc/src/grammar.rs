//! # Calculator Grammar
//!
//! The SLR(1) automaton of the calculator language, assembled through
//! [`ParserStateMachineBuilder`](lalr_runtime::ParserStateMachineBuilder):
//!
//! ```text
//! program    -> statements
//! statements -> statements statement      (append)
//!             | statement                 (first)
//! statement  -> expr ';'                  (statement)
//!             | error ';'                 (recover)
//! expr       -> expr '+' term             (add)
//!             | expr '-' term             (sub)
//!             | term                      (pass)
//! term       -> term '*' factor           (mul)
//!             | term '/' factor           (div)
//!             | factor                    (pass)
//! factor     -> '(' expr ')'              (group)
//!             | integer                   (integer)
//! ```
//!
//! `program` is the start symbol, so reducing `statements` to it accepts.
//! Identifiers in parentheses are the action identifiers handlers are
//! registered under.
//!
//! The token sub-automaton recognizes the operators, decimal integers, `#`
//! line comments and `/* */` block comments. Block comments are closed by the
//! `block_comment` lexical action.

use lalr_runtime::{
    ActionId, LalrError, LexerStateMachine, LexerToken, ParserStateMachine,
    ParserStateMachineBuilder, StateId, SymbolId,
};

pub const APPEND: &str = "append";
pub const FIRST: &str = "first";
pub const STATEMENT: &str = "statement";
pub const RECOVER: &str = "recover";
pub const ADD: &str = "add";
pub const SUB: &str = "sub";
pub const PASS: &str = "pass";
pub const MUL: &str = "mul";
pub const DIV: &str = "div";
pub const GROUP: &str = "group";
pub const INTEGER: &str = "integer";

pub const BLOCK_COMMENT: &str = "block_comment";

fn reduce_on(
    b: &mut ParserStateMachineBuilder,
    state: StateId,
    lookaheads: &[SymbolId],
    reduced: SymbolId,
    length: usize,
    action: ActionId,
) {
    for &symbol in lookaheads {
        b.reduce(state, symbol, reduced, length, Some(action));
    }
}

/// Builds the calculator automaton together with its lexical sub-automata.
pub fn calc_automaton() -> Result<ParserStateMachine, LalrError> {
    let mut b = ParserStateMachine::builder();

    let program = b.non_terminal("program");
    let statements = b.non_terminal("statements");
    let statement = b.non_terminal("statement");
    let expr = b.non_terminal("expr");
    let term = b.non_terminal("term");
    let factor = b.non_terminal("factor");

    let semi = b.terminal(";");
    let plus = b.terminal("+");
    let minus = b.terminal("-");
    let star = b.terminal("*");
    let slash = b.terminal("/");
    let lparen = b.terminal("(");
    let rparen = b.terminal(")");
    let integer = b.terminal("integer");
    let end = b.end_symbol();
    let error = b.error_symbol();

    let append = b.action(APPEND);
    let first = b.action(FIRST);
    let stat = b.action(STATEMENT);
    let recover = b.action(RECOVER);
    let add = b.action(ADD);
    let sub = b.action(SUB);
    let pass = b.action(PASS);
    let mul = b.action(MUL);
    let div = b.action(DIV);
    let group = b.action(GROUP);
    let number = b.action(INTEGER);

    let follow_statement = [end, error, lparen, integer];
    let follow_expr = [semi, plus, minus, rparen];
    let follow_term = [semi, plus, minus, rparen, star, slash];

    let s: Vec<StateId> = (0..22).map(|_| b.state()).collect();

    b.start_symbol(program)
        .shift(s[0], statements, s[1])
        .shift(s[0], statement, s[2])
        .shift(s[0], expr, s[3])
        .shift(s[0], error, s[4])
        .shift(s[0], term, s[5])
        .shift(s[0], factor, s[6])
        .shift(s[0], lparen, s[7])
        .shift(s[0], integer, s[8]);

    b.reduce(s[1], end, program, 1, None)
        .shift(s[1], statement, s[9])
        .shift(s[1], expr, s[3])
        .shift(s[1], error, s[4])
        .shift(s[1], term, s[5])
        .shift(s[1], factor, s[6])
        .shift(s[1], lparen, s[7])
        .shift(s[1], integer, s[8]);

    reduce_on(&mut b, s[2], &follow_statement, statements, 1, first);

    b.shift(s[3], semi, s[10])
        .shift(s[3], plus, s[11])
        .shift(s[3], minus, s[12]);

    b.shift(s[4], semi, s[13]);

    reduce_on(&mut b, s[5], &follow_expr, expr, 1, pass);
    b.shift(s[5], star, s[14]).shift(s[5], slash, s[15]);

    reduce_on(&mut b, s[6], &follow_term, term, 1, pass);

    b.shift(s[7], expr, s[16])
        .shift(s[7], term, s[5])
        .shift(s[7], factor, s[6])
        .shift(s[7], lparen, s[7])
        .shift(s[7], integer, s[8]);

    reduce_on(&mut b, s[8], &follow_term, factor, 1, number);
    reduce_on(&mut b, s[9], &follow_statement, statements, 2, append);
    reduce_on(&mut b, s[10], &follow_statement, statement, 2, stat);

    for (state, target) in [(s[11], s[17]), (s[12], s[18])] {
        b.shift(state, term, target)
            .shift(state, factor, s[6])
            .shift(state, lparen, s[7])
            .shift(state, integer, s[8]);
    }

    reduce_on(&mut b, s[13], &follow_statement, statement, 2, recover);

    for (state, target) in [(s[14], s[19]), (s[15], s[20])] {
        b.shift(state, factor, target)
            .shift(state, lparen, s[7])
            .shift(state, integer, s[8]);
    }

    b.shift(s[16], rparen, s[21])
        .shift(s[16], plus, s[11])
        .shift(s[16], minus, s[12]);

    reduce_on(&mut b, s[17], &follow_expr, expr, 3, add);
    b.shift(s[17], star, s[14]).shift(s[17], slash, s[15]);
    reduce_on(&mut b, s[18], &follow_expr, expr, 3, sub);
    b.shift(s[18], star, s[14]).shift(s[18], slash, s[15]);

    reduce_on(&mut b, s[19], &follow_term, term, 3, mul);
    reduce_on(&mut b, s[20], &follow_term, term, 3, div);
    reduce_on(&mut b, s[21], &follow_term, factor, 3, group);

    b.lexer(LexerStateMachine::new(vec![
        LexerToken::literal(";", semi),
        LexerToken::literal("+", plus),
        LexerToken::literal("-", minus),
        LexerToken::literal("*", star),
        LexerToken::literal("/", slash),
        LexerToken::literal("(", lparen),
        LexerToken::literal(")", rparen),
        LexerToken::regex("[0-9]+", integer),
        LexerToken::skip("#[^\n]*"),
        LexerToken::skip(r"/\*").with_action(BLOCK_COMMENT),
    ])?);
    b.whitespace(LexerStateMachine::new(vec![LexerToken::skip("[ \t\r\n]+")])?);

    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lalr_runtime::TransitionType;

    #[test]
    fn table_has_every_state_and_action() {
        let automaton = calc_automaton().unwrap();
        assert_eq!(automaton.states().len(), 22);
        assert_eq!(automaton.actions().len(), 11);
        for identifier in [
            APPEND, FIRST, STATEMENT, RECOVER, ADD, SUB, PASS, MUL, DIV, GROUP, INTEGER,
        ] {
            assert!(automaton.find_action(identifier).is_some(), "{identifier}");
        }
        let lexer = automaton.lexer_state_machine().unwrap();
        assert!(lexer.find_action(BLOCK_COMMENT).is_some());
    }

    #[test]
    fn statement_level_states_synchronise_on_error() {
        let automaton = calc_automaton().unwrap();
        let error = automaton.error_symbol();
        let kinds: Vec<_> = [0, 1]
            .into_iter()
            .map(|i| automaton.states()[i].id())
            .map(|state| automaton.find_transition(state, error).map(|t| t.kind))
            .collect();
        assert!(kinds
            .iter()
            .all(|kind| matches!(kind, Some(TransitionType::Shift { .. }))));
    }

    #[test]
    fn accepts_only_at_end_of_input() {
        let automaton = calc_automaton().unwrap();
        let program = automaton.find_symbol("program").unwrap();
        let accepting: Vec<_> = automaton
            .states()
            .iter()
            .flat_map(|state| state.transitions())
            .filter(|t| {
                matches!(t.kind, TransitionType::Reduce { symbol, .. } if symbol == program)
            })
            .collect();
        assert_eq!(accepting.len(), 1);
        assert_eq!(accepting[0].symbol, automaton.end_symbol());
    }
}

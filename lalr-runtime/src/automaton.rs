//! The immutable parsing automaton.
//!
//! A [`ParserStateMachine`] is produced once (normally by a table generator,
//! here through [`ParserStateMachineBuilder`]) and then only read. It holds
//! the symbol table, the state table with its transitions, the action table
//! and the two lexical sub-automata used by the built-in lexer. Every parser
//! borrows it immutably, so one automaton can serve many parsers, including
//! parsers running on different threads.

use crate::error::LalrError;
use crate::lexer::LexerStateMachine;
use crate::symbol::{ParserSymbol, SymbolId, SymbolType};
use smartstring::alias::String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StateId(pub(crate) usize);

impl StateId {
    /// The start state is always the first state of the table.
    pub const START: StateId = StateId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<StateId> for usize {
    fn from(state: StateId) -> Self {
        state.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(pub(crate) usize);

impl ActionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<ActionId> for usize {
    fn from(action: ActionId) -> Self {
        action.0
    }
}

/// What the parser does when it sees a symbol in a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionType {
    /// An entry with no move attached. Well-formed tables never contain one;
    /// the engine treats it as an internal inconsistency.
    Null,
    /// Push the symbol and move to `state`.
    Shift { state: StateId },
    /// Replace the top `length` stack nodes by one node for `symbol`,
    /// synthesizing its value through `action` when one is attached.
    Reduce {
        symbol: SymbolId,
        length: usize,
        action: Option<ActionId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserTransition {
    pub symbol: SymbolId,
    pub kind: TransitionType,
}

impl ParserTransition {
    pub fn shift(symbol: SymbolId, state: StateId) -> Self {
        Self {
            symbol,
            kind: TransitionType::Shift { state },
        }
    }

    pub fn reduce(
        symbol: SymbolId,
        reduced_symbol: SymbolId,
        length: usize,
        action: Option<ActionId>,
    ) -> Self {
        Self {
            symbol,
            kind: TransitionType::Reduce {
                symbol: reduced_symbol,
                length,
                action,
            },
        }
    }
}

/// A state: its transitions, kept sorted by symbol so lookup is a binary
/// search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserState {
    id: StateId,
    transitions: Vec<ParserTransition>,
}

impl ParserState {
    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn transitions(&self) -> &[ParserTransition] {
        &self.transitions
    }

    #[inline]
    pub fn find_transition(&self, symbol: SymbolId) -> Option<&ParserTransition> {
        self.transitions
            .binary_search_by_key(&symbol, |t| t.symbol)
            .ok()
            .map(|i| &self.transitions[i])
    }
}

/// An entry of the action table: a stable identifier that handlers are
/// registered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticAction {
    id: ActionId,
    identifier: String,
}

impl SemanticAction {
    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug)]
pub struct ParserStateMachine {
    symbols: Vec<ParserSymbol>,
    states: Vec<ParserState>,
    actions: Vec<SemanticAction>,
    start_symbol: SymbolId,
    end_symbol: SymbolId,
    error_symbol: SymbolId,
    lexer: Option<LexerStateMachine>,
    whitespace: Option<LexerStateMachine>,
}

impl ParserStateMachine {
    pub fn builder() -> ParserStateMachineBuilder {
        ParserStateMachineBuilder::new()
    }

    pub fn symbols(&self) -> &[ParserSymbol] {
        &self.symbols
    }

    /// Panics if `id` does not belong to this automaton.
    pub fn symbol(&self, id: SymbolId) -> &ParserSymbol {
        &self.symbols[id.0]
    }

    /// Finds a symbol by display name. Linear; meant for setting up callers,
    /// not for the parse loop.
    pub fn find_symbol(&self, name: &str) -> Option<SymbolId> {
        self.symbols.iter().find(|s| s.name() == name).map(|s| s.id())
    }

    pub fn states(&self) -> &[ParserState] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&ParserState> {
        self.states.get(id.0)
    }

    pub fn start_state(&self) -> StateId {
        StateId::START
    }

    pub fn actions(&self) -> &[SemanticAction] {
        &self.actions
    }

    /// Resolves an action identifier to its index. Linear scan.
    pub fn find_action(&self, identifier: &str) -> Option<ActionId> {
        self.actions
            .iter()
            .find(|a| a.identifier() == identifier)
            .map(|a| a.id())
    }

    pub fn start_symbol(&self) -> SymbolId {
        self.start_symbol
    }

    pub fn end_symbol(&self) -> SymbolId {
        self.end_symbol
    }

    pub fn error_symbol(&self) -> SymbolId {
        self.error_symbol
    }

    pub fn lexer_state_machine(&self) -> Option<&LexerStateMachine> {
        self.lexer.as_ref()
    }

    pub fn whitespace_state_machine(&self) -> Option<&LexerStateMachine> {
        self.whitespace.as_ref()
    }

    #[inline]
    pub fn find_transition(&self, state: StateId, symbol: SymbolId) -> Option<&ParserTransition> {
        self.states.get(state.0)?.find_transition(symbol)
    }
}

/// Assembles a [`ParserStateMachine`] and validates it on [`build`].
///
/// The end-of-input symbol (`.end`) and the reserved error symbol (`error`)
/// exist from the start; the first state added is the start state.
///
/// ```rust
/// # use lalr_runtime::ParserStateMachine;
/// // S -> a
/// let mut b = ParserStateMachine::builder();
/// let start = b.non_terminal(".start");
/// let s = b.non_terminal("S");
/// let a = b.terminal("a");
/// let end = b.end_symbol();
/// let (s0, s1, s2) = (b.state(), b.state(), b.state());
/// b.start_symbol(start)
///     .shift(s0, a, s1)
///     .shift(s0, s, s2)
///     .reduce(s1, end, s, 1, None)
///     .reduce(s2, end, start, 1, None);
/// let automaton = b.build().unwrap();
/// assert_eq!(automaton.states().len(), 3);
/// ```
///
/// [`build`]: ParserStateMachineBuilder::build
#[derive(Debug)]
pub struct ParserStateMachineBuilder {
    symbols: Vec<ParserSymbol>,
    actions: Vec<SemanticAction>,
    states: usize,
    transitions: Vec<(StateId, ParserTransition)>,
    start_symbol: Option<SymbolId>,
    end_symbol: SymbolId,
    error_symbol: SymbolId,
    lexer: Option<LexerStateMachine>,
    whitespace: Option<LexerStateMachine>,
}

impl Default for ParserStateMachineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserStateMachineBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            symbols: Vec::new(),
            actions: Vec::new(),
            states: 0,
            transitions: Vec::new(),
            start_symbol: None,
            end_symbol: SymbolId(0),
            error_symbol: SymbolId(0),
            lexer: None,
            whitespace: None,
        };
        builder.end_symbol = builder.add_symbol(".end", SymbolType::End);
        builder.error_symbol = builder.add_symbol("error", SymbolType::Terminal);
        builder
    }

    fn add_symbol(&mut self, name: &str, kind: SymbolType) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        self.symbols.push(ParserSymbol::new(id, name, kind));
        id
    }

    pub fn terminal(&mut self, name: &str) -> SymbolId {
        self.add_symbol(name, SymbolType::Terminal)
    }

    pub fn non_terminal(&mut self, name: &str) -> SymbolId {
        self.add_symbol(name, SymbolType::NonTerminal)
    }

    pub fn end_symbol(&self) -> SymbolId {
        self.end_symbol
    }

    pub fn error_symbol(&self) -> SymbolId {
        self.error_symbol
    }

    /// Sets the augmented start symbol; reducing to it accepts the input.
    pub fn start_symbol(&mut self, symbol: SymbolId) -> &mut Self {
        self.start_symbol = Some(symbol);
        self
    }

    /// Adds an action identifier, returning the existing index when the
    /// identifier is already present.
    pub fn action(&mut self, identifier: &str) -> ActionId {
        if let Some(action) = self.actions.iter().find(|a| a.identifier() == identifier) {
            return action.id();
        }
        let id = ActionId(self.actions.len());
        self.actions.push(SemanticAction {
            id,
            identifier: identifier.into(),
        });
        id
    }

    pub fn state(&mut self) -> StateId {
        let id = StateId(self.states);
        self.states += 1;
        id
    }

    pub fn transition(&mut self, state: StateId, transition: ParserTransition) -> &mut Self {
        self.transitions.push((state, transition));
        self
    }

    pub fn shift(&mut self, state: StateId, symbol: SymbolId, to: StateId) -> &mut Self {
        self.transition(state, ParserTransition::shift(symbol, to))
    }

    pub fn reduce(
        &mut self,
        state: StateId,
        symbol: SymbolId,
        reduced_symbol: SymbolId,
        length: usize,
        action: Option<ActionId>,
    ) -> &mut Self {
        self.transition(
            state,
            ParserTransition::reduce(symbol, reduced_symbol, length, action),
        )
    }

    pub fn lexer(&mut self, lexer: LexerStateMachine) -> &mut Self {
        self.lexer = Some(lexer);
        self
    }

    pub fn whitespace(&mut self, whitespace: LexerStateMachine) -> &mut Self {
        self.whitespace = Some(whitespace);
        self
    }

    fn check_state(&self, state: StateId) -> Result<(), LalrError> {
        if state.0 >= self.states {
            return Err(LalrError::InvalidState {
                state: state.0,
                count: self.states,
            });
        }
        Ok(())
    }

    fn check_symbol(&self, symbol: SymbolId) -> Result<(), LalrError> {
        if symbol.0 >= self.symbols.len() {
            return Err(LalrError::InvalidSymbol {
                symbol: symbol.0,
                count: self.symbols.len(),
            });
        }
        Ok(())
    }

    fn check_transition(
        &self,
        state: StateId,
        transition: &ParserTransition,
    ) -> Result<(), LalrError> {
        self.check_state(state)?;
        self.check_symbol(transition.symbol)?;
        match transition.kind {
            TransitionType::Null => {}
            TransitionType::Shift { state } => self.check_state(state)?,
            TransitionType::Reduce { symbol, action, .. } => {
                self.check_symbol(symbol)?;
                if let Some(action) = action {
                    if action.0 >= self.actions.len() {
                        return Err(LalrError::InvalidAction {
                            action: action.0,
                            count: self.actions.len(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn build(self) -> Result<ParserStateMachine, LalrError> {
        let start_symbol = self.start_symbol.ok_or(LalrError::MissingStartSymbol)?;
        self.check_symbol(start_symbol)?;
        if self.states == 0 {
            return Err(LalrError::NoStates);
        }
        for (state, transition) in &self.transitions {
            self.check_transition(*state, transition)?;
        }
        for sub in [&self.lexer, &self.whitespace].into_iter().flatten() {
            for symbol in sub.tokens().iter().filter_map(|t| t.symbol) {
                self.check_symbol(symbol)?;
            }
        }

        let mut states: Vec<ParserState> = (0..self.states)
            .map(|i| ParserState {
                id: StateId(i),
                transitions: Vec::new(),
            })
            .collect();
        for (state, transition) in self.transitions {
            states[state.0].transitions.push(transition);
        }
        for state in &mut states {
            state.transitions.sort_by_key(|t| t.symbol);
            if let Some(pair) = state.transitions.windows(2).find(|w| w[0].symbol == w[1].symbol) {
                return Err(LalrError::DuplicateTransition {
                    state: state.id.0,
                    symbol: self.symbols[pair[0].symbol.0].name().into(),
                });
            }
        }

        Ok(ParserStateMachine {
            symbols: self.symbols,
            states,
            actions: self.actions,
            start_symbol,
            end_symbol: self.end_symbol,
            error_symbol: self.error_symbol,
            lexer: self.lexer,
            whitespace: self.whitespace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S -> a
    fn single_terminal() -> ParserStateMachineBuilder {
        let mut b = ParserStateMachine::builder();
        let start = b.non_terminal(".start");
        let s = b.non_terminal("S");
        let a = b.terminal("a");
        let end = b.end_symbol();
        let (s0, s1, s2) = (b.state(), b.state(), b.state());
        b.start_symbol(start)
            .shift(s0, a, s1)
            .shift(s0, s, s2)
            .reduce(s1, end, s, 1, None)
            .reduce(s2, end, start, 1, None);
        b
    }

    #[test]
    fn builds_and_looks_up_transitions() {
        let automaton = single_terminal().build().unwrap();
        let a = automaton.find_symbol("a").unwrap();
        let s = automaton.find_symbol("S").unwrap();
        let end = automaton.end_symbol();

        assert_eq!(automaton.start_state(), StateId::START);
        assert_eq!(
            automaton.find_transition(StateId(0), a).map(|t| t.kind),
            Some(TransitionType::Shift { state: StateId(1) })
        );
        assert_eq!(
            automaton.find_transition(StateId(1), end).map(|t| t.kind),
            Some(TransitionType::Reduce {
                symbol: s,
                length: 1,
                action: None
            })
        );
        assert!(automaton.find_transition(StateId(1), a).is_none());
        assert!(automaton.find_transition(StateId(9), a).is_none());
    }

    #[test]
    fn transitions_are_sorted_by_symbol() {
        let automaton = single_terminal().build().unwrap();
        let state = automaton.state(StateId(0)).unwrap();
        let symbols: Vec<_> = state.transitions().iter().map(|t| t.symbol).collect();
        let mut sorted = symbols.clone();
        sorted.sort();
        assert_eq!(symbols, sorted);
    }

    #[test]
    fn reserved_symbols_exist_up_front() {
        let automaton = single_terminal().build().unwrap();
        assert_eq!(automaton.symbol(automaton.end_symbol()).kind(), SymbolType::End);
        assert_eq!(automaton.symbol(automaton.error_symbol()).name(), "error");
        assert_eq!(automaton.find_symbol("error"), Some(automaton.error_symbol()));
    }

    #[test]
    fn actions_are_deduplicated_by_identifier() {
        let mut b = single_terminal();
        let first = b.action("concat");
        let second = b.action("concat");
        let third = b.action("other");
        assert_eq!(first, second);
        assert_ne!(first, third);
        let automaton = b.build().unwrap();
        assert_eq!(automaton.find_action("other"), Some(third));
        assert_eq!(automaton.find_action("missing"), None);
        assert_eq!(automaton.actions().len(), 2);
    }

    #[test]
    fn rejects_missing_start_symbol() {
        let mut b = ParserStateMachine::builder();
        b.state();
        assert!(matches!(b.build(), Err(LalrError::MissingStartSymbol)));
    }

    #[test]
    fn rejects_empty_state_table() {
        let mut b = ParserStateMachine::builder();
        let start = b.non_terminal(".start");
        b.start_symbol(start);
        assert!(matches!(b.build(), Err(LalrError::NoStates)));
    }

    #[test]
    fn rejects_dangling_references() {
        let mut b = single_terminal();
        let a = SymbolId(4);
        b.shift(StateId(0), a, StateId(7));
        assert!(matches!(
            b.build(),
            Err(LalrError::InvalidState { state: 7, count: 3 })
        ));

        let mut b = single_terminal();
        b.shift(StateId(0), SymbolId(42), StateId(1));
        assert!(matches!(
            b.build(),
            Err(LalrError::InvalidSymbol { symbol: 42, .. })
        ));

        let mut b = single_terminal();
        let end = b.end_symbol();
        b.reduce(StateId(0), end, SymbolId(3), 1, Some(ActionId(5)));
        assert!(matches!(
            b.build(),
            Err(LalrError::InvalidAction { action: 5, count: 0 })
        ));
    }

    #[test]
    fn rejects_duplicate_transitions() {
        let mut b = single_terminal();
        let a = SymbolId(4);
        b.shift(StateId(0), a, StateId(2));
        let err = b.build().unwrap_err();
        assert!(matches!(err, LalrError::DuplicateTransition { state: 0, .. }));
        assert!(err.to_string().contains("\"a\""));
    }

    #[test]
    fn automaton_is_shareable() {
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<ParserStateMachine>();
    }
}

use crate::automaton::StateId;
use crate::symbol::SymbolId;
use smartstring::alias::String;

/// The payload of a stack slot.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue<T> {
    /// The bottom-of-stack sentinel carries nothing.
    Absent,
    /// A freshly shifted terminal carries its raw lexeme.
    Lexeme(String),
    /// A reduced non-terminal carries the value its action synthesized.
    Value(T),
}

/// One parse stack entry: the state reached, the symbol consumed to reach it
/// and the value attached to that symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserNode<T> {
    state: StateId,
    symbol: Option<SymbolId>,
    value: NodeValue<T>,
}

impl<T> ParserNode<T> {
    pub(crate) fn sentinel(state: StateId) -> Self {
        Self {
            state,
            symbol: None,
            value: NodeValue::Absent,
        }
    }

    pub(crate) fn shifted(state: StateId, symbol: SymbolId, lexeme: &str) -> Self {
        Self {
            state,
            symbol: Some(symbol),
            value: NodeValue::Lexeme(lexeme.into()),
        }
    }

    pub(crate) fn reduced(state: StateId, symbol: SymbolId, value: T) -> Self {
        Self {
            state,
            symbol: Some(symbol),
            value: NodeValue::Value(value),
        }
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    /// `None` only for the sentinel.
    pub fn symbol(&self) -> Option<SymbolId> {
        self.symbol
    }

    pub fn value(&self) -> &NodeValue<T> {
        &self.value
    }

    /// The lexeme of a shifted terminal, or `""` for any other node.
    pub fn lexeme(&self) -> &str {
        match &self.value {
            NodeValue::Lexeme(lexeme) => lexeme.as_str(),
            _ => "",
        }
    }

    /// The synthesized value of a reduced non-terminal.
    pub fn synthesized(&self) -> Option<&T> {
        match &self.value {
            NodeValue::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_synthesized(self) -> Option<T> {
        match self.value {
            NodeValue::Value(value) => Some(value),
            _ => None,
        }
    }
}

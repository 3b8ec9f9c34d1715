use smartstring::alias::String;
use std::fmt;

/// Identity of a grammar symbol within one [`ParserStateMachine`].
///
/// Symbols are compared by identity only; the display name carried by
/// [`ParserSymbol`] never takes part in matching.
///
/// [`ParserStateMachine`]: crate::ParserStateMachine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub(crate) usize);

impl SymbolId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<SymbolId> for usize {
    fn from(symbol: SymbolId) -> Self {
        symbol.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolType {
    Terminal,
    NonTerminal,
    End,
}

/// A terminal or non-terminal symbol of the grammar an automaton was built
/// from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserSymbol {
    id: SymbolId,
    name: String,
    kind: SymbolType,
}

impl ParserSymbol {
    pub(crate) fn new(id: SymbolId, name: &str, kind: SymbolType) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolType {
        self.kind
    }
}

impl fmt::Display for ParserSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

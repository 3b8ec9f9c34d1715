use crate::automaton::ParserStateMachine;
use crate::cursor::{LexerCursor, Position};
use crate::error::LalrError;
use crate::symbol::SymbolId;
use regex_automata::{
    Anchored, Input, MatchKind,
    dfa::{Automaton, StartKind, dense},
    nfa::thompson::{self, NFA},
    util::{primitives::StateID, syntax},
};
use smartstring::alias::String;
use std::borrow::Cow;
use std::rc::Rc;

/// The kind of a token pattern.
///
/// Declared in order of increasing priority: when a literal and a regular
/// expression match the same longest lexeme, the literal wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenType {
    Null,
    RegularExpression,
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LexerActionId(pub(crate) usize);

impl LexerActionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One token rule of a lexical sub-automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerToken {
    pub kind: TokenType,
    pub pattern: String,
    /// The parser symbol produced on a match; `None` drops the lexeme.
    pub symbol: Option<SymbolId>,
    /// Identifier of the lexical action run after a match.
    pub action: Option<String>,
}

impl LexerToken {
    pub fn literal(literal: &str, symbol: SymbolId) -> Self {
        Self {
            kind: TokenType::Literal,
            pattern: literal.into(),
            symbol: Some(symbol),
            action: None,
        }
    }

    pub fn regex(pattern: &str, symbol: SymbolId) -> Self {
        Self {
            kind: TokenType::RegularExpression,
            pattern: pattern.into(),
            symbol: Some(symbol),
            action: None,
        }
    }

    /// A pattern whose matches are consumed without producing a token.
    pub fn skip(pattern: &str) -> Self {
        Self {
            kind: TokenType::RegularExpression,
            pattern: pattern.into(),
            symbol: None,
            action: None,
        }
    }

    pub fn with_action(mut self, identifier: &str) -> Self {
        self.action = Some(identifier.into());
        self
    }
}

/// The longest match found at the start of a haystack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerMatch {
    /// Index of the winning token rule.
    pub token: usize,
    /// Length of the match in bytes.
    pub len: usize,
}

/// A set of token rules compiled into one anchored multi-pattern DFA.
#[derive(Debug, Clone)]
pub struct LexerStateMachine {
    tokens: Vec<LexerToken>,
    actions: Vec<String>,
    token_actions: Vec<Option<LexerActionId>>,
    dfa: dense::DFA<Vec<u32>>,
}

impl LexerStateMachine {
    pub fn new(tokens: Vec<LexerToken>) -> Result<Self, LalrError> {
        let conf = syntax::Config::new().utf8(false);
        let mut hirs = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let pattern = match token.kind {
                TokenType::Literal => escape(&token.pattern),
                TokenType::RegularExpression | TokenType::Null => token.pattern.clone(),
            };
            match syntax::parse_with(&pattern, &conf) {
                Ok(hir) => hirs.push(hir),
                Err(err) => {
                    return Err(LalrError::Pattern {
                        pattern,
                        message: err.to_string().into(),
                    });
                }
            }
        }

        let nfa = NFA::compiler()
            .configure(thompson::Config::new().utf8(false))
            .build_many_from_hir(&hirs)?;
        let dfa = dense::Builder::new()
            .configure(
                dense::DFA::config()
                    .match_kind(MatchKind::All)
                    .start_kind(StartKind::Anchored),
            )
            .build_from_nfa(&nfa)?;

        let mut actions: Vec<String> = Vec::new();
        let mut token_actions = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let action = token.action.as_ref().map(|identifier| {
                match actions.iter().position(|a| a == identifier) {
                    Some(i) => LexerActionId(i),
                    None => {
                        actions.push(identifier.clone());
                        LexerActionId(actions.len() - 1)
                    }
                }
            });
            token_actions.push(action);
        }

        Ok(Self {
            tokens,
            actions,
            token_actions,
            dfa,
        })
    }

    pub fn tokens(&self) -> &[LexerToken] {
        &self.tokens
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn find_action(&self, identifier: &str) -> Option<LexerActionId> {
        self.actions
            .iter()
            .position(|a| a.as_str() == identifier)
            .map(LexerActionId)
    }

    pub fn token_action(&self, token: usize) -> Option<LexerActionId> {
        self.token_actions.get(token).copied().flatten()
    }

    /// Runs the DFA anchored at the start of `haystack` and returns the
    /// longest match. Ties on length go to the higher [`TokenType`], then to
    /// the earlier rule.
    pub fn longest_match(&self, haystack: &[u8]) -> Result<Option<LexerMatch>, LalrError> {
        let dfa = &self.dfa;
        let mut state = dfa.start_state_forward(&Input::new(haystack).anchored(Anchored::Yes))?;
        let mut last_match = None;

        // Match states are reported one byte late, so entering a match state
        // after byte `i` means a match of length `i`.
        for (i, &b) in haystack.iter().enumerate() {
            state = dfa.next_state(state, b);
            if dfa.is_special_state(state) {
                if dfa.is_match_state(state) {
                    last_match = Some(self.best_match(state, i));
                } else if dfa.is_dead_state(state) || dfa.is_quit_state(state) {
                    return Ok(last_match);
                }
            }
        }
        state = dfa.next_eoi_state(state);
        if dfa.is_match_state(state) {
            last_match = Some(self.best_match(state, haystack.len()));
        }
        Ok(last_match)
    }

    fn best_match(&self, state: StateID, len: usize) -> LexerMatch {
        let token = (0..self.dfa.match_len(state))
            .map(|i| self.dfa.match_pattern(state, i).as_usize())
            .max_by(|&a, &b| {
                self.tokens[a]
                    .kind
                    .cmp(&self.tokens[b].kind)
                    .then(b.cmp(&a))
            })
            .unwrap_or(0);
        LexerMatch { token, len }
    }
}

fn escape(literal: &str) -> String {
    let mut out = String::new();
    for c in literal.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
                | '#' | '&' | '-' | '~'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Renders bytes for diagnostics, hex-encoded when they are not UTF-8.
fn printable(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.into(),
        Err(_) => hex::encode(bytes).into(),
    }
}

/// The tokenizer interface the parser drives.
///
/// `advance` moves to the next token; `symbol`, `lexeme` and `position`
/// describe the current one. At the end of input the symbol is the
/// automaton's end symbol, and stays so on further calls.
pub trait Lexer<'i> {
    fn reset(&mut self, input: &'i [u8]);

    fn advance(&mut self);

    fn symbol(&self) -> SymbolId;

    fn lexeme(&self) -> &str;

    fn position(&self) -> Position;

    /// `true` once the whole input has been consumed.
    fn full(&self) -> bool;
}

/// A lexical action: receives the input following the matched lexeme and the
/// lexeme so far, may extend the lexeme, and returns how many more bytes it
/// consumed.
pub type LexerActionFn = dyn Fn(&[u8], &mut String) -> usize;

#[derive(Debug, Clone, Default)]
pub struct LexerStats {
    pub matches: usize,
    pub skipped: usize,
}

/// The built-in [`Lexer`] that scans with an automaton's token and
/// whitespace sub-automata.
pub struct DfaLexer<'a, 'i> {
    tokens: &'a LexerStateMachine,
    whitespace: Option<&'a LexerStateMachine>,
    end_symbol: SymbolId,
    handlers: Vec<Option<Rc<LexerActionFn>>>,
    input: &'i [u8],
    cursor: LexerCursor,
    token_position: Position,
    symbol: SymbolId,
    lexeme: String,
    stalled: bool,
    stats: LexerStats,
}

impl<'a, 'i> DfaLexer<'a, 'i> {
    pub fn new(automaton: &'a ParserStateMachine) -> Result<Self, LalrError> {
        let tokens = automaton
            .lexer_state_machine()
            .ok_or(LalrError::MissingLexer)?;
        Ok(Self {
            tokens,
            whitespace: automaton.whitespace_state_machine(),
            end_symbol: automaton.end_symbol(),
            handlers: vec![None; tokens.actions().len()],
            input: &[],
            cursor: LexerCursor::new(),
            token_position: Position::default(),
            symbol: automaton.end_symbol(),
            lexeme: String::new(),
            stalled: false,
            stats: LexerStats::default(),
        })
    }

    pub fn set_action_handler<F>(&mut self, identifier: &str, handler: F) -> Result<(), LalrError>
    where
        F: Fn(&[u8], &mut String) -> usize + 'static,
    {
        self.install_handler(identifier, Some(Rc::new(handler)))
    }

    pub(crate) fn install_handler(
        &mut self,
        identifier: &str,
        handler: Option<Rc<LexerActionFn>>,
    ) -> Result<(), LalrError> {
        let action = self
            .tokens
            .find_action(identifier)
            .ok_or_else(|| LalrError::UnknownLexerAction(identifier.into()))?;
        self.handlers[action.index()] = handler;
        Ok(())
    }

    pub(crate) fn set_handlers(&mut self, handlers: &[Option<Rc<LexerActionFn>>]) {
        self.handlers.clone_from_slice(handlers);
    }

    pub fn stats(&self) -> LexerStats {
        self.stats.clone()
    }

    fn skip_whitespace(&mut self) {
        let Some(whitespace) = self.whitespace else {
            return;
        };
        let input = self.input;
        loop {
            let rest = &input[self.cursor.pos..];
            if rest.is_empty() {
                return;
            }
            match whitespace.longest_match(rest) {
                Ok(Some(m)) if m.len > 0 => {
                    self.stats.skipped += m.len;
                    self.cursor.advance_all(&rest[..m.len]);
                }
                Ok(_) => return,
                Err(err) => {
                    log::warn!("whitespace scan failed at {}: {}", self.cursor.position, err);
                    return;
                }
            }
        }
    }

    fn stall(&mut self) {
        self.stalled = true;
        self.lexeme.clear();
        self.symbol = self.end_symbol;
    }
}

impl<'a, 'i> Lexer<'i> for DfaLexer<'a, 'i> {
    fn reset(&mut self, input: &'i [u8]) {
        self.input = input;
        self.cursor = LexerCursor::new();
        self.token_position = Position::default();
        self.symbol = self.end_symbol;
        self.lexeme.clear();
        self.stalled = false;
        self.stats = LexerStats::default();
    }

    fn advance(&mut self) {
        let input = self.input;
        let tokens = self.tokens;
        loop {
            self.lexeme.clear();
            if self.stalled {
                self.symbol = self.end_symbol;
                return;
            }
            self.skip_whitespace();
            self.token_position = self.cursor.position;
            let rest = &input[self.cursor.pos..];
            if rest.is_empty() {
                self.symbol = self.end_symbol;
                return;
            }

            let m = match tokens.longest_match(rest) {
                Ok(Some(m)) if m.len > 0 => m,
                Ok(_) => {
                    log::debug!(
                        "no token matches at {}: {:?}",
                        self.cursor.position,
                        printable(&rest[..rest.len().min(16)])
                    );
                    self.stall();
                    return;
                }
                Err(err) => {
                    log::warn!("token scan failed at {}: {}", self.cursor.position, err);
                    self.stall();
                    return;
                }
            };
            self.stats.matches += 1;

            let mut len = m.len;
            self.lexeme
                .push_str(&std::string::String::from_utf8_lossy(&rest[..len]));
            if let Some(action) = tokens.token_action(m.token) {
                if let Some(handler) = &self.handlers[action.index()] {
                    len += handler(&rest[len..], &mut self.lexeme).min(rest.len() - len);
                }
            }
            log::trace!(
                "MATCHED: token {}, at {}, bytes {:?}",
                m.token,
                self.cursor.position,
                printable(&rest[..len]),
            );
            self.cursor.advance_all(&rest[..len]);

            if let Some(symbol) = tokens.tokens()[m.token].symbol {
                self.symbol = symbol;
                return;
            }
        }
    }

    fn symbol(&self) -> SymbolId {
        self.symbol
    }

    fn lexeme(&self) -> &str {
        &self.lexeme
    }

    fn position(&self) -> Position {
        self.token_position
    }

    fn full(&self) -> bool {
        self.cursor.pos >= self.input.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct Fixture {
        automaton: ParserStateMachine,
        ident: SymbolId,
        kw_if: SymbolId,
        number: SymbolId,
        plus: SymbolId,
    }

    fn fixture(extra: Vec<LexerToken>) -> Fixture {
        let mut b = ParserStateMachine::builder();
        let start = b.non_terminal(".start");
        let ident = b.terminal("ident");
        let kw_if = b.terminal("if");
        let number = b.terminal("number");
        let plus = b.terminal("+");
        b.state();
        b.start_symbol(start);

        let mut tokens = vec![
            LexerToken::regex("[a-z]+", ident),
            LexerToken::literal("if", kw_if),
            LexerToken::regex("[0-9]+", number),
            LexerToken::literal("+", plus),
        ];
        tokens.extend(extra);
        b.lexer(LexerStateMachine::new(tokens).unwrap());
        b.whitespace(LexerStateMachine::new(vec![LexerToken::skip("[ \t\r\n]+")]).unwrap());
        Fixture {
            automaton: b.build().unwrap(),
            ident,
            kw_if,
            number,
            plus,
        }
    }

    fn collect(lexer: &mut DfaLexer<'_, '_>) -> Vec<(SymbolId, std::string::String, Position)> {
        let mut out = Vec::new();
        lexer.advance();
        while lexer.symbol() != lexer.end_symbol {
            out.push((lexer.symbol(), lexer.lexeme().to_string(), lexer.position()));
            lexer.advance();
        }
        out
    }

    #[test]
    fn literal_beats_regex_on_equal_length() {
        init_logger();
        let f = fixture(vec![]);
        let mut lexer = DfaLexer::new(&f.automaton).unwrap();
        lexer.reset(b"if iffy");
        let toks = collect(&mut lexer);
        let symbols: Vec<_> = toks.iter().map(|t| t.0).collect();
        assert_eq!(symbols, vec![f.kw_if, f.ident]);
        assert_eq!(toks[1].1, "iffy");
        assert!(lexer.full());
    }

    #[test]
    fn longest_match_wins_across_kinds() {
        let f = fixture(vec![]);
        let lexer = f.automaton.lexer_state_machine().unwrap();
        let m = lexer.longest_match(b"iffy+").unwrap().unwrap();
        assert_eq!(m, LexerMatch { token: 0, len: 4 });
        let m = lexer.longest_match(b"if+").unwrap().unwrap();
        assert_eq!(m, LexerMatch { token: 1, len: 2 });
        assert_eq!(lexer.longest_match(b"$").unwrap(), None);
    }

    #[test]
    fn earlier_rule_wins_among_equal_kinds() {
        let f = fixture(vec![LexerToken::regex("[0-9a-f]+", SymbolId(0))]);
        let lexer = f.automaton.lexer_state_machine().unwrap();
        let m = lexer.longest_match(b"123 ").unwrap().unwrap();
        assert_eq!(m, LexerMatch { token: 2, len: 3 });
        let m = lexer.longest_match(b"12ab").unwrap().unwrap();
        assert_eq!(m, LexerMatch { token: 4, len: 4 });
    }

    #[test]
    fn tracks_token_positions_across_whitespace() {
        let f = fixture(vec![]);
        let mut lexer = DfaLexer::new(&f.automaton).unwrap();
        lexer.reset(b"a\n  12 + b");
        let toks = collect(&mut lexer);
        assert_eq!(
            toks,
            vec![
                (f.ident, "a".to_string(), Position::new(0, 0)),
                (f.number, "12".to_string(), Position::new(1, 2)),
                (f.plus, "+".to_string(), Position::new(1, 5)),
                (f.ident, "b".to_string(), Position::new(1, 7)),
            ]
        );
        assert!(lexer.full());
        assert_eq!(lexer.stats().matches, 4);
    }

    #[test]
    fn stops_at_unmatched_input() {
        init_logger();
        let f = fixture(vec![]);
        let mut lexer = DfaLexer::new(&f.automaton).unwrap();
        lexer.reset(b"a $ b");
        lexer.advance();
        assert_eq!(lexer.symbol(), f.ident);
        lexer.advance();
        assert_eq!(lexer.symbol(), f.automaton.end_symbol());
        assert_eq!(lexer.lexeme(), "");
        assert_eq!(lexer.position(), Position::new(0, 2));
        assert!(!lexer.full());
        lexer.advance();
        assert_eq!(lexer.symbol(), f.automaton.end_symbol());
    }

    #[test]
    fn end_symbol_repeats_at_end_of_input() {
        let f = fixture(vec![]);
        let mut lexer = DfaLexer::new(&f.automaton).unwrap();
        lexer.reset(b"   ");
        lexer.advance();
        assert_eq!(lexer.symbol(), f.automaton.end_symbol());
        lexer.advance();
        assert_eq!(lexer.symbol(), f.automaton.end_symbol());
        assert!(lexer.full());
    }

    #[test]
    fn lexical_action_extends_the_match() {
        let f = fixture(vec![LexerToken::skip(r"/\*").with_action("block_comment")]);
        let mut lexer = DfaLexer::new(&f.automaton).unwrap();
        lexer
            .set_action_handler("block_comment", |rest, lexeme| {
                let end = rest
                    .windows(2)
                    .position(|w| w == b"*/")
                    .map(|i| i + 2)
                    .unwrap_or(rest.len());
                lexeme.push_str(&std::string::String::from_utf8_lossy(&rest[..end]));
                end
            })
            .unwrap();
        lexer.reset(b"a /* b + c */ d");
        let toks = collect(&mut lexer);
        let lexemes: Vec<_> = toks.iter().map(|t| t.1.as_str()).collect();
        assert_eq!(lexemes, vec!["a", "d"]);
        assert_eq!(toks[1].2, Position::new(0, 14));
        assert!(lexer.full());
    }

    #[test]
    fn unknown_lexer_action_is_an_error() {
        let f = fixture(vec![]);
        let mut lexer = DfaLexer::new(&f.automaton).unwrap();
        let err = lexer.set_action_handler("nope", |_, _| 0).unwrap_err();
        assert!(matches!(err, LalrError::UnknownLexerAction(_)));
    }

    #[test]
    fn automaton_without_lexer_is_an_error() {
        let mut b = ParserStateMachine::builder();
        let start = b.non_terminal(".start");
        b.state();
        b.start_symbol(start);
        let automaton = b.build().unwrap();
        assert!(matches!(
            DfaLexer::new(&automaton),
            Err(LalrError::MissingLexer)
        ));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = LexerStateMachine::new(vec![LexerToken::regex("(", SymbolId(0))]).unwrap_err();
        assert!(matches!(err, LalrError::Pattern { .. }));
    }

    #[test]
    fn literals_are_escaped() {
        assert_eq!(escape("a+b").as_str(), "a\\+b");
        let lexer =
            LexerStateMachine::new(vec![LexerToken::literal("(*)", SymbolId(0))]).unwrap();
        assert_eq!(
            lexer.longest_match(b"(*)x").unwrap(),
            Some(LexerMatch { token: 0, len: 3 })
        );
        assert_eq!(lexer.longest_match(b"()").unwrap(), None);
    }

    #[test]
    fn diagnostics_show_invalid_utf8_as_hex() {
        assert_eq!(printable(b"if x"), "if x");
        assert_eq!(printable(&[0x61, 0xff, 0xfe]), "61fffe");
    }
}

use crate::automaton::{ActionId, ParserStateMachine};
use crate::error::LalrError;
use crate::node::ParserNode;

/// A semantic action: folds the right-hand side of a production, in
/// bottom-to-top stack order, into the value of its left-hand symbol.
pub type ActionFn<'a, T> = dyn FnMut(&[ParserNode<T>]) -> T + 'a;

/// Per-parser table binding action indices to callbacks.
///
/// Identifiers are resolved against the automaton's action table once, at
/// registration; dispatch is a direct index.
pub struct ActionHandlers<'a, T> {
    handlers: Vec<Option<Box<ActionFn<'a, T>>>>,
    default: Option<Box<ActionFn<'a, T>>>,
}

impl<'a, T: Default> ActionHandlers<'a, T> {
    pub fn new(automaton: &ParserStateMachine) -> Self {
        Self {
            handlers: (0..automaton.actions().len()).map(|_| None).collect(),
            default: None,
        }
    }

    pub fn set(
        &mut self,
        automaton: &ParserStateMachine,
        identifier: &str,
        handler: Option<Box<ActionFn<'a, T>>>,
    ) -> Result<ActionId, LalrError> {
        let action = automaton
            .find_action(identifier)
            .ok_or_else(|| LalrError::UnknownAction(identifier.into()))?;
        self.handlers[action.index()] = handler;
        Ok(action)
    }

    pub fn set_default(&mut self, handler: Option<Box<ActionFn<'a, T>>>) {
        self.default = handler;
    }

    #[cfg(test)]
    fn is_set(&self, action: ActionId) -> bool {
        matches!(self.handlers.get(action.index()), Some(Some(_)))
    }

    /// Calls the handler bound to `action`, else the default handler, else
    /// returns `T::default()`.
    pub fn dispatch(&mut self, action: Option<ActionId>, span: &[ParserNode<T>]) -> T {
        if let Some(handler) = action
            .and_then(|a| self.handlers.get_mut(a.index()))
            .and_then(|h| h.as_mut())
        {
            return handler(span);
        }
        match self.default.as_mut() {
            Some(handler) => handler(span),
            None => T::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::StateId;
    use crate::symbol::SymbolId;

    fn automaton() -> ParserStateMachine {
        let mut b = ParserStateMachine::builder();
        let start = b.non_terminal(".start");
        b.state();
        b.start_symbol(start);
        b.action("first");
        b.action("second");
        b.build().unwrap()
    }

    fn span() -> Vec<ParserNode<String>> {
        vec![
            ParserNode::shifted(StateId(1), SymbolId(3), "x"),
            ParserNode::reduced(StateId(2), SymbolId(4), "y".to_string()),
        ]
    }

    #[test]
    fn registered_handler_wins_over_default() {
        let automaton = automaton();
        let mut handlers: ActionHandlers<String> = ActionHandlers::new(&automaton);
        let first = handlers
            .set(
                &automaton,
                "first",
                Some(Box::new(|nodes: &[ParserNode<String>]| {
                    format!("first:{}", nodes.len())
                })),
            )
            .unwrap();
        handlers.set_default(Some(Box::new(|_: &[ParserNode<String>]| {
            "default".to_string()
        })));

        let second = automaton.find_action("second");
        assert!(handlers.is_set(first));
        assert_eq!(handlers.dispatch(Some(first), &span()), "first:2");
        assert_eq!(handlers.dispatch(second, &span()), "default");
        assert_eq!(handlers.dispatch(None, &span()), "default");
    }

    #[test]
    fn falls_back_to_default_value() {
        let automaton = automaton();
        let mut handlers: ActionHandlers<String> = ActionHandlers::new(&automaton);
        assert_eq!(handlers.dispatch(automaton.find_action("first"), &span()), "");
        assert_eq!(handlers.dispatch(None, &[]), "");
    }

    #[test]
    fn reregistration_overwrites_and_none_clears() {
        let automaton = automaton();
        let mut handlers: ActionHandlers<String> = ActionHandlers::new(&automaton);
        let first = handlers
            .set(
                &automaton,
                "first",
                Some(Box::new(|_: &[ParserNode<String>]| "one".to_string())),
            )
            .unwrap();
        handlers
            .set(
                &automaton,
                "first",
                Some(Box::new(|_: &[ParserNode<String>]| "two".to_string())),
            )
            .unwrap();
        assert_eq!(handlers.dispatch(Some(first), &[]), "two");

        handlers.set(&automaton, "first", None).unwrap();
        assert!(!handlers.is_set(first));
        assert_eq!(handlers.dispatch(Some(first), &[]), "");
    }

    #[test]
    fn unknown_identifier_is_an_error() {
        let automaton = automaton();
        let mut handlers: ActionHandlers<String> = ActionHandlers::new(&automaton);
        let err = handlers
            .set(
                &automaton,
                "missing",
                Some(Box::new(|_: &[ParserNode<String>]| String::new())),
            )
            .unwrap_err();
        assert!(matches!(err, LalrError::UnknownAction(_)));
    }
}

use crate::id_gen::RuleId;
use slotmap::DefaultKey;

/// Symbol types in the grammar.
#[derive(Debug, Clone)]
pub(crate) enum Symbol<T> {
    /// A terminal symbol containing an actual value from the input.
    Terminal(T),

    /// A reference to a rule (non-terminal).
    NonTerminal(RuleId),

    /// Sentinel closing a rule's circular body list.
    ///
    /// The guard's successor is the first symbol of the body and its
    /// predecessor the last; an empty body links the guard to itself.
    Guard(RuleId),
}

impl<T> Symbol<T> {
    /// The rule referenced by a non-terminal.
    #[inline]
    pub(crate) fn rule(&self) -> Option<RuleId> {
        match self {
            Symbol::NonTerminal(rule) => Some(*rule),
            _ => None,
        }
    }
}

/// A node in the doubly-linked body of a rule.
///
/// Links are `None` only while a node is detached, between its allocation
/// and its splice into a body.
#[derive(Debug)]
pub(crate) struct SymbolNode<T> {
    pub symbol: Symbol<T>,
    pub prev: Option<DefaultKey>,
    pub next: Option<DefaultKey>,
}

impl<T> SymbolNode<T> {
    pub(crate) fn new(symbol: Symbol<T>) -> Self {
        Self {
            symbol,
            prev: None,
            next: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_gen::IdGenerator;

    #[test]
    fn test_symbol_node_creation() {
        let node = SymbolNode::new(Symbol::Terminal('x'));
        assert!(matches!(node.symbol, Symbol::Terminal('x')));
        assert_eq!(node.prev, None);
        assert_eq!(node.next, None);
    }

    #[test]
    fn test_rule_accessor() {
        let id = IdGenerator::new().get();
        assert_eq!(Symbol::<char>::NonTerminal(id).rule(), Some(id));
        assert_eq!(Symbol::<char>::Guard(id).rule(), None);
        assert_eq!(Symbol::Terminal('a').rule(), None);
    }
}

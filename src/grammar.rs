//! Owned, read-only snapshot of an engine's grammar.
//!
//! A [`Grammar`] is detached from the engine that produced it: it stays valid
//! while more values are pushed, and two snapshots taken without an
//! intervening push compare equal.

use crate::error::GrammarError;
use crate::id_gen::RuleId;
use crate::sequitur::Sequitur;
use crate::symbol::Symbol;
use ahash::AHashMap as HashMap;
use std::hash::Hash;
use tracing::debug;

/// One symbol of a rule body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element<T> {
    /// An input value.
    Terminal(T),
    /// A reference to another rule of the same grammar.
    Rule(RuleId),
}

/// A rule and its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule<T> {
    id: RuleId,
    start: bool,
    uses: usize,
    body: Vec<Element<T>>,
}

impl<T> Rule<T> {
    /// The engine's identity for this rule.
    pub fn id(&self) -> RuleId {
        self.id
    }

    /// True for the rule whose expansion is the whole input.
    pub fn is_start(&self) -> bool {
        self.start
    }

    /// Number of references to this rule elsewhere in the grammar.
    ///
    /// Zero for the start rule, at least two for every other rule.
    pub fn uses(&self) -> usize {
        self.uses
    }

    pub fn body(&self) -> &[Element<T>] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// The live rules of a grammar in canonical order.
///
/// The start rule comes first; every other rule follows in the order it is
/// first referenced by a breadth-first, left-to-right walk from the start
/// rule. A rule's position in this order is its canonical index.
#[derive(Debug, Clone)]
pub struct Grammar<T> {
    rules: Vec<Rule<T>>,
    positions: HashMap<RuleId, usize>,
}

impl<T> Grammar<T> {
    pub fn start(&self) -> &Rule<T> {
        &self.rules[0]
    }

    /// All rules, start rule first.
    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule<T>> {
        self.positions.get(&id).map(|&position| &self.rules[position])
    }

    /// Canonical index of a rule: 0 for the start rule, then discovery order.
    pub fn index_of(&self, id: RuleId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Number of rules, the start rule included.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Always false: a grammar has at least its start rule.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Total number of symbols across all rule bodies.
    pub fn symbol_count(&self) -> usize {
        self.rules.iter().map(Rule::len).sum()
    }

    fn lookup(&self, id: RuleId) -> Result<&Rule<T>, GrammarError> {
        self.rule(id).ok_or(GrammarError::UnknownRule { rule: id })
    }
}

impl<T: Clone> Grammar<T> {
    /// Fully expands a rule into the values it derives.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UnknownRule`] if `id` is not a rule of this grammar.
    pub fn expand(&self, id: RuleId) -> Result<Vec<T>, GrammarError> {
        let mut values = Vec::new();
        let mut stack = vec![self.lookup(id)?.body.iter()];

        while let Some(top) = stack.last_mut() {
            match top.next() {
                None => {
                    stack.pop();
                }
                Some(Element::Terminal(value)) => values.push(value.clone()),
                Some(Element::Rule(inner)) => {
                    let body = self.lookup(*inner)?.body.iter();
                    stack.push(body);
                }
            }
        }

        Ok(values)
    }

    /// Expands the start rule, reproducing the whole input.
    pub fn expand_start(&self) -> Vec<T> {
        self.expand(self.start().id).unwrap_or_default()
    }
}

impl<T: PartialEq> PartialEq for Grammar<T> {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules
    }
}

impl<T: Eq> Eq for Grammar<T> {}

impl<T: Hash + Eq + Clone> Sequitur<T> {
    /// Takes a snapshot of the current grammar.
    ///
    /// Only rules reachable from the start rule are included.
    pub fn grammar(&self) -> Grammar<T> {
        let mut order = vec![self.start];
        let mut positions = HashMap::default();
        positions.insert(self.start, 0);

        let mut rules = Vec::with_capacity(self.rules.len());
        let mut next = 0;

        while next < order.len() {
            let id = order[next];
            next += 1;

            let mut body = Vec::new();
            for key in self.body(id) {
                let element = match &self.symbols[key].symbol {
                    Symbol::Terminal(value) => Element::Terminal(value.clone()),
                    Symbol::NonTerminal(rule) => {
                        if !positions.contains_key(rule) {
                            positions.insert(*rule, order.len());
                            order.push(*rule);
                        }
                        Element::Rule(*rule)
                    }
                    Symbol::Guard(_) => unreachable!("guards never appear inside a body"),
                };
                body.push(element);
            }

            rules.push(Rule {
                id,
                start: id == self.start,
                uses: self.rules[&id].uses as usize,
                body,
            });
        }

        let grammar = Grammar { rules, positions };
        debug!(
            rules = grammar.len(),
            symbols = grammar.symbol_count(),
            digrams = self.digrams.len(),
            "grammar snapshot"
        );
        grammar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminals(text: &str) -> Vec<Element<char>> {
        text.chars().map(Element::Terminal).collect()
    }

    #[test]
    fn test_empty_input_has_empty_start_rule() {
        let grammar = Sequitur::<char>::new().grammar();
        assert_eq!(grammar.len(), 1);
        assert!(grammar.start().is_start());
        assert!(grammar.start().is_empty());
        assert_eq!(grammar.expand_start(), Vec::<char>::new());
    }

    #[test]
    fn test_single_symbol() {
        let grammar = "a".chars().collect::<Sequitur<_>>().grammar();
        assert_eq!(grammar.len(), 1);
        assert_eq!(grammar.start().body(), terminals("a").as_slice());
    }

    #[test]
    fn test_no_repeated_digram_keeps_flat_start_rule() {
        let grammar = "abcdef".chars().collect::<Sequitur<_>>().grammar();
        assert_eq!(grammar.len(), 1);
        assert_eq!(grammar.start().body(), terminals("abcdef").as_slice());
    }

    #[test]
    fn test_abcabc() {
        let grammar = "abcabc".chars().collect::<Sequitur<_>>().grammar();
        assert_eq!(grammar.len(), 2);

        let rule = &grammar.rules()[1];
        assert!(!rule.is_start());
        assert_eq!(rule.body(), terminals("abc").as_slice());
        assert_eq!(rule.uses(), 2);
        assert_eq!(
            grammar.start().body(),
            &[Element::Rule(rule.id()), Element::Rule(rule.id())]
        );
    }

    #[test]
    fn test_aaaa() {
        let grammar = "aaaa".chars().collect::<Sequitur<_>>().grammar();
        assert_eq!(grammar.len(), 2);

        let pair = &grammar.rules()[1];
        assert_eq!(pair.body(), terminals("aa").as_slice());
        assert_eq!(
            grammar.start().body(),
            &[Element::Rule(pair.id()), Element::Rule(pair.id())]
        );
    }

    #[test]
    fn test_abcabcabc() {
        let grammar = "abcabcabc".chars().collect::<Sequitur<_>>().grammar();
        assert_eq!(grammar.len(), 2);

        let rule = &grammar.rules()[1];
        assert_eq!(rule.body(), terminals("abc").as_slice());
        assert_eq!(rule.uses(), 3);
        assert_eq!(grammar.start().body(), vec![Element::Rule(rule.id()); 3].as_slice());
    }

    #[test]
    fn test_canonical_order_follows_first_reference() {
        let grammar = "abcdbcabcd".chars().collect::<Sequitur<_>>().grammar();
        for (position, rule) in grammar.rules().iter().enumerate() {
            assert_eq!(grammar.index_of(rule.id()), Some(position));
        }
        assert_eq!(grammar.index_of(grammar.start().id()), Some(0));
    }

    #[test]
    fn test_expand_every_rule() {
        let grammar = "xyzxyzqxyzxyzq".chars().collect::<Sequitur<_>>().grammar();
        let text: String = grammar.expand_start().into_iter().collect();
        assert_eq!(text, "xyzxyzqxyzxyzq");

        for rule in grammar.rules() {
            let expansion = grammar.expand(rule.id()).unwrap();
            assert!(expansion.len() >= rule.len());
        }
    }

    #[test]
    fn test_expand_unknown_rule() {
        let grammar = "ab".chars().collect::<Sequitur<_>>().grammar();
        let missing = "abab".chars().collect::<Sequitur<_>>().grammar().rules()[1].id();
        assert_eq!(
            grammar.expand(missing),
            Err(GrammarError::UnknownRule { rule: missing })
        );
        assert!(grammar.rule(missing).is_none());
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let seq: Sequitur<char> = "the cat sat on the mat".chars().collect();
        assert_eq!(seq.grammar(), seq.grammar());
    }

    #[test]
    fn test_snapshot_outlives_further_pushes() {
        let mut seq: Sequitur<char> = "abab".chars().collect();
        let before = seq.grammar();
        seq.extend("cabab".chars());
        assert_eq!(before.expand_start(), vec!['a', 'b', 'a', 'b']);
        assert_ne!(before, seq.grammar());
    }
}

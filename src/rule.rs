use crate::id_gen::RuleId;
use crate::sequitur::Sequitur;
use crate::symbol::{Symbol, SymbolNode};
use slotmap::DefaultKey;
use std::hash::Hash;
use tracing::trace;

/// Bookkeeping for a live rule.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RuleRecord {
    /// Sentinel closing the rule's circular body
    pub guard: DefaultKey,
    /// Number of non-terminals referencing the rule
    pub uses: u32,
}

impl RuleRecord {
    pub(crate) fn new(guard: DefaultKey) -> Self {
        Self { guard, uses: 0 }
    }
}

/// Walks a rule's body from first to last symbol.
pub(crate) struct BodyIter<'a, T> {
    sequitur: &'a Sequitur<T>,
    guard: DefaultKey,
    current: DefaultKey,
}

impl<T: Hash + Eq + Clone> Iterator for BodyIter<'_, T> {
    type Item = DefaultKey;

    fn next(&mut self) -> Option<DefaultKey> {
        if self.current == self.guard {
            return None;
        }
        let key = self.current;
        self.current = self.sequitur.next(key);
        Some(key)
    }
}

impl<T: Hash + Eq + Clone> Sequitur<T> {
    /// Iterates over the symbol keys of a rule's body.
    pub(crate) fn body(&self, rule: RuleId) -> BodyIter<'_, T> {
        let guard = self.rules[&rule].guard;
        BodyIter {
            sequitur: self,
            guard,
            current: self.next(guard),
        }
    }

    /// First symbol of a rule's body.
    pub(crate) fn first(&self, rule: RuleId) -> DefaultKey {
        self.next(self.rules[&rule].guard)
    }

    /// Creates a rule whose body is a copy of the digram at `first`.
    ///
    /// The new rule starts with no uses; its body digram is not yet indexed.
    pub(crate) fn new_rule(&mut self, first: DefaultKey) -> RuleId {
        let rule = self.id_gen.get();

        let guard = self.symbols.insert(SymbolNode::new(Symbol::Guard(rule)));
        self.symbols[guard].prev = Some(guard);
        self.symbols[guard].next = Some(guard);
        self.rules.insert(rule, RuleRecord::new(guard));

        for original in [first, self.next(first)] {
            let symbol = self.symbols[original].symbol.clone();
            if let Some(inner) = symbol.rule() {
                self.increment_uses(inner);
            }
            let copy = self.symbols.insert(SymbolNode::new(symbol));
            let last = self.prev(guard);
            self.insert_after(last, copy);
        }

        rule
    }

    /// Replaces the digram at `first` with a reference to `rule`.
    ///
    /// Returns the symbol before the replaced digram and the new non-terminal.
    pub(crate) fn substitute(
        &mut self,
        first: DefaultKey,
        rule: RuleId,
    ) -> (DefaultKey, DefaultKey) {
        let before = self.prev(first);
        let second = self.next(first);

        self.remove_symbol(first);
        self.remove_symbol(second);

        let reference = self
            .symbols
            .insert(SymbolNode::new(Symbol::NonTerminal(rule)));
        self.increment_uses(rule);
        self.insert_after(before, reference);

        (before, reference)
    }

    /// Replaces the sole reference to a rule with the rule's body and destroys the rule.
    pub(crate) fn inline(&mut self, reference: DefaultKey) {
        let Some(rule) = self.symbols[reference].symbol.rule() else {
            return;
        };
        let Some(record) = self.rules.remove(&rule) else {
            return;
        };
        debug_assert_eq!(record.uses, 1, "only a rule used once can be inlined");
        debug_assert_ne!(rule, self.start, "the start rule is never inlined");

        let first = self.next(record.guard);
        let last = self.prev(record.guard);
        let before = self.prev(reference);
        let after = self.next(reference);

        self.digrams.forget(&self.symbols, reference);
        self.join(before, first);
        self.join(last, after);

        self.symbols.remove(record.guard);
        self.symbols.remove(reference);
        self.id_gen.free(rule);
        trace!(rule = %rule, "inlined rule");

        self.schedule(&[before, last]);
    }

    /// Links `key` into a body directly after `left`.
    pub(crate) fn insert_after(&mut self, left: DefaultKey, key: DefaultKey) {
        let right = self.next(left);
        self.join(key, right);
        self.join(left, key);
    }

    /// Unlinks and frees a symbol, releasing its rule reference if it has one.
    fn remove_symbol(&mut self, key: DefaultKey) {
        self.digrams.forget(&self.symbols, key);

        let before = self.prev(key);
        let after = self.next(key);
        self.join(before, after);

        if let Some(node) = self.symbols.remove(key) {
            if let Some(rule) = node.symbol.rule() {
                self.decrement_uses(rule);
            }
        }
    }

    /// Makes `right` the successor of `left`, forgetting the digram this breaks.
    ///
    /// Breaking a link inside a run of three equal symbols leaves an overlapping
    /// digram behind that was never indexed; it is queued for a recheck.
    fn join(&mut self, left: DefaultKey, right: DefaultKey) {
        if let Some(old) = self.symbols[left].next {
            self.digrams.forget(&self.symbols, left);

            if let Some(before) = self.symbols[left].prev {
                if self.same_run(before, left, old) {
                    self.pending.push(before);
                }
            }
            if let Some(after) = self.symbols[old].next {
                if self.same_run(left, old, after) {
                    self.pending.push(old);
                }
            }
            if let (Some(before), Some(after)) = (self.symbols[right].prev, self.symbols[right].next) {
                if self.same_run(before, right, after) {
                    self.pending.push(right);
                }
            }
        }

        self.symbols[left].next = Some(right);
        self.symbols[right].prev = Some(left);
    }

    /// True if three symbols carry the same signature.
    fn same_run(&self, a: DefaultKey, b: DefaultKey, c: DefaultKey) -> bool {
        let Some(signature) = self.symbols[b].symbol.signature() else {
            return false;
        };
        [a, c]
            .iter()
            .all(|&key| self.symbols[key].symbol.signature().as_ref() == Some(&signature))
    }

    fn increment_uses(&mut self, rule: RuleId) {
        if let Some(record) = self.rules.get_mut(&rule) {
            record.uses += 1;
        }
    }

    fn decrement_uses(&mut self, rule: RuleId) {
        if let Some(record) = self.rules.get_mut(&rule) {
            debug_assert!(record.uses > 0, "Cannot decrement count below 0");
            record.uses = record.uses.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rule_copies_digram() {
        let mut seq = Sequitur::new();
        seq.extend("xy".chars());
        let first = seq.first(seq.start);

        let rule = seq.new_rule(first);
        let body: Vec<_> = seq
            .body(rule)
            .map(|key| match seq.symbols[key].symbol {
                Symbol::Terminal(c) => c,
                _ => panic!("expected terminal"),
            })
            .collect();
        assert_eq!(body, vec!['x', 'y']);
        assert_eq!(seq.rules[&rule].uses, 0);
        // The original digram is untouched.
        assert_eq!(seq.body(seq.start).count(), 2);
    }

    #[test]
    fn test_substitute_splices_reference() {
        let mut seq = Sequitur::new();
        seq.extend("xyz".chars());
        let first = seq.first(seq.start);
        let rule = seq.new_rule(first);

        let (before, reference) = seq.substitute(first, rule);
        assert_eq!(before, seq.rules[&seq.start].guard);
        assert_eq!(seq.body(seq.start).count(), 2);
        assert_eq!(seq.first(seq.start), reference);
        assert_eq!(seq.rules[&rule].uses, 1);
    }

    #[test]
    fn test_inline_restores_body() {
        let mut seq = Sequitur::new();
        seq.extend("xyz".chars());
        let first = seq.first(seq.start);
        let rule = seq.new_rule(first);
        let (_, reference) = seq.substitute(first, rule);

        seq.inline(reference);
        assert!(!seq.rules.contains_key(&rule));
        assert_eq!(seq.body(seq.start).count(), 3);
        assert_eq!(seq.iter().collect::<String>(), "xyz");
    }

    #[test]
    fn test_nonterminal_copies_count_as_uses() {
        let mut seq: Sequitur<char> = "abcabc".chars().collect();
        let inner = *seq.rules.keys().find(|&&id| id != seq.start).unwrap();
        let uses_before = seq.rules[&inner].uses;

        let first = seq.first(seq.start);
        let outer = seq.new_rule(first);
        assert_eq!(seq.rules[&inner].uses, uses_before + 2);
        assert_eq!(seq.body(outer).count(), 2);
    }
}

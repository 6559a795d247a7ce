use crate::digram::{DigramIndex, Lookup};
use crate::id_gen::{IdGenerator, RuleId};
use crate::rule::RuleRecord;
use crate::symbol::{Symbol, SymbolNode};
use ahash::AHashMap as HashMap;
use slotmap::{DefaultKey, SlotMap};
use std::hash::Hash;
use tracing::trace;

/// Incremental Sequitur grammar builder.
///
/// Maintains a context-free grammar that reproduces every value pushed so far
/// while enforcing two constraints between calls to [`Sequitur::push`]:
/// 1. Digram Uniqueness: No digram appears more than once
/// 2. Rule Utility: Every rule other than the start rule is used at least twice
pub struct Sequitur<T> {
    /// Storage for all symbols, including one guard per rule
    pub(crate) symbols: SlotMap<DefaultKey, SymbolNode<T>>,

    /// Maps digrams to their single occurrence
    pub(crate) digrams: DigramIndex<T>,

    /// Maps rule IDs to their guard and reference count
    pub(crate) rules: HashMap<RuleId, RuleRecord>,

    /// ID generator with reuse
    pub(crate) id_gen: IdGenerator,

    /// The rule whose expansion is the whole input
    pub(crate) start: RuleId,

    /// Locations whose digram must be rechecked before the grammar is quiescent
    pub(crate) pending: Vec<DefaultKey>,

    /// Number of values added
    length: usize,
}

impl<T: Hash + Eq + Clone> Sequitur<T> {
    /// Creates an engine with an empty start rule.
    pub fn new() -> Self {
        let mut id_gen = IdGenerator::new();
        let start = id_gen.get();

        let mut symbols = SlotMap::new();
        let guard = symbols.insert(SymbolNode::new(Symbol::Guard(start)));
        symbols[guard].prev = Some(guard);
        symbols[guard].next = Some(guard);

        let mut rules = HashMap::default();
        rules.insert(start, RuleRecord::new(guard));

        Self {
            symbols,
            digrams: DigramIndex::new(),
            rules,
            id_gen,
            start,
            pending: Vec::new(),
            length: 0,
        }
    }

    /// Appends a value to the end of the start rule and repairs the grammar.
    ///
    /// The whole repair cascade runs before this returns.
    pub fn push(&mut self, value: T) {
        let guard = self.rules[&self.start].guard;
        let last = self.prev(guard);

        let key = self
            .symbols
            .insert(SymbolNode::new(Symbol::Terminal(value)));
        self.insert_after(last, key);
        self.length += 1;

        self.schedule(&[last]);
        self.repair();
    }

    /// Returns the number of values added to the sequence.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if no values have been added.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the number of live rules, the start rule included.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns the id of the start rule.
    pub fn start_rule(&self) -> RuleId {
        self.start
    }

    /// Queues locations for rechecking; the first listed is checked first.
    pub(crate) fn schedule(&mut self, locations: &[DefaultKey]) {
        self.pending.extend(locations.iter().rev());
    }

    /// Drains the worklist until no digram repeats and no rule is underused.
    fn repair(&mut self) {
        while let Some(location) = self.pending.pop() {
            self.check(location);
        }
    }

    /// Checks the digram at `location` against the index.
    ///
    /// Records it if it is new, and rewrites the grammar if it repeats a
    /// distinct, non-overlapping occurrence.
    fn check(&mut self, location: DefaultKey) {
        match self.digrams.find(&self.symbols, location) {
            Lookup::Absent => self.digrams.observe(&self.symbols, location),
            Lookup::Found(other) => self.match_digram(location, other),
            Lookup::Unavailable | Lookup::Itself | Lookup::Overlapping => {}
        }
    }

    /// Resolves a repeated digram: `current` was just formed, `other` is recorded.
    fn match_digram(&mut self, current: DefaultKey, other: DefaultKey) {
        // Either occurrence may already be the whole body of a rule; the
        // other one then becomes a reference to that rule.
        let existing = match self.complete_rule(other) {
            Some(rule) => Some((rule, current)),
            None => self.complete_rule(current).map(|rule| (rule, other)),
        };

        let rule = match existing {
            Some((rule, occurrence)) => {
                let (before, replaced) = self.substitute(occurrence, rule);
                let first = self.first(rule);
                self.digrams.observe(&self.symbols, first);
                trace!(rule = %rule, uses = self.rules[&rule].uses, "reused rule");
                self.schedule(&[before, replaced]);
                rule
            }
            None => {
                let rule = self.new_rule(current);
                let (before_other, replaced_other) = self.substitute(other, rule);
                let (before_current, replaced_current) = self.substitute(current, rule);

                let first = self.first(rule);
                self.digrams.observe(&self.symbols, first);
                trace!(rule = %rule, "created rule");

                self.schedule(&[
                    before_other,
                    replaced_other,
                    before_current,
                    replaced_current,
                ]);
                rule
            }
        };

        self.enforce_utility(rule);
    }

    /// Returns the rule whose entire body is the digram at `first`.
    ///
    /// The start rule is never reused as a sub-rule.
    fn complete_rule(&self, first: DefaultKey) -> Option<RuleId> {
        let before = self.prev(first);
        let after = self.next(self.next(first));

        match (&self.symbols[before].symbol, &self.symbols[after].symbol) {
            (Symbol::Guard(head), Symbol::Guard(tail)) if head == tail && *head != self.start => {
                Some(*head)
            }
            _ => None,
        }
    }

    /// Inlines any rule referenced from `rule`'s body that is now used only once.
    ///
    /// Substitution only removes references that `rule`'s body still holds, so
    /// these are the only rules whose count can have dropped to one.
    fn enforce_utility(&mut self, rule: RuleId) {
        let body: Vec<DefaultKey> = self.body(rule).collect();

        for key in body {
            let Some(node) = self.symbols.get(key) else {
                continue;
            };
            let Some(inner) = node.symbol.rule() else {
                continue;
            };
            if self.rules[&inner].uses == 1 {
                self.inline(key);
            }
        }
    }

    #[inline]
    pub(crate) fn prev(&self, key: DefaultKey) -> DefaultKey {
        self.symbols[key].prev.expect("linked symbol has a predecessor")
    }

    #[inline]
    pub(crate) fn next(&self, key: DefaultKey) -> DefaultKey {
        self.symbols[key].next.expect("linked symbol has a successor")
    }
}

impl<T: Hash + Eq + Clone> Default for Sequitur<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone> Extend<T> for Sequitur<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T: Hash + Eq + Clone> FromIterator<T> for Sequitur<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut seq = Self::new();
        seq.extend(iter);
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let seq = Sequitur::<char>::new();
        assert_eq!(seq.len(), 0);
        assert!(seq.is_empty());
        assert_eq!(seq.rule_count(), 1);
        assert_eq!(seq.start_rule().get(), 0);
    }

    #[test]
    fn test_start_guard_is_self_linked() {
        let seq = Sequitur::<u8>::new();
        let guard = seq.rules[&seq.start].guard;
        assert!(matches!(seq.symbols[guard].symbol, Symbol::Guard(id) if id == seq.start));
        assert_eq!(seq.next(guard), guard);
        assert_eq!(seq.prev(guard), guard);
    }

    #[test]
    fn test_push_multiple() {
        let mut seq = Sequitur::new();
        seq.push('a');
        seq.push('b');
        seq.push('c');
        assert_eq!(seq.len(), 3);
        assert!(!seq.is_empty());
        assert_eq!(seq.rule_count(), 1);
    }

    #[test]
    fn test_repeated_digram_creates_rule() {
        let mut seq = Sequitur::new();
        seq.extend("abab".chars());
        assert_eq!(seq.rule_count(), 2);
        assert_eq!(seq.iter().collect::<String>(), "abab");
    }

    #[test]
    fn test_overlapping_run_creates_no_rule() {
        let seq: Sequitur<char> = "aaa".chars().collect();
        assert_eq!(seq.rule_count(), 1);
        assert_eq!(seq.digrams.len(), 1);
    }

    #[test]
    fn test_whole_rule_is_reused() {
        let mut seq = Sequitur::new();
        seq.extend("abcab".chars());
        assert_eq!(seq.rule_count(), 2);

        // A third "ab" reuses the existing rule instead of creating one.
        seq.extend("xab".chars());
        assert_eq!(seq.rule_count(), 2);
        let rule = *seq.rules.keys().find(|&&id| id != seq.start).unwrap();
        assert_eq!(seq.rules[&rule].uses, 3);
    }

    #[test]
    fn test_underused_rule_is_inlined() {
        let seq: Sequitur<char> = "abcabc".chars().collect();
        // "ab" was promoted to a rule, then absorbed into "abc" and inlined.
        assert_eq!(seq.rule_count(), 2);
        assert!(seq.check_invariants().is_ok());
    }

    #[test]
    fn test_from_iterator_matches_push() {
        let collected: Sequitur<u8> = b"mississippi".iter().copied().collect();
        let mut pushed = Sequitur::new();
        for &byte in b"mississippi" {
            pushed.push(byte);
        }
        assert_eq!(collected.grammar(), pushed.grammar());
    }
}

//! Structural audit of a live engine.
//!
//! Each pass walks the whole grammar, so this is meant for tests and offline
//! checks rather than for calling after every push.

use crate::digram::{digram_at, Digram};
use crate::error::InvariantViolation;
use crate::id_gen::RuleId;
use crate::sequitur::Sequitur;
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use slotmap::DefaultKey;
use std::hash::Hash;

impl<T: Hash + Eq + Clone> Sequitur<T> {
    /// Verifies every grammar invariant the engine maintains between pushes.
    ///
    /// - Recorded reference counts match the references actually present.
    /// - Every rule other than the start rule is used at least twice and has
    ///   at least two symbols.
    /// - Every rule is reachable from the start rule.
    /// - No digram occurs at two non-overlapping locations.
    /// - The digram index describes exactly the digrams present.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.check_reference_counts()?;
        self.check_rule_utility()?;
        self.check_reachability()?;

        let occurrences = self.collect_digrams();
        check_digram_uniqueness(&occurrences, |key| self.next(key))?;
        self.check_digram_index(&occurrences)?;

        Ok(())
    }

    fn check_reference_counts(&self) -> Result<(), InvariantViolation> {
        let mut actual: HashMap<RuleId, usize> = HashMap::default();
        for &rule in self.rules.keys() {
            for key in self.body(rule) {
                if let Some(inner) = self.symbols[key].symbol.rule() {
                    *actual.entry(inner).or_default() += 1;
                }
            }
        }

        for (&rule, record) in &self.rules {
            let recorded = record.uses as usize;
            let actual = actual.get(&rule).copied().unwrap_or(0);
            if recorded != actual {
                return Err(InvariantViolation::CountMismatch {
                    rule,
                    recorded,
                    actual,
                });
            }
        }

        Ok(())
    }

    fn check_rule_utility(&self) -> Result<(), InvariantViolation> {
        for (&rule, record) in &self.rules {
            if rule == self.start {
                continue;
            }
            if record.uses < 2 {
                return Err(InvariantViolation::UnderusedRule {
                    rule,
                    uses: record.uses as usize,
                });
            }
            let len = self.body(rule).count();
            if len < 2 {
                return Err(InvariantViolation::ShortRule { rule, len });
            }
        }

        Ok(())
    }

    fn check_reachability(&self) -> Result<(), InvariantViolation> {
        let mut reached = HashSet::default();
        reached.insert(self.start);
        let mut frontier = vec![self.start];

        while let Some(rule) = frontier.pop() {
            for key in self.body(rule) {
                if let Some(inner) = self.symbols[key].symbol.rule() {
                    if reached.insert(inner) {
                        frontier.push(inner);
                    }
                }
            }
        }

        match self.rules.keys().find(|rule| !reached.contains(*rule)) {
            Some(&rule) => Err(InvariantViolation::UnreachableRule { rule }),
            None => Ok(()),
        }
    }

    /// Every location at which each digram currently occurs.
    fn collect_digrams(&self) -> HashMap<Digram<T>, Vec<DefaultKey>> {
        let mut occurrences: HashMap<Digram<T>, Vec<DefaultKey>> = HashMap::default();
        for &rule in self.rules.keys() {
            for key in self.body(rule) {
                if let Some(digram) = digram_at(&self.symbols, key) {
                    occurrences.entry(digram).or_default().push(key);
                }
            }
        }
        occurrences
    }

    fn check_digram_index(
        &self,
        occurrences: &HashMap<Digram<T>, Vec<DefaultKey>>,
    ) -> Result<(), InvariantViolation> {
        let stale = self
            .digrams
            .entries()
            .filter(|&(digram, key)| digram_at(&self.symbols, key).as_ref() != Some(digram))
            .count();
        if stale > 0 {
            return Err(InvariantViolation::StaleIndexEntry { entries: stale });
        }

        let indexed: HashSet<DefaultKey> = self.digrams.entries().map(|(_, key)| key).collect();
        let missing = occurrences
            .values()
            .any(|locations| !locations.iter().any(|key| indexed.contains(key)));
        if missing {
            return Err(InvariantViolation::MissingIndexEntry);
        }

        Ok(())
    }
}

/// Fails if any digram occurs at two locations that do not share a symbol.
fn check_digram_uniqueness<D>(
    occurrences: &HashMap<D, Vec<DefaultKey>>,
    next: impl Fn(DefaultKey) -> DefaultKey,
) -> Result<(), InvariantViolation> {
    for locations in occurrences.values() {
        let duplicated = match locations.as_slice() {
            [] | [_] => false,
            [a, b] => next(*a) != *b && next(*b) != *a,
            _ => true,
        };
        if duplicated {
            return Err(InvariantViolation::DuplicateDigram {
                locations: locations.len(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_engine_is_valid() {
        assert_eq!(Sequitur::<char>::new().check_invariants(), Ok(()));
    }

    #[test]
    fn test_classic_inputs_are_valid() {
        for input in ["abcabc", "aaaa", "abcabcabc", "abracadabra", "mississippi"] {
            let seq: Sequitur<char> = input.chars().collect();
            assert_eq!(seq.check_invariants(), Ok(()), "input {input:?}");
        }
    }

    #[test]
    fn test_detects_count_mismatch() {
        let mut seq: Sequitur<char> = "abab".chars().collect();
        let rule = *seq.rules.keys().find(|&&id| id != seq.start).unwrap();
        seq.rules.get_mut(&rule).unwrap().uses = 5;

        assert_eq!(
            seq.check_invariants(),
            Err(InvariantViolation::CountMismatch {
                rule,
                recorded: 5,
                actual: 2,
            })
        );
    }

    #[test]
    fn test_detects_duplicate_digram() {
        let mut seq: Sequitur<char> = "abcd".chars().collect();
        // Append "ab" behind the engine's back, bypassing repair.
        let guard = seq.rules[&seq.start].guard;
        for value in ['a', 'b'] {
            let key = seq
                .symbols
                .insert(crate::symbol::SymbolNode::new(crate::symbol::Symbol::Terminal(value)));
            let last = seq.prev(guard);
            seq.insert_after(last, key);
        }
        seq.pending.clear();

        assert_eq!(
            seq.check_invariants(),
            Err(InvariantViolation::DuplicateDigram { locations: 2 })
        );
    }

    #[test]
    fn test_overlapping_run_is_not_a_duplicate() {
        let mut occurrences = HashMap::default();
        let mut seq: Sequitur<char> = "aaa".chars().collect();
        let keys: Vec<_> = seq.body(seq.start).collect();
        occurrences.insert((), vec![keys[0], keys[1]]);
        assert_eq!(check_digram_uniqueness(&occurrences, |key| seq.next(key)), Ok(()));

        seq.push('a');
        assert_eq!(seq.check_invariants(), Ok(()));
    }
}

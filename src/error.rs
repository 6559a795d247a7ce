use crate::id_gen::RuleId;
use thiserror::Error;

/// Errors returned by lookups on a [`Grammar`](crate::Grammar) snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("rule {rule} is not part of this grammar")]
    UnknownRule { rule: RuleId },
}

/// A broken grammar invariant, reported by [`Sequitur::check_invariants`](crate::Sequitur::check_invariants).
///
/// The engine never produces these for any input; seeing one means a defect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("a digram occurs at {locations} non-overlapping locations")]
    DuplicateDigram { locations: usize },

    #[error("rule {rule} is referenced {uses} times, expected at least 2")]
    UnderusedRule { rule: RuleId, uses: usize },

    #[error("rule {rule} records {recorded} uses but {actual} references exist")]
    CountMismatch {
        rule: RuleId,
        recorded: usize,
        actual: usize,
    },

    #[error("rule {rule} has a body of {len} symbols")]
    ShortRule { rule: RuleId, len: usize },

    #[error("rule {rule} is not reachable from the start rule")]
    UnreachableRule { rule: RuleId },

    #[error("{entries} digram index entries point at locations that no longer form their digram")]
    StaleIndexEntry { entries: usize },

    #[error("a digram present in the grammar is missing from the index")]
    MissingIndexEntry,
}

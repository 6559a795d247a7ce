use crate::id_gen::RuleId;
use crate::symbol::{Symbol, SymbolNode};
use ahash::AHashMap as HashMap;
use slotmap::{DefaultKey, SlotMap};
use std::hash::Hash;

/// The identity a symbol contributes to a digram key.
///
/// Terminals compare by value and non-terminals by rule identity, never by
/// the content of the rule's body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Signature<T> {
    Terminal(T),
    Rule(RuleId),
}

/// An ordered pair of adjacent symbol signatures.
pub(crate) type Digram<T> = (Signature<T>, Signature<T>);

impl<T: Clone> Symbol<T> {
    /// Guards have no signature and never take part in a digram.
    #[inline]
    pub(crate) fn signature(&self) -> Option<Signature<T>> {
        match self {
            Symbol::Terminal(value) => Some(Signature::Terminal(value.clone())),
            Symbol::NonTerminal(rule) => Some(Signature::Rule(*rule)),
            Symbol::Guard(_) => None,
        }
    }
}

/// Derives the digram starting at `first`, recomputed from the current symbols.
///
/// Returns None if `first` is freed, detached or a guard, or if its successor is a guard.
#[inline]
pub(crate) fn digram_at<T: Clone>(
    symbols: &SlotMap<DefaultKey, SymbolNode<T>>,
    first: DefaultKey,
) -> Option<Digram<T>> {
    let node = symbols.get(first)?;
    let second = node.next?;
    let head = node.symbol.signature()?;
    let tail = symbols[second].symbol.signature()?;
    Some((head, tail))
}

/// Outcome of looking up the digram at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// The location does not currently form a digram.
    Unavailable,
    /// No occurrence is recorded.
    Absent,
    /// The recorded occurrence is the location itself.
    Itself,
    /// The recorded occurrence shares a symbol with the location.
    Overlapping,
    /// A distinct, non-overlapping occurrence exists at this location.
    Found(DefaultKey),
}

/// Maps every digram in the grammar to the single location exhibiting it.
#[derive(Debug)]
pub(crate) struct DigramIndex<T> {
    map: HashMap<Digram<T>, DefaultKey>,
}

impl<T: Hash + Eq + Clone> DigramIndex<T> {
    pub(crate) fn new() -> Self {
        Self {
            map: HashMap::default(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    /// Recorded entries, for auditing.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&Digram<T>, DefaultKey)> + '_ {
        self.map.iter().map(|(digram, &key)| (digram, key))
    }

    /// Looks up the digram formed at `first` against the recorded occurrences.
    ///
    /// Only [`Lookup::Found`] is a match: the location itself and occurrences
    /// sharing a symbol with it are reported but never matched.
    pub(crate) fn find(
        &self,
        symbols: &SlotMap<DefaultKey, SymbolNode<T>>,
        first: DefaultKey,
    ) -> Lookup {
        let Some(digram) = digram_at(symbols, first) else {
            return Lookup::Unavailable;
        };

        let Some(&other) = self.map.get(&digram) else {
            return Lookup::Absent;
        };

        if other == first {
            return Lookup::Itself;
        }

        debug_assert!(
            symbols.contains_key(other),
            "digram index points at a freed symbol"
        );
        debug_assert!(
            digram_at(symbols, other).as_ref() == Some(&digram),
            "digram index entry no longer matches its location"
        );
        if !symbols.contains_key(other) {
            return Lookup::Absent;
        }

        let second = symbols[first].next;
        let other_second = symbols[other].next;
        if other_second == Some(first) || second == Some(other) {
            return Lookup::Overlapping;
        }

        Lookup::Found(other)
    }

    /// Records the digram at `first`, replacing any previous location.
    pub(crate) fn observe(
        &mut self,
        symbols: &SlotMap<DefaultKey, SymbolNode<T>>,
        first: DefaultKey,
    ) {
        if let Some(digram) = digram_at(symbols, first) {
            self.map.insert(digram, first);
        }
    }

    /// Removes the digram at `first` if, and only if, it is recorded at `first`.
    pub(crate) fn forget(
        &mut self,
        symbols: &SlotMap<DefaultKey, SymbolNode<T>>,
        first: DefaultKey,
    ) {
        let Some(digram) = digram_at(symbols, first) else {
            return;
        };

        if self.map.get(&digram) == Some(&first) {
            self.map.remove(&digram);
        }
    }
}

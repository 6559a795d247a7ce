use crate::sequitur::Sequitur;
use crate::symbol::Symbol;
use slotmap::DefaultKey;
use std::hash::Hash;

/// Iterator that reconstructs the original sequence by expanding rules.
///
/// Keeps an explicit stack of the non-terminals being expanded, so nesting
/// depth never grows the call stack.
pub struct SequiturIter<'a, T> {
    sequitur: &'a Sequitur<T>,
    current: Option<DefaultKey>,
    stack: Vec<DefaultKey>,
}

impl<'a, T: Hash + Eq + Clone> SequiturIter<'a, T> {
    pub(crate) fn new(sequitur: &'a Sequitur<T>) -> Self {
        Self {
            sequitur,
            current: Some(sequitur.first(sequitur.start)),
            stack: Vec::new(),
        }
    }
}

impl<'a, T: Hash + Eq + Clone> Iterator for SequiturIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let sequitur = self.sequitur;

        loop {
            let key = self.current?;

            match &sequitur.symbols[key].symbol {
                Symbol::Terminal(value) => {
                    self.current = Some(sequitur.next(key));
                    return Some(value);
                }
                Symbol::NonTerminal(rule) => {
                    // Descend, remembering where to resume
                    self.stack.push(sequitur.next(key));
                    self.current = Some(sequitur.first(*rule));
                }
                Symbol::Guard(_) => {
                    // End of a body: resume in the parent, or stop at the start rule's end
                    self.current = self.stack.pop();
                }
            }
        }
    }
}

impl<T: Hash + Eq + Clone> Sequitur<T> {
    /// Returns an iterator over the reconstructed sequence.
    pub fn iter(&self) -> SequiturIter<'_, T> {
        SequiturIter::new(self)
    }
}

impl<'a, T: Hash + Eq + Clone> IntoIterator for &'a Sequitur<T> {
    type Item = &'a T;
    type IntoIter = SequiturIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

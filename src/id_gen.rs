use std::fmt;

/// Identity of a rule in the grammar.
///
/// Identities are allocated by the engine and recycled once a rule has been
/// inlined away, so an id only names a rule for as long as that rule is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(u32);

impl RuleId {
    /// Returns the raw integer value of this id.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ID generator that reuses freed IDs so long inputs never exhaust the id space.
#[derive(Debug)]
pub(crate) struct IdGenerator {
    next: u32,
    freed: Vec<u32>,
}

impl IdGenerator {
    /// Creates a new ID generator starting from ID 0.
    pub(crate) fn new() -> Self {
        Self {
            next: 0,
            freed: Vec::new(),
        }
    }

    /// Gets a new ID, reusing a freed one if available.
    pub(crate) fn get(&mut self) -> RuleId {
        if let Some(id) = self.freed.pop() {
            RuleId(id)
        } else {
            let id = self.next;
            self.next += 1;
            RuleId(id)
        }
    }

    /// Marks an ID as freed, making it available for reuse.
    pub(crate) fn free(&mut self, id: RuleId) {
        debug_assert!(id.0 < self.next, "Cannot free ID that was never allocated");
        self.freed.push(id.0);
    }
}

//! # Sequitur - Grammar Induction
//!
//! Infers a hierarchical context-free grammar that exactly reproduces an input
//! sequence, representing every repeated substructure only once.
//!
//! The grammar is built incrementally, one value at a time, while enforcing two
//! constraints:
//! 1. **Digram Uniqueness**: No digram (pair of consecutive symbols) appears more than once
//! 2. **Rule Utility**: Every rule other than the start rule is used at least twice
//!
//! ## Example
//!
//! ```
//! use sequitur_grammar::{Element, Sequitur};
//!
//! let mut seq = Sequitur::new();
//! seq.extend("abcabc".chars());
//!
//! let grammar = seq.grammar();
//! let rule = &grammar.rules()[1];
//! assert_eq!(grammar.start().body(), &[Element::Rule(rule.id()), Element::Rule(rule.id())]);
//! assert_eq!(grammar.expand_start(), "abcabc".chars().collect::<Vec<_>>());
//!
//! for line in grammar.render() {
//!     println!("{line}");
//! }
//! ```
//!
//! ## Performance
//!
//! - O(1) amortized time per symbol added
//! - Repair cascades run on an explicit worklist, never on the call stack
//! - Symbols live in a generational arena (SlotMap) addressed by stable keys

mod digram;
mod error;
mod grammar;
mod id_gen;
mod iter;
pub mod render;
mod rule;
mod sequitur;
mod symbol;
mod validate;


pub use error::{GrammarError, InvariantViolation};
pub use grammar::{Element, Grammar, Rule};
pub use id_gen::RuleId;
pub use iter::SequiturIter;
pub use render::{render, RenderOptions};
pub use sequitur::Sequitur;

//! Plain-text rendering of a grammar, one line per rule.
//!
//! ```
//! use sequitur_grammar::Sequitur;
//!
//! let seq: Sequitur<char> = "abcabc".chars().collect();
//! assert_eq!(seq.grammar().render(), vec!["0 → ^1 ^1", "1 → a b c"]);
//! ```

use crate::grammar::{Element, Grammar};
use std::fmt::Display;

/// Separates a rule's index from its body.
pub const ARROW: &str = "→";

/// Prefix marking a rule reference; rule 3 renders as `^3`.
pub const RULE_INDEX_STR: &str = "^";

/// Shown in place of a space terminal.
pub const SPACE_REPLACEMENT: &str = "_";

/// Shown in place of a newline terminal.
pub const NEWLINE_REPLACEMENT: &str = "↵";

/// Controls how [`render`] formats a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub arrow: String,
    pub rule_prefix: String,
    pub space: String,
    pub newline: String,
    /// List the start rule first; otherwise it is listed last.
    pub start_first: bool,
    /// Append each rule's full expansion after its body.
    pub show_expansion: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            arrow: ARROW.to_string(),
            rule_prefix: RULE_INDEX_STR.to_string(),
            space: SPACE_REPLACEMENT.to_string(),
            newline: NEWLINE_REPLACEMENT.to_string(),
            start_first: true,
            show_expansion: false,
        }
    }
}

impl RenderOptions {
    fn escape(&self, text: &str) -> String {
        text.replace(' ', &self.space).replace('\n', &self.newline)
    }
}

/// Renders one line per rule: canonical index, arrow, then the body.
///
/// Rule references use canonical indices (start rule = 0), so two grammars
/// with the same structure render identically whatever their internal ids.
pub fn render<T: Display + Clone>(grammar: &Grammar<T>, options: &RenderOptions) -> Vec<String> {
    let mut lines: Vec<String> = grammar
        .rules()
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            let mut parts = vec![index.to_string(), options.arrow.clone()];
            for element in rule.body() {
                parts.push(match element {
                    Element::Terminal(value) => options.escape(&value.to_string()),
                    Element::Rule(id) => {
                        let target = grammar.index_of(*id).unwrap_or_default();
                        format!("{}{}", options.rule_prefix, target)
                    }
                });
            }

            let mut line = parts.join(" ");
            if options.show_expansion {
                if let Ok(values) = grammar.expand(rule.id()) {
                    let text: String = values.iter().map(ToString::to_string).collect();
                    line.push_str("    ");
                    line.push_str(&options.escape(&text));
                }
            }
            line
        })
        .collect();

    if !options.start_first {
        lines.rotate_left(1);
    }
    lines
}

impl<T: Display + Clone> Grammar<T> {
    /// Renders with [`RenderOptions::default`].
    pub fn render(&self) -> Vec<String> {
        render(self, &RenderOptions::default())
    }
}

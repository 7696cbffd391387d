//! The rule-table driver
//!
//! A table is an ordered list of (pattern, handler) pairs. The driver looks
//! for the first rule matching the start of the remaining text, lets its
//! handler update the effect under construction, splices the handler's
//! remainder back in front of the unread text and starts over from the top
//! of the table. Order matters: specific rules come before general ones, and
//! a clause may leave state behind (a pending coin flip) for a later clause.

use crate::compiler::{ConditionGrammar, EffectBuilder};
use regex::{Captures, Regex};
use std::sync::Arc;

/// Updates the builder from a match and returns text to put back in front
/// of the unread remainder (usually empty)
pub type Handler = fn(&mut EffectBuilder<'_>, &Captures<'_>) -> String;

/// Upper bound on rule applications for one text
const MAX_PASSES: usize = 64;

pub struct Rule {
    pub name: &'static str,
    pub pattern: Regex,
    pub handler: Handler,
}

impl Rule {
    /// `pattern` is matched case-insensitively against the start of the text
    pub fn new(name: &'static str, pattern: &str, handler: Handler) -> Self {
        let pattern = Regex::new(&format!(r"(?i)^(?:{pattern})\s*")).expect("rule patterns are valid");
        Rule { name, pattern, handler }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).field("pattern", &self.pattern.as_str()).finish()
    }
}

pub struct RuleTable {
    rules: Vec<Rule>,
    pub conditions: Arc<ConditionGrammar>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>, conditions: Arc<ConditionGrammar>) -> Self {
        RuleTable { rules, conditions }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The first rule whose pattern matches the start of `text`
    pub fn first_match<'r, 'x>(&'r self, text: &'x str) -> Option<(&'r Rule, Captures<'x>)> {
        self.rules
            .iter()
            .find_map(|rule| rule.pattern.captures(text).map(|caps| (rule, caps)))
    }

    /// Compile `text` into `builder`
    ///
    /// Stops at the first fragment no rule understands; everything compiled
    /// before it is kept. A coin flip that no later clause consumed is a
    /// failure too.
    pub fn drive(&self, builder: &mut EffectBuilder<'_>, text: &str) {
        let mut rest = text.trim().to_string();
        let mut passes = 0;
        while !rest.is_empty() {
            passes += 1;
            if passes > MAX_PASSES {
                builder.unmatched(rest);
                break;
            }
            let next = {
                let Some((rule, caps)) = self.first_match(&rest) else {
                    builder.unmatched(rest.clone());
                    break;
                };
                let end = caps.get(0).map_or(0, |m| m.end());
                if end == 0 {
                    builder.unmatched(rest.clone());
                    break;
                }
                let remainder = (rule.handler)(builder, &caps);
                format!("{} {}", remainder.trim(), &rest[end..]).trim().to_string()
            };
            rest = next;
        }
        if builder.pending_coin.take().is_some() {
            builder.fail("coin flip with no outcome");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Mode;

    fn mark_draw(builder: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
        builder.ends_turn = true;
        String::new()
    }

    fn rewrite(_: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
        format!("Draw {} cards.", &caps["n"])
    }

    fn table() -> RuleTable {
        RuleTable::new(
            vec![
                Rule::new("draw", r"draw \d+ cards\.", mark_draw),
                Rule::new("rewrite", r"pull (?P<n>\d+)\.", rewrite),
            ],
            Arc::new(ConditionGrammar::new()),
        )
    }

    #[test]
    fn test_drive_consumes_all_text() {
        let table = table();
        let mut builder = EffectBuilder::new(&table, Mode::Trainer);
        table.drive(&mut builder, "Draw 2 cards.");
        assert!(builder.ends_turn);
        assert!(builder.is_ok());
    }

    #[test]
    fn test_remainder_is_rescanned_from_the_top() {
        let table = table();
        let mut builder = EffectBuilder::new(&table, Mode::Trainer);
        table.drive(&mut builder, "Pull 3.");
        assert!(builder.ends_turn);
        assert!(builder.is_ok());
    }

    #[test]
    fn test_unmatched_text_is_recorded() {
        let table = table();
        let mut builder = EffectBuilder::new(&table, Mode::Trainer);
        table.drive(&mut builder, "Draw 2 cards. Dance.");
        assert!(builder.ends_turn);
        assert!(!builder.is_ok());
        assert_eq!(builder.unmatched_text(), ["Dance.".to_string()]);
    }
}

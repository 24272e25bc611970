//! Regex rules applied line by line

use crate::record::{remove_empty, Record};
use regex::{Captures, Regex};

/// One pattern and the record it builds when a line matches
pub struct Rule {
    pattern: Regex,
    build: fn(&Captures<'_>) -> Record,
}

impl Rule {
    pub fn new(pattern: Regex, build: fn(&Captures<'_>) -> Record) -> Self {
        Self { pattern, build }
    }

    /// Apply to a single line, returning `None` when the pattern does not match
    pub fn apply(&self, line: &str) -> Option<Record> {
        self.pattern.captures(line).map(|caps| (self.build)(&caps))
    }
}

/// An ordered set of rules for one file kind
///
/// Every rule is tried against every line; fields from several matching
/// rules are merged into a single record for that line.
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Record for one line (empty when nothing matched)
    pub fn parse_line(&self, line: &str) -> Record {
        let mut record = Record::new();
        for rule in &self.rules {
            if let Some(fields) = rule.apply(line) {
                record.extend(fields);
            }
        }
        record
    }

    /// Records for every line that matched at least one rule, in file order
    pub fn parse<I, S>(&self, lines: I) -> Vec<Record>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        remove_empty(
            lines
                .into_iter()
                .map(|line| self.parse_line(line.as_ref()))
                .collect(),
        )
    }
}

/// Parse a float token, accepting Fortran `D` exponents
pub(crate) fn float(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().or_else(|| {
        if token.contains(['D', 'd']) {
            token.replace(['D', 'd'], "E").parse().ok()
        } else {
            None
        }
    })
}

//! OUTCAR line rules
//!
//! Recognised lines:
//! - `NELECT =       8.0000    total number of electrons`
//!   → `number of electrons`
//! - ` number of electron       8.0000000 magnetization       2.0000000`
//!   → `total magnetization`

use crate::record::{Field, Record};
use crate::rules::{float, Rule, RuleSet};
use once_cell::sync::Lazy;
use regex::Regex;

pub const NUMBER_OF_ELECTRONS: &str = "number of electrons";
pub const TOTAL_MAGNETIZATION: &str = "total magnetization";

static RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(vec![
        Rule::new(Regex::new(r"NELECT\s*=\s*(\S+)").unwrap(), |caps| {
            single(NUMBER_OF_ELECTRONS, &caps[1])
        }),
        Rule::new(
            Regex::new(r"number of electron\s+\S+\s+magnetization\s+(\S+)").unwrap(),
            |caps| single(TOTAL_MAGNETIZATION, &caps[1]),
        ),
    ])
});

fn single(key: &'static str, token: &str) -> Record {
    let mut record = Record::new();
    if let Some(value) = float(token) {
        record.insert(key, Field::Float(value));
    }
    record
}

/// The OUTCAR rule set
pub fn rules() -> &'static RuleSet {
    &RULES
}

/// Scan OUTCAR lines
pub fn parse<I, S>(lines: I) -> Vec<Record>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    RULES.parse(lines)
}

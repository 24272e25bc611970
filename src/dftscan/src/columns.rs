//! Whitespace-separated numeric tables with a fixed column layout

use crate::record::{remove_empty, Field, Record};
use crate::rules::float;

/// Scanner for tables whose rows are all-numeric columns in a known order
///
/// Lines starting with `#` and blank lines are skipped. A row with fewer
/// numeric columns than declared, or with a non-numeric token, yields no
/// record.
#[derive(Debug, Clone, Copy)]
pub struct ColumnTable {
    columns: &'static [&'static str],
}

impl ColumnTable {
    pub const fn new(columns: &'static [&'static str]) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        self.columns
    }

    pub fn parse_line(&self, line: &str) -> Record {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Record::new();
        }

        let values: Option<Vec<f64>> = trimmed.split_whitespace().map(float).collect();
        match values {
            Some(values) if values.len() >= self.columns.len() => self
                .columns
                .iter()
                .zip(values)
                .map(|(name, v)| (*name, Field::Float(v)))
                .collect(),
            _ => Record::new(),
        }
    }

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

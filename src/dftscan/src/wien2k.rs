//! Wien2k output scanners

use crate::columns::ColumnTable;
use crate::record::{Field, Record};
use crate::rules::{float, Rule, RuleSet};
use once_cell::sync::Lazy;
use regex::Regex;

/// Keys produced by the Wien2k scanners
pub mod keys {
    pub const TOTAL_ENERGY: &str = "total energy";
    pub const TOTAL_ENERGY_UNITS: &str = "total energy units";
    pub const BAND_GAP: &str = "band gap";
    pub const BAND_GAP_UNITS: &str = "band gap units";
    pub const VERSION: &str = "version";
    pub const ENERGY: &str = "energy";
}

/// `.scf` rules
///
/// - `:ENE  : ********** TOTAL ENERGY IN Ry =    -2541.43216540`
/// - `:LABEL3: using WIEN2k_14.2 (Release 15/10/2014) in /opt/wien2k`
pub mod scf {
    use super::*;

    static RULES: Lazy<RuleSet> = Lazy::new(|| {
        RuleSet::new(vec![
            Rule::new(
                Regex::new(r":ENE\s*:.*TOTAL ENERGY IN\s+(\w+)\s*=\s*(\S+)").unwrap(),
                |caps| {
                    let mut record = Record::new();
                    if let Some(energy) = float(&caps[2]) {
                        record.insert(keys::TOTAL_ENERGY, Field::Float(energy));
                        record.insert(keys::TOTAL_ENERGY_UNITS, Field::Text(caps[1].to_string()));
                    }
                    record
                },
            ),
            Rule::new(Regex::new(r":LABEL3:\s+using\s+(\S+)").unwrap(), |caps| {
                let mut record = Record::new();
                record.insert(keys::VERSION, Field::Text(caps[1].to_string()));
                record
            }),
        ])
    });

    pub fn rules() -> &'static RuleSet {
        &RULES
    }

    pub fn parse<I, S>(lines: I) -> Vec<Record>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        RULES.parse(lines)
    }
}

/// `.scf2` rules
///
/// - `:GAP  :    0.0472 Ry =     0.642 eV   (provisional)`
pub mod scf2 {
    use super::*;

    static RULES: Lazy<RuleSet> = Lazy::new(|| {
        RuleSet::new(vec![Rule::new(
            Regex::new(r":GAP[^:]*:\s*(\S+)\s*Ry\s*=\s*(\S+)\s*eV").unwrap(),
            |caps| {
                let mut record = Record::new();
                if let Some(gap) = float(&caps[2]) {
                    record.insert(keys::BAND_GAP, Field::Float(gap));
                    record.insert(keys::BAND_GAP_UNITS, Field::Text("eV".to_string()));
                }
                record
            },
        )])
    });

    pub fn rules() -> &'static RuleSet {
        &RULES
    }

    pub fn parse<I, S>(lines: I) -> Vec<Record>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        RULES.parse(lines)
    }
}

/// `.absorp`: energy, Re σxx, Re σzz, αxx, αzz
pub const ABSORP: ColumnTable = ColumnTable::new(&[
    keys::ENERGY,
    "re_sigma_xx",
    "re_sigma_zz",
    "absorp_xx",
    "absorp_zz",
]);

/// `.eloss`: energy, loss function xx, zz
pub const ELOSS: ColumnTable = ColumnTable::new(&[keys::ENERGY, "eloss_xx", "eloss_zz"]);

/// `.epsilon`: energy, Re εxx, Im εxx, Re εzz, Im εzz
pub const EPSILON: ColumnTable = ColumnTable::new(&[
    keys::ENERGY,
    "re_eps_xx",
    "im_eps_xx",
    "re_eps_zz",
    "im_eps_zz",
]);

pub mod absorp {
    use super::*;

    pub fn parse<I, S>(lines: I) -> Vec<Record>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ABSORP.parse(lines)
    }
}

pub mod eloss {
    use super::*;

    pub fn parse<I, S>(lines: I) -> Vec<Record>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ELOSS.parse(lines)
    }
}

pub mod epsilon {
    use super::*;

    pub fn parse<I, S>(lines: I) -> Vec<Record>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        EPSILON.parse(lines)
    }
}

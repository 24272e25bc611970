//! Line-level scanners for DFT code output
//!
//! Each scanner turns the lines of one kind of output file into a stream of
//! [`Record`]s: small key → value maps describing what a single line (or, for
//! block formats, a single block) says. Scanners know nothing about which
//! physical property a caller is after; they only recognise markers.
//!
//! # Supported files
//!
//! ## VASP
//! - `OUTCAR`: electron count, magnetization ([`vasp::outcar`])
//! - `EIGENVAL`: per k-point band energies ([`vasp::eigenval`])
//!
//! ## Wien2k
//! - `*.scf`: total energy, version label ([`wien2k::scf`])
//! - `*.scf2`: band gap ([`wien2k::scf2`])
//! - `*.absorp`, `*.eloss`, `*.epsilon`: optical column tables
//!   ([`wien2k::absorp`], [`wien2k::eloss`], [`wien2k::epsilon`])

mod columns;
mod record;
mod rules;
pub mod vasp;
pub mod wien2k;

pub use columns::ColumnTable;
pub use record::{remove_empty, transpose, Field, Record};
pub use rules::{Rule, RuleSet};

/// Errors from block-structured scanners
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(&'static str),

    #[error("Malformed line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

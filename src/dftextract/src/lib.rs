//! Property extraction for DFT calculation directories
//!
//! Given a directory written by a supported code, detect which code produced
//! it and pull a uniform set of physical properties out of its text output.
//!
//! # Pipeline
//!
//! 1. [`Registry::detect`] runs each backend's applicability test (VASP:
//!    an `OUTCAR` file; Wien2k: a `.scf` file carrying a Wien2k signature).
//! 2. [`extract`] runs every entry of the chosen backend's capability table
//!    and sorts the outcomes into found properties and omissions.
//! 3. [`ExtractionResult`] maps canonical property names to [`Property`]
//!    values; omissions record why an entry produced nothing.
//!
//! A missing marker only costs the property that needed it. I/O failures and
//! detection failures abort the directory.
//!
//! # Supported codes
//!
//! | Backend | Primary file | Extra files |
//! |---------|--------------|-------------|
//! | VASP    | `OUTCAR`     | `EIGENVAL`, `DOSCAR`, `INCAR`, `POSCAR` |
//! | Wien2k  | `*.scf`      | `*.scf2`, `*.absorp`, `*.eloss`, `*.epsilon` |

mod backend;
mod batch;
mod capability;
mod config;
mod driver;
mod error;
mod files;
mod property;
mod registry;
pub mod vasp;
pub mod wien2k;

// Re-export main types
pub use backend::{ApplicabilityFn, Backend, VersionFn};
pub use batch::{discover, extract_all};
pub use capability::{Capability, CapabilityTable, ExtractFn, Extractor, PropertyKey};
pub use config::{AmbiguityPolicy, Config};
pub use driver::{
    extract, extract_with, process, process_with, CancelFlag, ExtractionResult, Omission,
};
pub use error::{Error, Extraction, FieldError, Outcome, Result};
pub use files::{Calculation, Lines, TextFile};
pub use property::{Condition, FileReference, Property, Scalar, Value};
pub use registry::Registry;

//! Capability tables
//!
//! A capability table is the ordered list of properties a backend attempts,
//! each paired with the extractor that produces it. Tables are composed, not
//! inherited: every backend starts from [`CapabilityTable::base`] and merges
//! its own entries on top. An override replaces the base entry of the same
//! canonical name in place; entries the base does not know are appended.

use crate::error::{Extraction, Outcome};
use crate::files::Calculation;
use std::fmt;
use std::sync::Arc;

/// Canonical property identifiers
///
/// The base set is enumerated; backend-specific properties use
/// [`PropertyKey::Other`] with their display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Converged,
    TotalEnergy,
    BandGap,
    Pressure,
    Stresses,
    DensityOfStates,
    Positions,
    Forces,
    TotalMagnetization,
    OutputFile,
    XcFunctional,
    Pseudopotentials,
    Relaxed,
    CutoffEnergy,
    KPointsPerReciprocalAtom,
    SpinOrbitCoupling,
    HubbardU,
    VanDerWaals,
    InputParametersFile,
    InputStructureFile,
    Other(&'static str),
}

impl PropertyKey {
    /// Every base-set key in declaration order
    pub const BASE: [PropertyKey; 20] = [
        Self::Converged,
        Self::TotalEnergy,
        Self::BandGap,
        Self::Pressure,
        Self::Stresses,
        Self::DensityOfStates,
        Self::Positions,
        Self::Forces,
        Self::TotalMagnetization,
        Self::OutputFile,
        Self::XcFunctional,
        Self::Pseudopotentials,
        Self::Relaxed,
        Self::CutoffEnergy,
        Self::KPointsPerReciprocalAtom,
        Self::SpinOrbitCoupling,
        Self::HubbardU,
        Self::VanDerWaals,
        Self::InputParametersFile,
        Self::InputStructureFile,
    ];

    /// Canonical name used as the result key
    pub fn name(&self) -> &'static str {
        match self {
            Self::Converged => "Converged",
            Self::TotalEnergy => "Total Energy",
            Self::BandGap => "Band Gap Energy",
            Self::Pressure => "Pressure",
            Self::Stresses => "Stresses",
            Self::DensityOfStates => "Density of States",
            Self::Positions => "Positions",
            Self::Forces => "Forces",
            Self::TotalMagnetization => "Total Magnetization",
            Self::OutputFile => "Output File",
            Self::XcFunctional => "XC Functional",
            Self::Pseudopotentials => "Pseudopotentials",
            Self::Relaxed => "Relaxed",
            Self::CutoffEnergy => "Cutoff Energy",
            Self::KPointsPerReciprocalAtom => "k-Points per Reciprocal Atom",
            Self::SpinOrbitCoupling => "Spin-Orbit Coupling",
            Self::HubbardU => "DFT+U",
            Self::VanDerWaals => "vdW Interactions",
            Self::InputParametersFile => "Input Parameters File",
            Self::InputStructureFile => "Input Structure File",
            Self::Other(name) => *name,
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extraction logic shared across threads
pub type ExtractFn = Arc<dyn Fn(&Calculation) -> Extraction + Send + Sync>;

/// How one capability entry is produced
#[derive(Clone)]
pub enum Extractor {
    Run(ExtractFn),
    /// Declared but never produced by this backend
    Unsupported,
}

impl Extractor {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Calculation) -> Extraction + Send + Sync + 'static,
    {
        Self::Run(Arc::new(f))
    }

    pub fn run(&self, calc: &Calculation) -> Extraction {
        match self {
            Self::Run(f) => f(calc),
            Self::Unsupported => Ok(Outcome::NotApplicable),
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Run(_))
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run(_) => f.write_str("Run(..)"),
            Self::Unsupported => f.write_str("Unsupported"),
        }
    }
}

/// One entry of a capability table
#[derive(Debug, Clone)]
pub struct Capability {
    pub key: PropertyKey,
    pub extractor: Extractor,
}

impl Capability {
    pub fn new<F>(key: PropertyKey, f: F) -> Self
    where
        F: Fn(&Calculation) -> Extraction + Send + Sync + 'static,
    {
        Self {
            key,
            extractor: Extractor::new(f),
        }
    }

    pub fn unsupported(key: PropertyKey) -> Self {
        Self {
            key,
            extractor: Extractor::Unsupported,
        }
    }

    pub fn name(&self) -> &'static str {
        self.key.name()
    }
}

/// Ordered capability entries with unique canonical names
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    entries: Vec<Capability>,
}

impl CapabilityTable {
    /// Every base-set property, none of them implemented yet
    pub fn base() -> Self {
        Self {
            entries: PropertyKey::BASE
                .iter()
                .copied()
                .map(Capability::unsupported)
                .collect(),
        }
    }

    /// Merge `overrides` on top of this table
    ///
    /// Same-name entries replace the existing entry wholesale and keep its
    /// position; new names are appended in the order given. If `overrides`
    /// repeats a name, the later entry wins.
    pub fn merge(mut self, overrides: impl IntoIterator<Item = Capability>) -> Self {
        for entry in overrides {
            match self.entries.iter_mut().find(|e| e.name() == entry.name()) {
                Some(existing) => *existing = entry,
                None => self.entries.push(entry),
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.entries.iter().find(|e| e.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(Capability::name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a CapabilityTable {
    type Item = &'a Capability;
    type IntoIter = std::slice::Iter<'a, Capability>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

//! VASP backend
//!
//! A directory is a VASP run when it holds an `OUTCAR`. Most properties come
//! from `OUTCAR`; the band gap also uses `EIGENVAL` or `DOSCAR`, and the
//! density of states comes from `DOSCAR`.

mod bandgap;
mod dos;
mod outcar;

pub use bandgap::band_gap_from_bands;

use crate::backend::Backend;
use crate::capability::{Capability, CapabilityTable, PropertyKey};
use crate::error::{Error, Extraction, FieldError, Outcome, Result};
use crate::files::{self, token, Calculation};
use crate::property::Property;
use std::path::Path;

pub const NAME: &str = "VASP";

pub(crate) const OUTCAR: &str = "OUTCAR";
pub(crate) const INCAR: &str = "INCAR";
pub(crate) const POSCAR: &str = "POSCAR";
pub(crate) const EIGENVAL: &str = "EIGENVAL";
pub(crate) const DOSCAR: &str = "DOSCAR";

/// The VASP backend descriptor
pub fn backend() -> Backend {
    let table = CapabilityTable::base().merge([
        Capability::new(PropertyKey::Converged, outcar::converged),
        Capability::new(PropertyKey::TotalEnergy, outcar::total_energy),
        Capability::new(PropertyKey::BandGap, bandgap::band_gap),
        Capability::new(PropertyKey::Pressure, outcar::pressure),
        Capability::new(PropertyKey::Stresses, outcar::stresses),
        Capability::new(PropertyKey::DensityOfStates, dos::density_of_states),
        Capability::new(PropertyKey::Positions, outcar::positions),
        Capability::new(PropertyKey::Forces, outcar::forces),
        Capability::new(PropertyKey::TotalMagnetization, outcar::total_magnetization),
        Capability::new(PropertyKey::OutputFile, |calc| file_reference(calc, OUTCAR)),
        Capability::new(PropertyKey::XcFunctional, outcar::xc_functional),
        Capability::new(PropertyKey::Pseudopotentials, outcar::pseudopotentials),
        Capability::new(PropertyKey::Relaxed, outcar::relaxed),
        Capability::new(PropertyKey::CutoffEnergy, outcar::cutoff_energy),
        Capability::new(PropertyKey::KPointsPerReciprocalAtom, outcar::kpoints_per_reciprocal_atom),
        Capability::new(PropertyKey::SpinOrbitCoupling, outcar::spin_orbit_coupling),
        Capability::new(PropertyKey::HubbardU, outcar::hubbard_u),
        Capability::new(PropertyKey::VanDerWaals, outcar::van_der_waals),
        Capability::new(PropertyKey::InputParametersFile, |calc| file_reference(calc, INCAR)),
        Capability::new(PropertyKey::InputStructureFile, |calc| file_reference(calc, POSCAR)),
    ]);
    Backend::new(NAME, applies, version, table)
}

fn applies(dir: &Path) -> Result<bool> {
    let path = dir.join(OUTCAR);
    files::is_file(&path).map_err(|e| Error::io(path, e))
}

/// `vasp.5.4.4.18Apr17-6-g9f103f2a35 (build Mar 12 2018) complex` → `5.4.4.18Apr17-6-g9f103f2a35`
fn version(calc: &Calculation) -> std::result::Result<Option<String>, FieldError> {
    let line = calc.text(OUTCAR).first_with("vasp")?;
    Ok(line.as_deref().and_then(|l| token(l, 0)).map(|word| {
        word.trim_matches(|c| matches!(c, 'v' | 'a' | 's' | 'p' | '.'))
            .to_string()
    }))
}

fn file_reference(calc: &Calculation, name: &str) -> Extraction {
    if !calc.has_file(name)? {
        return Ok(Outcome::NotApplicable);
    }
    Ok(Property::files([calc.relative_path(name)]).into())
}

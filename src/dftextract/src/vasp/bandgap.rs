//! Band gap
//!
//! Two independent sources, tried in order:
//!
//! 1. `OUTCAR` + `EIGENVAL`: electron count from OUTCAR, band energies per
//!    k-point and spin channel from EIGENVAL.
//! 2. `DOSCAR`: distance between the occupied and unoccupied band edges
//!    around the Fermi level.
//!
//! Neither file set present means the gap is not applicable.

use super::dos::{self, DosRow};
use super::{DOSCAR, EIGENVAL, OUTCAR};
use crate::error::{Extraction, FieldError, Outcome};
use crate::files::Calculation;
use crate::property::Property;
use dftscan::vasp::{eigenval, outcar as rules};
use dftscan::Field;

/// Densities at or below this are treated as empty states
const DOS_THRESHOLD: f64 = 1e-3;

/// Gap of one spin channel
///
/// `kpoints` holds the band energies of every k-point, `electrons` the total
/// electron count. The highest occupied band is `floor(electrons / 2) - 1`.
/// Returns `None` if those bands are not present at every k-point or there
/// are no k-points at all. Never negative.
pub fn band_gap_from_bands(kpoints: &[&[f64]], electrons: f64) -> Option<f64> {
    let occupied = (electrons / 2.0).floor() as usize;
    if occupied == 0 || kpoints.is_empty() {
        return None;
    }

    let mut valence_max = f64::NEG_INFINITY;
    let mut conduction_min = f64::INFINITY;
    for bands in kpoints {
        valence_max = valence_max.max(*bands.get(occupied - 1)?);
        conduction_min = conduction_min.min(*bands.get(occupied)?);
    }
    Some((conduction_min - valence_max).max(0.0))
}

fn eigenvalue_gap(calc: &Calculation) -> Result<f64, FieldError> {
    let outcar = calc.text(OUTCAR);
    let lines = outcar.read_lines()?;
    let electrons = rules::parse(&lines)
        .into_iter()
        .find_map(|record| record.get(rules::NUMBER_OF_ELECTRONS).and_then(Field::as_f64))
        .ok_or_else(|| outcar.missing("NELECT"))?;

    let file = calc.text(EIGENVAL);
    let eig = eigenval::parse(file.read_lines()?)
        .map_err(|e| file.invalid(EIGENVAL, &e.to_string()))?;

    let mut gap = f64::INFINITY;
    for spin in 0..eig.spin_channels {
        let channel = band_gap_from_bands(&eig.channel(spin), electrons)
            .ok_or_else(|| {
                file.invalid("band count", &format!("{} bands for {electrons} electrons", eig.bands))
            })?;
        tracing::trace!(spin, gap = channel, "channel gap");
        gap = gap.min(channel);
    }
    Ok(gap)
}

/// Band-edge search over total DOS rows in ascending energy
///
/// The valence edge is the highest energy below the Fermi level with
/// occupied states, the conduction edge the first energy above it. The grid
/// step comes from the first two rows.
#[derive(Debug)]
struct EdgeScan {
    fermi: f64,
    first: Option<f64>,
    step: Option<f64>,
    bottom: Option<f64>,
    top: Option<f64>,
}

impl EdgeScan {
    fn new(fermi: f64) -> Self {
        Self {
            fermi,
            first: None,
            step: None,
            bottom: None,
            top: None,
        }
    }

    /// Feed one row; `true` once nothing further can change the gap
    fn push(&mut self, row: DosRow) -> bool {
        match self.first {
            None => self.first = Some(row.energy),
            Some(first) if self.step.is_none() => self.step = Some(row.energy - first),
            Some(_) => {}
        }

        if self.top.is_none() && row.density > DOS_THRESHOLD {
            if row.energy < self.fermi {
                self.bottom = Some(row.energy);
            } else if row.energy > self.fermi {
                self.top = Some(row.energy);
            }
        }
        self.top.is_some() && self.step.is_some()
    }

    /// Gaps narrower than two grid steps are reported as 0. `Err` names the
    /// edge (or grid) that could not be located.
    fn finish(self) -> Result<f64, &'static str> {
        let step = self.step.ok_or("energy grid")?;
        let bottom = self.bottom.ok_or("valence band edge")?;
        let top = self.top.ok_or("conduction band edge")?;
        if top - bottom < 2.0 * step {
            Ok(0.0)
        } else {
            Ok(top - bottom)
        }
    }
}

/// Rows past the conduction edge are never parsed
fn doscar_gap(calc: &Calculation) -> Result<f64, FieldError> {
    let file = calc.text(DOSCAR);
    let (fermi, rows) = dos::open(&file)?;

    let mut scan = EdgeScan::new(fermi);
    for row in rows {
        if scan.push(row?) {
            break;
        }
    }
    scan.finish().map_err(|edge| file.missing(edge))
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub(super) fn band_gap(calc: &Calculation) -> Extraction {
    let gap = if calc.has_file(OUTCAR)? && calc.has_file(EIGENVAL)? {
        eigenvalue_gap(calc)?
    } else if calc.has_file(DOSCAR)? {
        doscar_gap(calc)?
    } else {
        return Ok(Outcome::NotApplicable);
    };
    Ok(Property::scalar(round3(gap)).with_units("eV").into())
}

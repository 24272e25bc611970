//! OUTCAR extractors
//!
//! OUTCAR echoes every input tag once near the top and then repeats the
//! time-varying quantities (energy, pressure, stress, forces) for every ionic
//! step, so scalar settings come from the first matching line and results
//! from the last. Each helper below is its own pass over the file.
//!
//! # Format
//!
//! ```text
//!    ENCUT  =  520.0 eV  38.22 Ry    6.18 a.u.
//!    NSW    =      0    number of steps for IOM
//!    TITEL  = PAW_PBE Fe 06Sep2000
//!    LDAUL =     2   -1
//!   in kB       1.00     2.00     3.00     0.10     0.20     0.30
//!   external pressure =        2.00 kB  Pullay stress =        0.00 kB
//!  POSITION                                       TOTAL-FORCE (eV/Angst)
//!   free  energy   TOTEN  =       -15.54321000 eV
//! ```

use super::OUTCAR;
use crate::error::{Extraction, FieldError, Outcome};
use crate::files::{token, Calculation, TextFile};
use crate::property::{Condition, Property, Scalar, Value};
use dftscan::vasp::outcar as rules;
use std::str::FromStr;

const EDIFF_REACHED: &str = "aborting loop because EDIFF is reached";
const IONIC_REACHED: &str = "reached required accuracy";
const TOTEN: &str = "free  energy   TOTEN";
const EXTERNAL_PRESSURE: &str = "external pressure";
const STRESS_IN_KB: &str = "in kB";
const FORCE_HEADER: &str = "TOTAL-FORCE";
const KPOINT_WEIGHTS: &str = "Coordinates               Weight";
const GGA: &str = "GGA     =";

/// `GGA` tag codes of the non-local vdW functionals
const VDW_METHODS: &[(&str, &str)] = &[
    ("BO", "optPBE-vdW"),
    ("MK", "optB88-vdW"),
    ("ML", "optB86b-vdW"),
    ("RE", "vdW-DF"),
    ("OR", "Klimes-Bowler-Michaelides"),
];

fn outcar(calc: &Calculation) -> TextFile {
    calc.text(OUTCAR)
}

/// First token after the first `=` of `line`
fn value_after_eq(line: &str) -> Option<&str> {
    line.split_once('=')
        .and_then(|(_, rest)| rest.split_whitespace().next())
}

fn word<'a>(file: &TextFile, marker: &str, line: &'a str, index: isize) -> Result<&'a str, FieldError> {
    token(line, index).ok_or_else(|| file.invalid(marker, line.trim()))
}

fn number<T: FromStr>(file: &TextFile, marker: &str, raw: &str) -> Result<T, FieldError> {
    raw.parse().map_err(|_| file.invalid(marker, raw))
}

fn first_required(file: &TextFile, marker: &str) -> Result<String, FieldError> {
    file.first_with(marker)?.ok_or_else(|| file.missing(marker))
}

fn last_required(file: &TextFile, marker: &str) -> Result<String, FieldError> {
    file.last_with(marker)?.ok_or_else(|| file.missing(marker))
}

/// Number of ionic steps; 0 for a static run
fn nsw(file: &TextFile) -> Result<i64, FieldError> {
    let line = first_required(file, "NSW")?;
    number(file, "NSW", word(file, "NSW", &line, 2)?)
}

/// Stress/relaxation mode, `None` if never echoed
fn isif(file: &TextFile) -> Result<Option<i64>, FieldError> {
    match file.first_with("ISIF")? {
        Some(line) => {
            let raw = value_after_eq(&line).ok_or_else(|| file.invalid("ISIF", line.trim()))?;
            number(file, "ISIF", raw).map(Some)
        }
        None => Ok(None),
    }
}

pub(super) fn converged(calc: &Calculation) -> Extraction {
    let file = outcar(calc);
    let electronic = file.contains(EDIFF_REACHED)?;
    let ionic = if nsw(&file)? != 0 {
        file.contains(IONIC_REACHED)?
    } else {
        true
    };
    Ok(Property::scalar(electronic && ionic).into())
}

pub(super) fn total_energy(calc: &Calculation) -> Extraction {
    let file = outcar(calc);
    let line = last_required(&file, TOTEN)?;
    let raw = value_after_eq(&line).ok_or_else(|| file.invalid(TOTEN, line.trim()))?;
    let energy: f64 = number(&file, TOTEN, raw)?;
    Ok(Property::scalar(energy).with_units("eV").into())
}

pub(super) fn pressure(calc: &Calculation) -> Extraction {
    let file = outcar(calc);
    if isif(&file)? == Some(0) {
        return Ok(Outcome::NotApplicable);
    }

    let line = last_required(&file, EXTERNAL_PRESSURE)?;
    let value: f64 = number(&file, EXTERNAL_PRESSURE, word(&file, EXTERNAL_PRESSURE, &line, 3)?)?;
    let units = match word(&file, EXTERNAL_PRESSURE, &line, 4)? {
        "kB" => "kbar",
        other => other,
    };
    Ok(Property::scalar(value).with_units(units).into())
}

pub(super) fn stresses(calc: &Calculation) -> Extraction {
    let file = outcar(calc);
    if matches!(isif(&file)?, Some(0 | 1)) {
        return Ok(Outcome::NotApplicable);
    }

    let line = last_required(&file, STRESS_IN_KB)?;
    let mut components = [0.0; 6];
    for (i, slot) in components.iter_mut().enumerate() {
        *slot = number(&file, STRESS_IN_KB, word(&file, STRESS_IN_KB, &line, 2 + i as isize)?)?;
    }
    Ok(Property::new(stress_matrix(components)).with_units("kbar").into())
}

/// `[XX, YY, ZZ, XY, YZ, ZX]` → symmetric tensor
fn stress_matrix([xx, yy, zz, xy, yz, zx]: [f64; 6]) -> Value {
    Value::matrix([[xx, xy, zx], [xy, yy, yz], [zx, yz, zz]])
}

/// Rows of the last `POSITION … TOTAL-FORCE` block as `(position, force)`
fn force_block(file: &TextFile) -> Result<Vec<([f64; 3], [f64; 3])>, FieldError> {
    let lines = file.read_lines()?;
    let header = lines
        .iter()
        .rposition(|l| l.contains("POSITION") && l.contains(FORCE_HEADER))
        .ok_or_else(|| file.missing(FORCE_HEADER))?;

    let mut rows = Vec::new();
    // Header, dashed rule, atoms, dashed rule
    for line in lines.iter().skip(header + 2) {
        if line.trim_start().starts_with("---") || line.trim().is_empty() {
            break;
        }
        let values = line
            .split_whitespace()
            .map(|t| number::<f64>(file, FORCE_HEADER, t))
            .collect::<Result<Vec<_>, _>>()?;
        if values.len() < 6 {
            return Err(file.invalid(FORCE_HEADER, line.trim()));
        }
        rows.push((
            [values[0], values[1], values[2]],
            [values[3], values[4], values[5]],
        ));
    }

    if rows.is_empty() {
        return Err(file.missing(FORCE_HEADER));
    }
    Ok(rows)
}

fn positions_value(rows: &[([f64; 3], [f64; 3])]) -> Value {
    Value::matrix(rows.iter().map(|(position, _)| *position))
}

pub(super) fn positions(calc: &Calculation) -> Extraction {
    let rows = force_block(&outcar(calc))?;
    Ok(Property::new(positions_value(&rows))
        .with_units("Angstrom")
        .into())
}

pub(super) fn forces(calc: &Calculation) -> Extraction {
    let rows = force_block(&outcar(calc))?;
    Ok(
        Property::new(Value::matrix(rows.iter().map(|(_, force)| *force)))
            .with_units("eV/Angstrom")
            .with_condition(Condition::new("positions", positions_value(&rows)).with_units("Angstrom"))
            .into(),
    )
}

pub(super) fn total_magnetization(calc: &Calculation) -> Extraction {
    let lines = outcar(calc).read_lines()?;
    let last = rules::parse(&lines)
        .into_iter()
        .rev()
        .find_map(|record| record.get(rules::TOTAL_MAGNETIZATION).and_then(|f| f.as_f64()));

    Ok(last
        .map(|moment| Property::scalar(moment).with_units("Bohr"))
        .into())
}

pub(super) fn xc_functional(calc: &Calculation) -> Extraction {
    let file = outcar(calc);
    let line = first_required(&file, "TITEL")?;
    let functional = word(&file, "TITEL", &line, 2)?;
    Ok(Property::scalar(functional).into())
}

/// Species labels in POTCAR order
fn species(file: &TextFile) -> Result<Vec<String>, FieldError> {
    let names = file
        .all_with("TITEL")?
        .iter()
        .map(|line| word(file, "TITEL", line, 3).map(str::to_string))
        .collect::<Result<Vec<_>, _>>()?;
    if names.is_empty() {
        return Err(file.missing("TITEL"));
    }
    Ok(names)
}

pub(super) fn pseudopotentials(calc: &Calculation) -> Extraction {
    let names = species(&outcar(calc))?;
    Ok(Property::new(Value::vector(names)).into())
}

pub(super) fn cutoff_energy(calc: &Calculation) -> Extraction {
    let file = outcar(calc);
    let line = first_required(&file, "ENCUT")?;
    let cutoff: f64 = number(&file, "ENCUT", word(&file, "ENCUT", &line, 2)?)?;
    let units = word(&file, "ENCUT", &line, 3)?;
    Ok(Property::scalar(cutoff).with_units(units).into())
}

pub(super) fn relaxed(calc: &Calculation) -> Extraction {
    let relaxed = nsw(&outcar(calc))? != 0;
    Ok(relaxed.then(Property::flag).into())
}

pub(super) fn spin_orbit_coupling(calc: &Calculation) -> Extraction {
    let file = outcar(calc);
    let line = first_required(&file, "LSORBIT")?;
    let enabled = word(&file, "LSORBIT", &line, 2)? == "T";
    Ok(enabled.then(Property::flag).into())
}

pub(super) fn kpoints_per_reciprocal_atom(calc: &Calculation) -> Extraction {
    let file = outcar(calc);

    let line = first_required(&file, "NIONS")?;
    let ions: f64 = number(&file, "NIONS", word(&file, "NIONS", &line, 11)?)?;
    let line = first_required(&file, "NKPTS")?;
    let nkpts: usize = number(&file, "NKPTS", word(&file, "NKPTS", &line, 3)?)?;

    let kpoints = if file.contains("irreducible")? {
        summed_weights(&file, nkpts)?
    } else {
        nkpts as f64
    };
    Ok(Property::scalar(ions * kpoints).into())
}

/// Sum of the `nkpts` weights below each k-point listing; the last listing wins
fn summed_weights(file: &TextFile, nkpts: usize) -> Result<f64, FieldError> {
    let lines = file.read_lines()?;
    let mut total = None;

    for (i, line) in lines.iter().enumerate() {
        if !line.contains(KPOINT_WEIGHTS) {
            continue;
        }
        let mut sum = 0.0;
        for row in lines.iter().skip(i + 1).take(nkpts) {
            sum += number::<f64>(file, KPOINT_WEIGHTS, word(file, KPOINT_WEIGHTS, row, 3)?)?;
        }
        total = Some(sum);
    }

    total.ok_or_else(|| file.missing(KPOINT_WEIGHTS))
}

/// DFT+U settings
///
/// Four passes: species and `LDAUTYPE`, then `LDAUL`, `LDAUU` and `LDAUJ`.
/// The per-species values are the last `n` tokens of each line, `n` being
/// the number of species.
pub(super) fn hubbard_u(calc: &Calculation) -> Extraction {
    let file = outcar(calc);
    if !file.contains("LDAU")? {
        return Ok(Outcome::NotApplicable);
    }

    let species = species(&file)?;
    let kind = match file.last_with("LDAUTYPE")? {
        Some(line) => Some(number::<i64>(&file, "LDAUTYPE", word(&file, "LDAUTYPE", &line, -1)?)?),
        None => None,
    };

    let l_values: Vec<i64> = per_species(&file, "LDAUL", species.len())?;
    let u_values: Vec<f64> = per_species(&file, "LDAUU", species.len())?;
    let j_values: Vec<f64> = per_species(&file, "LDAUJ", species.len())?;

    let rows = l_values
        .into_iter()
        .zip(u_values)
        .zip(j_values)
        .map(|((l, u), j)| vec![Scalar::from(l), Scalar::from(u), Scalar::from(j)])
        .collect();

    let mut property = Property::new(Value::Matrix(rows))
        .with_units("eV")
        .with_condition(Condition::new("Species", Value::vector(species)));
    if let Some(kind) = kind {
        property = property.with_condition(Condition::new("Type", kind));
    }
    Ok(property.into())
}

fn per_species<T: FromStr>(file: &TextFile, marker: &str, count: usize) -> Result<Vec<T>, FieldError> {
    let line = last_required(file, marker)?;
    (0..count)
        .map(|i| {
            let offset = -((count - i) as isize);
            number(file, marker, word(file, marker, &line, offset)?)
        })
        .collect()
}

pub(super) fn van_der_waals(calc: &Calculation) -> Extraction {
    let file = outcar(calc);
    let enabled = match file.first_with("LUSE_VDW")? {
        Some(line) => value_after_eq(&line).is_some_and(|v| v.trim_start_matches('.').starts_with('T')),
        None => false,
    };
    if !enabled {
        return Ok(Outcome::NotApplicable);
    }

    let line = first_required(&file, GGA)?;
    let code = word(&file, GGA, &line, 2)?;
    let method = VDW_METHODS
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, name)| *name)
        .ok_or_else(|| file.invalid(GGA, code))?;
    Ok(Property::scalar(method).into())
}

//! Wien2k backend
//!
//! Wien2k names its outputs `<case>.<ext>`, so files are located by
//! extension: `.scf` (SCF summary), `.scf2` (band gap) and the optics
//! outputs `.absorp`, `.eloss`, `.epsilon`. When several files share an
//! extension the first by name is used.

mod optics;

use crate::backend::Backend;
use crate::capability::{Capability, CapabilityTable, PropertyKey};
use crate::error::{Error, Extraction, FieldError, Outcome, Result};
use crate::files::{self, Calculation, TextFile};
use crate::property::Property;
use dftscan::wien2k::{keys, scf, scf2};
use std::io;
use std::path::Path;

pub const NAME: &str = "Wien2k";

pub(crate) const SCF: &str = "scf";
pub(crate) const SCF2: &str = "scf2";

/// Lines only a Wien2k SCF summary contains
const SIGNATURES: [&str; 2] = ["using WIEN2k", ":ITE001:  1. ITERATION"];

/// The Wien2k backend descriptor
pub fn backend() -> Backend {
    let table = CapabilityTable::base()
        .merge([
            Capability::new(PropertyKey::TotalEnergy, total_energy),
            Capability::new(PropertyKey::BandGap, band_gap),
            Capability::new(PropertyKey::OutputFile, output_file),
            Capability::unsupported(PropertyKey::SpinOrbitCoupling),
            Capability::unsupported(PropertyKey::Relaxed),
            Capability::unsupported(PropertyKey::HubbardU),
            Capability::unsupported(PropertyKey::VanDerWaals),
            Capability::unsupported(PropertyKey::Pressure),
            Capability::unsupported(PropertyKey::Stresses),
            Capability::unsupported(PropertyKey::DensityOfStates),
        ])
        .merge(optics::SERIES.iter().map(|series| {
            Capability::new(PropertyKey::Other(series.name), move |calc| {
                optics::extract(calc, series)
            })
        }));
    Backend::new(NAME, applies, version, table)
}

fn applies(dir: &Path) -> Result<bool> {
    let scf = match files::list_with_extension(dir, SCF) {
        Ok(found) => found.into_iter().next(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(Error::io(dir, e)),
    };
    let Some(path) = scf else {
        return Ok(false);
    };

    match has_signature(&TextFile::new(path)) {
        Ok(found) => Ok(found),
        Err(e) => e.into_io().map_or(Ok(false), Err),
    }
}

fn has_signature(file: &TextFile) -> std::result::Result<bool, FieldError> {
    for line in file.lines()? {
        let line = line?;
        if SIGNATURES.iter().any(|s| line.contains(s)) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn find(calc: &Calculation, ext: &str) -> std::result::Result<Option<TextFile>, FieldError> {
    Ok(calc.find_by_extension(ext)?.map(TextFile::new))
}

/// `:LABEL3: using WIEN2k_14.2 (Release 15/10/2014)` → `14.2`
fn version(calc: &Calculation) -> std::result::Result<Option<String>, FieldError> {
    let Some(file) = find(calc, SCF)? else {
        return Ok(None);
    };
    let line = file
        .first_with(":LABEL3:")?
        .ok_or_else(|| file.missing(":LABEL3:"))?;

    let record = scf::rules().parse_line(&line);
    let label = record
        .get(keys::VERSION)
        .and_then(|f| f.as_str())
        .ok_or_else(|| file.invalid(":LABEL3:", line.trim()))?;
    Ok(Some(label.strip_prefix("WIEN2k_").unwrap_or(label).to_string()))
}

fn total_energy(calc: &Calculation) -> Extraction {
    let Some(file) = find(calc, SCF)? else {
        return Ok(Outcome::NotApplicable);
    };

    let last = scf::parse(file.read_lines()?)
        .into_iter()
        .rev()
        .find(|record| record.contains_key(keys::TOTAL_ENERGY))
        .ok_or_else(|| file.missing(":ENE"))?;

    let energy = last[keys::TOTAL_ENERGY]
        .as_f64()
        .ok_or_else(|| file.invalid(":ENE", "non-numeric energy"))?;
    let mut property = Property::scalar(energy);
    if let Some(units) = last.get(keys::TOTAL_ENERGY_UNITS).and_then(|f| f.as_str()) {
        property = property.with_units(units);
    }
    Ok(property.into())
}

/// Last `:GAP` record of `.scf2`; metals report none
fn band_gap(calc: &Calculation) -> Extraction {
    let Some(file) = find(calc, SCF2)? else {
        return Ok(Outcome::NotApplicable);
    };

    let last = scf2::parse(file.read_lines()?)
        .into_iter()
        .rev()
        .find(|record| record.contains_key(keys::BAND_GAP));
    let Some(record) = last else {
        return Ok(Outcome::NotApplicable);
    };

    let gap = record[keys::BAND_GAP]
        .as_f64()
        .ok_or_else(|| file.invalid(":GAP", "non-numeric gap"))?;
    let mut property = Property::scalar(gap);
    if let Some(units) = record.get(keys::BAND_GAP_UNITS).and_then(|f| f.as_str()) {
        property = property.with_units(units);
    }
    Ok(property.into())
}

fn output_file(calc: &Calculation) -> Extraction {
    let Some(path) = calc.find_by_extension(SCF)? else {
        return Ok(Outcome::NotApplicable);
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Property::files([calc.relative_path(&name)]).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{extract, Omission};
    use std::fs;
    use tempfile::TempDir;

    const SCF_TEXT: &str = "\
:LABEL1: Mon Oct  6 12:00:00 2014
:LABEL3: using WIEN2k_14.2 (Release 15/10/2014) in /opt/wien2k
:ITE001:  1. ITERATION
:ENE  : ********** TOTAL ENERGY IN Ry =        -2541.43216540
:ITE002:  2. ITERATION
:ENE  : ********** TOTAL ENERGY IN Ry =        -2541.43300000
";

    const SCF2_TEXT: &str = "\
:GAP  :    0.0500 Ry =     0.680 eV   (provisional)
:GAP  :    0.0472 Ry =     0.642 eV   (provisional)
";

    fn run_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            fs::write(temp_dir.path().join(name), contents).unwrap();
        }
        temp_dir
    }

    #[test]
    fn test_applies() {
        let dir = run_dir(&[("TiO2.scf", SCF_TEXT)]);
        assert!(applies(dir.path()).unwrap());

        let dir = run_dir(&[("TiO2.scf", ":ITE001:  1. ITERATION\n")]);
        assert!(applies(dir.path()).unwrap());

        let dir = run_dir(&[("TiO2.scf", "no signature\n"), ("TiO2.scf2", SCF2_TEXT)]);
        assert!(!applies(dir.path()).unwrap());

        let dir = run_dir(&[]);
        assert!(!applies(dir.path()).unwrap());
        assert!(!applies(&dir.path().join("gone")).unwrap());
    }

    #[test]
    fn test_only_first_scf_is_checked() {
        let dir = run_dir(&[("a.scf", "plain text\n"), ("b.scf", SCF_TEXT)]);
        assert!(!applies(dir.path()).unwrap());
    }

    #[test]
    fn test_version() {
        let dir = run_dir(&[("TiO2.scf", SCF_TEXT)]);
        let calc = Calculation::new(dir.path());
        assert_eq!(version(&calc).unwrap().as_deref(), Some("14.2"));

        let dir = run_dir(&[]);
        assert_eq!(version(&Calculation::new(dir.path())).unwrap(), None);
    }

    #[test]
    fn test_version_label_missing() {
        let dir = run_dir(&[("TiO2.scf", ":ITE001:  1. ITERATION\n")]);
        let err = version(&Calculation::new(dir.path())).unwrap_err();
        assert!(matches!(err, FieldError::MissingField { marker, .. } if marker == ":LABEL3:"));

        // Extraction goes on without a version
        let result = extract(dir.path(), &backend()).unwrap();
        assert_eq!(result.version(), None);
        assert!(result.get("Output File").is_some());
    }

    #[test]
    fn test_scf_properties() {
        let dir = run_dir(&[("TiO2.scf", SCF_TEXT), ("TiO2.scf2", SCF2_TEXT)]);
        let result = extract(dir.path(), &backend()).unwrap();

        assert_eq!(result.backend(), NAME);
        assert_eq!(result.version(), Some("14.2"));

        let energy = result.get("Total Energy").unwrap();
        assert_eq!(energy.as_f64(), Some(-2541.433));
        assert_eq!(energy.units(), Some("Ry"));

        let gap = result.get("Band Gap Energy").unwrap();
        assert_eq!(gap.as_f64(), Some(0.642));
        assert_eq!(gap.units(), Some("eV"));

        let output = result.get("Output File").unwrap();
        assert!(output.value().as_files().unwrap()[0]
            .relative_path
            .ends_with("TiO2.scf"));
    }

    #[test]
    fn test_missing_energy_record() {
        let dir = run_dir(&[("TiO2.scf", ":ITE001:  1. ITERATION\n")]);
        let result = extract(dir.path(), &backend()).unwrap();
        match result.omission("Total Energy") {
            Some(Omission::Failed { reason }) => assert!(reason.contains(":ENE")),
            other => panic!("unexpected {other:?}"),
        }
        // No .scf2: band gap is simply absent
        assert_eq!(result.omission("Band Gap Energy"), Some(&Omission::NotApplicable));
        assert!(result.get("Output File").is_some());
    }

    #[test]
    fn test_unsupported_entries_never_fail() {
        // Even with VASP-looking content next to the .scf file
        let dir = run_dir(&[
            ("TiO2.scf", SCF_TEXT),
            ("OUTCAR", "   ISIF   =      3\n  in kB  garbage\n"),
            ("DOSCAR", "truncated"),
        ]);
        let result = extract(dir.path(), &backend()).unwrap();
        for name in [
            "Spin-Orbit Coupling",
            "Relaxed",
            "DFT+U",
            "vdW Interactions",
            "Pressure",
            "Stresses",
            "Density of States",
            "Positions",
        ] {
            assert_eq!(result.omission(name), Some(&Omission::NotApplicable), "{name}");
        }
    }

    #[test]
    fn test_table_layout() {
        let backend = backend();
        let names: Vec<_> = backend.capabilities().names().collect();
        assert_eq!(names.len(), PropertyKey::BASE.len() + optics::SERIES.len());
        assert_eq!(names[1], "Total Energy");
        assert_eq!(names[PropertyKey::BASE.len()], "Optical conductivity xx (Re $\\sigma_{xx}$)");
        assert!(!backend
            .capabilities()
            .get("Stresses")
            .unwrap()
            .extractor
            .is_supported());
    }
}

//! DOSCAR reader
//!
//! # Format
//!
//! ```text
//!     2    2    1    0               <- five free-form header lines
//!   ...
//!      10.000  -10.000   301   5.1234   1.000   <- Emax, Emin, NEDOS, EFERMI, weight
//!   -10.000   0.0000   0.0000   0.0000   0.0000   <- E, DOS (per spin), integrated DOS (per spin)
//! ```
//!
//! Only the total DOS block (the first NEDOS rows) is read. A row holds the
//! energy followed by the densities and then the integrated densities, one
//! column per spin channel, so the density is the sum of the first half of
//! the remaining columns.

use super::DOSCAR;
use crate::error::{Extraction, FieldError, Outcome};
use crate::files::{token, Calculation, Lines, TextFile};
use crate::property::{Condition, Property, Value};

const HEADER_LINES: usize = 6;

/// One row of the total DOS
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct DosRow {
    pub energy: f64,
    pub density: f64,
}

#[derive(Debug, Clone)]
pub(super) struct Doscar {
    pub fermi: f64,
    pub rows: Vec<DosRow>,
}

impl Doscar {
    /// Whole total-DOS table; any bad or missing row fails the read
    pub fn read(file: &TextFile) -> Result<Self, FieldError> {
        let (fermi, rows) = open(file)?;
        let rows = rows.collect::<Result<Vec<_>, _>>()?;

        tracing::trace!(nedos = rows.len(), fermi, "read DOSCAR");
        Ok(Self { fermi, rows })
    }
}

/// Lazily parsed total-DOS rows; a row is only read when asked for
pub(super) struct DosRows<'a> {
    file: &'a TextFile,
    lines: Lines,
    remaining: usize,
}

impl Iterator for DosRows<'_> {
    type Item = Result<DosRow, FieldError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let line = next_line(&mut self.lines, self.file, "NEDOS");
        Some(line.and_then(|line| parse_row(self.file, &line)))
    }
}

/// Read the header and return the Fermi level with the row stream
pub(super) fn open(file: &TextFile) -> Result<(f64, DosRows<'_>), FieldError> {
    let mut lines = file.lines()?;

    let mut header = String::new();
    for _ in 0..HEADER_LINES {
        header = next_line(&mut lines, file, "DOSCAR header")?;
    }
    let nedos: usize = parse(file, "NEDOS", token(&header, 2))?;
    let fermi: f64 = parse(file, "EFERMI", token(&header, 3))?;

    Ok((
        fermi,
        DosRows {
            file,
            lines,
            remaining: nedos,
        },
    ))
}

fn next_line(lines: &mut Lines, file: &TextFile, what: &str) -> Result<String, FieldError> {
    lines.next().transpose()?.ok_or_else(|| file.missing(what))
}

fn parse<T: std::str::FromStr>(file: &TextFile, marker: &str, raw: Option<&str>) -> Result<T, FieldError> {
    let raw = raw.ok_or_else(|| file.missing(marker))?;
    raw.parse().map_err(|_| file.invalid(marker, raw))
}

fn parse_row(file: &TextFile, line: &str) -> Result<DosRow, FieldError> {
    let values = line
        .split_whitespace()
        .map(|t| t.parse::<f64>().map_err(|_| file.invalid("DOS row", t)))
        .collect::<Result<Vec<_>, _>>()?;

    let (energy, rest) = values
        .split_first()
        .ok_or_else(|| file.invalid("DOS row", line))?;
    let density = rest[..rest.len() / 2].iter().sum();
    Ok(DosRow {
        energy: *energy,
        density,
    })
}

pub(super) fn density_of_states(calc: &Calculation) -> Extraction {
    if !calc.has_file(DOSCAR)? {
        return Ok(Outcome::NotApplicable);
    }

    let doscar = Doscar::read(&calc.text(DOSCAR))?;
    let energies = doscar.rows.iter().map(|r| r.energy);
    let densities = doscar.rows.iter().map(|r| r.density);

    Ok(Property::new(Value::vector(densities))
        .with_units("number of states per unit cell")
        .with_condition(Condition::new("energy", Value::vector(energies)).with_units("eV"))
        .into())
}


#[cfg(test)]
mod tests {
    use super::super::testing::run_dir;
    use super::fixtures::doscar;
    use super::*;

    #[test]
    fn test_read_header_and_rows() {
        let dir = run_dir(&[(DOSCAR, &doscar(0.5, &[(-1.0, 0.0), (0.0, 2.0), (1.0, 3.0)]))]);
        let parsed = Doscar::read(&Calculation::new(dir.path()).text(DOSCAR)).unwrap();
        assert_eq!(parsed.fermi, 0.5);
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[2], DosRow { energy: 1.0, density: 3.0 });
    }

    #[test]
    fn test_spin_channels_are_summed() {
        let file = TextFile::new("DOSCAR");
        let row = parse_row(&file, "  -2.000  0.2500E+00  0.7500E+00  1.0E+00  2.0E+00").unwrap();
        assert_eq!(row.energy, -2.0);
        assert_eq!(row.density, 1.0);
    }

    #[test]
    fn test_only_total_block_is_read() {
        let mut text = doscar(0.0, &[(-1.0, 1.0), (1.0, 1.0)]);
        // A projected block follows the total DOS
        text.push_str("  1.000  -1.000  2  0.0  1.0\n  -1.000  9.0  9.0  9.0\n");
        let dir = run_dir(&[(DOSCAR, &text)]);
        let parsed = Doscar::read(&Calculation::new(dir.path()).text(DOSCAR)).unwrap();
        assert_eq!(parsed.rows.len(), 2);
    }

    #[test]
    fn test_truncated_table() {
        let text = doscar(0.0, &[(-1.0, 1.0), (1.0, 1.0)]).replace("  2  0.0", "  5  0.0");
        let dir = run_dir(&[(DOSCAR, &text)]);
        let err = Doscar::read(&Calculation::new(dir.path()).text(DOSCAR)).unwrap_err();
        assert!(matches!(err, FieldError::MissingField { marker, .. } if marker == "NEDOS"));
    }

    #[test]
    fn test_rows_are_parsed_on_demand() {
        let text = doscar(0.0, &[(-1.0, 1.0), (1.0, 1.0)])
            .replace("  1.000  1.0000E0", "  1.000  ********");
        let dir = run_dir(&[(DOSCAR, &text)]);
        let file = Calculation::new(dir.path()).text(DOSCAR);

        let (fermi, mut rows) = open(&file).unwrap();
        assert_eq!(fermi, 0.0);
        assert_eq!(rows.next().unwrap().unwrap().energy, -1.0);
        assert!(matches!(rows.next(), Some(Err(FieldError::InvalidValue { .. }))));
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_density_of_states_property() {
        let dir = run_dir(&[(DOSCAR, &doscar(0.0, &[(-1.0, 0.5), (0.0, 0.0), (1.0, 1.5)]))]);
        let calc = Calculation::new(dir.path());
        let dos = match density_of_states(&calc).unwrap() {
            Outcome::Found(p) => p,
            Outcome::NotApplicable => panic!("expected DOS"),
        };
        assert_eq!(dos.units(), Some("number of states per unit cell"));
        assert_eq!(dos.value().to_f64_vector(), Some(vec![0.5, 0.0, 1.5]));

        let energy = dos.condition("energy").unwrap();
        assert_eq!(energy.units.as_deref(), Some("eV"));
        assert_eq!(energy.value.to_f64_vector(), Some(vec![-1.0, 0.0, 1.0]));
    }

    #[test]
    fn test_no_doscar() {
        let dir = run_dir(&[]);
        let calc = Calculation::new(dir.path());
        assert_eq!(density_of_states(&calc).unwrap(), Outcome::NotApplicable);
    }
}

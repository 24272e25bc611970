//! EIGENVAL block parser
//!
//! # Layout
//!
//! ```text
//!     2    2    1    2          <- ions, ions, blocks, ISPIN
//!   (four free-form header lines)
//!     16    47     12          <- electrons, k-points, bands
//!
//!   0.0000000E+00  0.0000000E+00  0.0000000E+00  0.1234568E-01
//!     1      -6.3   -6.2   1.0   1.0      <- band, energy per spin, [occupations]
//!   ...
//! ```
//!
//! Each k-point block starts with its reduced coordinates and weight and is
//! followed by one line per band.

use crate::rules::float;
use crate::{Error, Result};

/// One k-point block
#[derive(Debug, Clone, PartialEq)]
pub struct KPoint {
    pub coords: [f64; 3],
    pub weight: f64,
    /// Band energies indexed `[spin][band]`
    pub energies: Vec<Vec<f64>>,
}

/// Parsed EIGENVAL contents
#[derive(Debug, Clone, PartialEq)]
pub struct Eigenval {
    pub spin_channels: usize,
    pub electrons: f64,
    pub bands: usize,
    pub kpoints: Vec<KPoint>,
}

impl Eigenval {
    /// Energies of every k-point for one spin channel, `[kpoint][band]`
    pub fn channel(&self, spin: usize) -> Vec<&[f64]> {
        self.kpoints
            .iter()
            .filter_map(|k| k.energies.get(spin).map(Vec::as_slice))
            .collect()
    }
}

const HEADER_LINES: usize = 6;

fn malformed(line: usize, reason: impl Into<String>) -> Error {
    Error::Malformed {
        line,
        reason: reason.into(),
    }
}

fn floats(tokens: &[&str], line: usize) -> Result<Vec<f64>> {
    tokens
        .iter()
        .map(|t| float(t).ok_or_else(|| malformed(line, format!("not a number: {t}"))))
        .collect()
}

/// Parse EIGENVAL lines
pub fn parse<I, S>(lines: I) -> Result<Eigenval>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<S> = lines.into_iter().collect();
    if lines.len() < HEADER_LINES {
        return Err(Error::UnexpectedEof("EIGENVAL header"));
    }

    let first: Vec<&str> = lines[0].as_ref().split_whitespace().collect();
    let spin_channels: usize = first
        .get(3)
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| malformed(1, "missing ISPIN"))?;
    if !(1..=2).contains(&spin_channels) {
        return Err(malformed(1, format!("unsupported ISPIN {spin_channels}")));
    }

    let counts: Vec<&str> = lines[5].as_ref().split_whitespace().collect();
    if counts.len() < 3 {
        return Err(malformed(6, "expected electrons, k-points and bands"));
    }
    let electrons = float(counts[0]).ok_or_else(|| malformed(6, "bad electron count"))?;
    let nkpts: usize = counts[1]
        .parse()
        .map_err(|_| malformed(6, "bad k-point count"))?;
    let bands: usize = counts[2]
        .parse()
        .map_err(|_| malformed(6, "bad band count"))?;

    let mut rows = lines
        .iter()
        .enumerate()
        .skip(HEADER_LINES)
        .map(|(i, l)| (i + 1, l.as_ref()))
        .filter(|(_, l)| !l.trim().is_empty());

    let mut kpoints = Vec::with_capacity(nkpts);
    for _ in 0..nkpts {
        let (number, line) = rows.next().ok_or(Error::UnexpectedEof("k-point header"))?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(malformed(number, "expected k-point coordinates and weight"));
        }
        let head = floats(&tokens[..4], number)?;

        let mut energies = vec![Vec::with_capacity(bands); spin_channels];
        for _ in 0..bands {
            let (number, line) = rows.next().ok_or(Error::UnexpectedEof("band energies"))?;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 1 + spin_channels {
                return Err(malformed(number, "expected band index and energies"));
            }
            let values = floats(&tokens[1..1 + spin_channels], number)?;
            for (channel, value) in energies.iter_mut().zip(values) {
                channel.push(value);
            }
        }

        kpoints.push(KPoint {
            coords: [head[0], head[1], head[2]],
            weight: head[3],
            energies,
        });
    }

    Ok(Eigenval {
        spin_channels,
        electrons,
        bands,
        kpoints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPIN_POLARIZED: &str = "\
    2    2    1    2
  0.1E+02  0.1E-09  0.1E-09  0.1E-09  0.5E-15
  1.0E-004
  CAR
 unknown system
     4     2      3

  0.0000000E+00  0.0000000E+00  0.0000000E+00  0.5000000E+00
    1       -5.0000   -4.8000   1.0000   1.0000
    2       -1.0000   -0.9000   1.0000   1.0000
    3        1.0000    1.5000   0.0000   0.0000

  0.5000000E+00  0.0000000E+00  0.0000000E+00  0.5000000E+00
    1       -4.5000   -4.4000   1.0000   1.0000
    2       -0.5000   -0.7000   1.0000   1.0000
    3        2.0000    0.8000   0.0000   0.0000
";

    #[test]
    fn test_parse_spin_polarized() -> anyhow::Result<()> {
        let eig = parse(SPIN_POLARIZED.lines())?;
        assert_eq!(eig.spin_channels, 2);
        assert_eq!(eig.electrons, 4.0);
        assert_eq!(eig.bands, 3);
        assert_eq!(eig.kpoints.len(), 2);
        assert_eq!(eig.kpoints[1].coords, [0.5, 0.0, 0.0]);
        assert_eq!(eig.kpoints[0].weight, 0.5);
        assert_eq!(eig.kpoints[0].energies[0], vec![-5.0, -1.0, 1.0]);
        assert_eq!(eig.kpoints[1].energies[1], vec![-4.4, -0.7, 0.8]);
        Ok(())
    }

    #[test]
    fn test_channel_view() {
        let eig = parse(SPIN_POLARIZED.lines()).unwrap();
        let down = eig.channel(1);
        assert_eq!(down.len(), 2);
        assert_eq!(down[0][2], 1.5);
        assert!(eig.channel(2).is_empty());
    }

    #[test]
    fn test_parse_non_polarized_without_occupations() {
        let text = "    1    1    1    1\nx\nx\nCAR\nsys\n  2  1  2\n\n  0 0 0 1.0\n 1 -3.0\n 2 0.5\n";
        let eig = parse(text.lines()).unwrap();
        assert_eq!(eig.spin_channels, 1);
        assert_eq!(eig.kpoints[0].energies, vec![vec![-3.0, 0.5]]);
    }

    #[test]
    fn test_truncated_file() {
        let text = "    1    1    1    1\nx\nx\nCAR\nsys\n  2  1  2\n\n  0 0 0 1.0\n 1 -3.0\n";
        assert_eq!(
            parse(text.lines()).unwrap_err(),
            Error::UnexpectedEof("band energies")
        );
    }

    #[test]
    fn test_short_header() {
        assert_eq!(
            parse(["1 1 1 1"]).unwrap_err(),
            Error::UnexpectedEof("EIGENVAL header")
        );
    }

    #[test]
    fn test_bad_energy_token() {
        let text = "    1    1    1    1\nx\nx\nCAR\nsys\n  2  1  1\n\n  0 0 0 1.0\n 1 abc\n";
        assert!(matches!(
            parse(text.lines()).unwrap_err(),
            Error::Malformed { line: 9, .. }
        ));
    }
}

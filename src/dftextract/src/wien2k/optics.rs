//! Optical spectra from the Wien2k OPTIC package
//!
//! Each series is one column of `.absorp`, `.eloss` or `.epsilon` reported
//! as a vector, with the photon energy column converted into the matching
//! axis and attached as a condition.

use crate::error::{Extraction, Outcome};
use crate::files::{Calculation, TextFile};
use crate::property::{Condition, Property, Value};
use dftscan::wien2k::{absorp, eloss, epsilon, keys};
use dftscan::{transpose, Field, Record};

/// eV → Hz
const HZ_PER_EV: f64 = 2.418e14;
/// Divisor applied to photon energies (eV) for the wavelength axis
const WAVELENGTH_DIVISOR: f64 = 1240.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Axis {
    /// `Wavelength`, nm
    Wavelength,
    /// `Frequency`, Hz
    Frequency,
}

impl Axis {
    fn condition(self, energies: &[f64]) -> Condition {
        match self {
            Self::Wavelength => Condition::new(
                "Wavelength",
                Value::vector(energies.iter().map(|e| e / WAVELENGTH_DIVISOR)),
            )
            .with_units("nm"),
            Self::Frequency => Condition::new(
                "Frequency",
                Value::vector(energies.iter().map(|e| e * HZ_PER_EV)),
            )
            .with_units("Hz"),
        }
    }
}

/// Scanner for one optics file kind
type Scan = fn(Vec<String>) -> Vec<Record>;

/// One reported spectrum
#[derive(Debug)]
pub(super) struct Series {
    pub name: &'static str,
    pub extension: &'static str,
    pub scan: Scan,
    pub column: &'static str,
    pub units: Option<&'static str>,
    pub axis: Axis,
}

const CONDUCTIVITY: Option<&str> = Some("1/(Ohm.cm)");
const ABSORPTION: Option<&str> = Some("10$^{4}$/cm");

pub(super) static SERIES: &[Series] = &[
    Series {
        name: r"Optical conductivity xx (Re $\sigma_{xx}$)",
        extension: "absorp",
        scan: absorp::parse,
        column: "re_sigma_xx",
        units: CONDUCTIVITY,
        axis: Axis::Wavelength,
    },
    Series {
        name: r"Optical conductivity zz (Re $\sigma_{zz}$)",
        extension: "absorp",
        scan: absorp::parse,
        column: "re_sigma_zz",
        units: CONDUCTIVITY,
        axis: Axis::Wavelength,
    },
    Series {
        name: r"Absorption xx ($\alpha_{xx}$)",
        extension: "absorp",
        scan: absorp::parse,
        column: "absorp_xx",
        units: ABSORPTION,
        axis: Axis::Wavelength,
    },
    Series {
        name: r"Absorption zz ($\alpha_{zz}$)",
        extension: "absorp",
        scan: absorp::parse,
        column: "absorp_zz",
        units: ABSORPTION,
        axis: Axis::Wavelength,
    },
    Series {
        name: "eloss$_{xx}$",
        extension: "eloss",
        scan: eloss::parse,
        column: "eloss_xx",
        units: None,
        axis: Axis::Wavelength,
    },
    Series {
        name: "eloss$_{zz}$",
        extension: "eloss",
        scan: eloss::parse,
        column: "eloss_zz",
        units: None,
        axis: Axis::Wavelength,
    },
    Series {
        name: r"Re $\varepsilon_{xx}$",
        extension: "epsilon",
        scan: epsilon::parse,
        column: "re_eps_xx",
        units: None,
        axis: Axis::Frequency,
    },
    Series {
        name: r"Im $\varepsilon_{xx}$",
        extension: "epsilon",
        scan: epsilon::parse,
        column: "im_eps_xx",
        units: None,
        axis: Axis::Frequency,
    },
    Series {
        name: r"Re $\varepsilon_{zz}$",
        extension: "epsilon",
        scan: epsilon::parse,
        column: "re_eps_zz",
        units: None,
        axis: Axis::Frequency,
    },
    Series {
        name: r"Im $\varepsilon_{zz}$",
        extension: "epsilon",
        scan: epsilon::parse,
        column: "im_eps_zz",
        units: None,
        axis: Axis::Frequency,
    },
];

fn floats(column: &[Field]) -> Vec<f64> {
    column.iter().filter_map(Field::as_f64).collect()
}

pub(super) fn extract(calc: &Calculation, series: &Series) -> Extraction {
    let Some(path) = calc.find_by_extension(series.extension)? else {
        return Ok(Outcome::NotApplicable);
    };
    let file = TextFile::new(path);

    let records = (series.scan)(file.read_lines()?);
    if records.is_empty() {
        return Err(file.missing(keys::ENERGY));
    }

    let mut columns = transpose(&records);
    let energies = floats(&columns.remove(keys::ENERGY).unwrap_or_default());
    let values = floats(&columns.remove(series.column).unwrap_or_default());

    let mut property =
        Property::new(Value::vector(values)).with_condition(series.axis.condition(&energies));
    if let Some(units) = series.units {
        property = property.with_units(units);
    }
    Ok(property.into())
}

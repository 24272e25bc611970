//! Extraction driver
//!
//! Runs every capability entry of a backend against one directory and
//! collects the outcome. The driver has no domain knowledge: it only sorts
//! outcomes into found / omitted, and isolates property-level failures so one
//! bad field never costs the others.

use crate::backend::Backend;
use crate::config::Config;
use crate::error::{Outcome, Result};
use crate::files::Calculation;
use crate::property::Property;
use crate::registry::Registry;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Raised by the caller to stop a running extraction
pub type CancelFlag = AtomicBool;

/// Why a capability entry produced no property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Omission {
    /// The property has no meaning for this run
    NotApplicable,
    /// Not attempted (configured skip or cancellation)
    Skipped,
    /// Attempted and failed; the file did not hold what it should
    Failed { reason: String },
}

/// Per-directory output of the driver
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    directory: PathBuf,
    backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    properties: IndexMap<String, Property>,
    omissions: IndexMap<String, Omission>,
}

impl ExtractionResult {
    fn new(directory: &Path, backend: &'static str, version: Option<String>) -> Self {
        Self {
            directory: directory.to_path_buf(),
            backend,
            version,
            properties: IndexMap::new(),
            omissions: IndexMap::new(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Version string reported by the code, when found
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Extracted properties in capability order
    pub fn properties(&self) -> &IndexMap<String, Property> {
        &self.properties
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn omissions(&self) -> &IndexMap<String, Omission> {
        &self.omissions
    }

    pub fn omission(&self, name: &str) -> Option<&Omission> {
        self.omissions.get(name)
    }

    /// Entries that were attempted and failed
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.omissions.iter().filter_map(|(name, o)| match o {
            Omission::Failed { reason } => Some((name.as_str(), reason.as_str())),
            _ => None,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Extract with default settings
pub fn extract(dir: &Path, backend: &Backend) -> Result<ExtractionResult> {
    extract_with(dir, backend, &Config::default(), None)
}

/// Run every capability entry of `backend` against `dir`
///
/// Property-level failures are recorded in the result; only I/O failures
/// abort the directory. Once `cancel` is raised the remaining entries are
/// recorded as skipped.
pub fn extract_with(
    dir: &Path,
    backend: &Backend,
    config: &Config,
    cancel: Option<&CancelFlag>,
) -> Result<ExtractionResult> {
    let span = tracing::info_span!("extract", backend = backend.name(), directory = %dir.display());
    let _guard = span.enter();

    let calc = Calculation::new(dir);
    let version = match backend.version(&calc) {
        Ok(version) => version,
        Err(e) => match e.into_io() {
            Ok(fatal) => return Err(fatal),
            Err(e) => {
                tracing::warn!(error = %e, "could not read code version");
                None
            }
        },
    };

    let mut result = ExtractionResult::new(dir, backend.name(), version);

    for entry in backend.capabilities() {
        let name = entry.name();

        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) || config.is_skipped(name) {
            tracing::debug!(property = name, "skipped");
            result.omissions.insert(name.to_string(), Omission::Skipped);
            continue;
        }

        match entry.extractor.run(&calc) {
            Ok(Outcome::Found(property)) => {
                tracing::debug!(property = name, "found");
                result
                    .properties
                    .insert(name.to_string(), property.named(name));
            }
            Ok(Outcome::NotApplicable) => {
                tracing::debug!(property = name, "not applicable");
                result
                    .omissions
                    .insert(name.to_string(), Omission::NotApplicable);
            }
            Err(e) => match e.into_io() {
                Ok(fatal) => return Err(fatal),
                Err(e) => {
                    tracing::warn!(property = name, error = %e, "extraction failed");
                    result.omissions.insert(
                        name.to_string(),
                        Omission::Failed {
                            reason: e.to_string(),
                        },
                    );
                }
            },
        }
    }

    tracing::info!(
        found = result.properties.len(),
        omitted = result.omissions.len(),
        "extraction finished"
    );
    Ok(result)
}

/// Detect the backend with the standard registry, then extract
pub fn process(dir: &Path) -> Result<ExtractionResult> {
    process_with(dir, Registry::global(), &Config::default(), None)
}

pub fn process_with(
    dir: &Path,
    registry: &Registry,
    config: &Config,
    cancel: Option<&CancelFlag>,
) -> Result<ExtractionResult> {
    let backend = registry.detect_with(dir, config.ambiguity)?;
    extract_with(dir, backend, config, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, CapabilityTable, PropertyKey};
    use crate::error::{Error, FieldError};
    use crate::property::Property;

    fn test_backend() -> Backend {
        let table = CapabilityTable::base().merge([
            Capability::new(PropertyKey::TotalEnergy, |_| {
                Ok(Property::scalar(-1.0).with_units("eV").into())
            }),
            Capability::new(PropertyKey::Pressure, |_| {
                Err(FieldError::missing("OUTCAR", "external pressure"))
            }),
            Capability::new(PropertyKey::Stresses, |_| Ok(Outcome::NotApplicable)),
            Capability::new(PropertyKey::Other("Extra"), |_| Ok(Property::scalar(7_i64).into())),
        ]);
        Backend::new("Test", |_| Ok(true), |_| Ok(Some("9.9".into())), table)
    }

    #[test]
    fn test_failure_is_isolated() {
        let result = extract(Path::new("/anywhere"), &test_backend()).unwrap();

        assert_eq!(result.backend(), "Test");
        assert_eq!(result.version(), Some("9.9"));

        let energy = result.get("Total Energy").unwrap();
        assert_eq!(energy.name(), "Total Energy");
        assert_eq!(energy.as_f64(), Some(-1.0));
        assert!(result.get("Extra").is_some());

        match result.omission("Pressure").unwrap() {
            Omission::Failed { reason } => assert!(reason.contains("external pressure")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(result.omission("Stresses"), Some(&Omission::NotApplicable));
        // Base entries the backend never implemented are not applicable too
        assert_eq!(result.omission("DFT+U"), Some(&Omission::NotApplicable));
        assert!(!result.is_complete());
        assert_eq!(result.failures().count(), 1);
    }

    #[test]
    fn test_every_entry_accounted_for() {
        let backend = test_backend();
        let result = extract(Path::new("/anywhere"), &backend).unwrap();
        assert_eq!(
            result.properties().len() + result.omissions().len(),
            backend.capabilities().len()
        );
    }

    #[test]
    fn test_properties_keep_capability_order() {
        let result = extract(Path::new("/anywhere"), &test_backend()).unwrap();
        let names: Vec<_> = result.properties().keys().cloned().collect();
        assert_eq!(names, vec!["Total Energy", "Extra"]);
    }

    #[test]
    fn test_io_failure_aborts_directory() {
        let table = CapabilityTable::base().merge([Capability::new(PropertyKey::Forces, |_| {
            Err(FieldError::Io {
                path: PathBuf::from("/x/OUTCAR"),
                source: std::io::Error::other("disk gone"),
            })
        })]);
        let backend = Backend::new("Broken", |_| Ok(true), |_| Ok(None), table);
        let err = extract(Path::new("/anywhere"), &backend).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_skip_and_cancel() {
        let config = Config {
            skip: vec!["Total Energy".to_string()],
            ..Config::default()
        };
        let result = extract_with(Path::new("/anywhere"), &test_backend(), &config, None).unwrap();
        assert_eq!(result.omission("Total Energy"), Some(&Omission::Skipped));

        let cancel = CancelFlag::new(true);
        let result = extract_with(
            Path::new("/anywhere"),
            &test_backend(),
            &Config::default(),
            Some(&cancel),
        )
        .unwrap();
        assert!(result.properties().is_empty());
        assert!(result.omissions().values().all(|o| *o == Omission::Skipped));
    }

    #[test]
    fn test_json_shape() {
        let result = extract(Path::new("/anywhere"), &test_backend()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["backend"], "Test");
        assert_eq!(json["properties"]["Total Energy"]["units"], "eV");
        assert_eq!(json["omissions"]["Stresses"]["status"], "not_applicable");
        assert_eq!(json["omissions"]["Pressure"]["status"], "failed");
    }
}

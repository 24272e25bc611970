//! Backend descriptors

use crate::capability::CapabilityTable;
use crate::error::{FieldError, Result};
use crate::files::Calculation;
use std::fmt;
use std::path::Path;

/// Cheap test for "was this directory produced by this code?"
pub type ApplicabilityFn = fn(&Path) -> Result<bool>;

/// Reads the code's version string from a run directory
pub type VersionFn = fn(&Calculation) -> std::result::Result<Option<String>, FieldError>;

/// One supported code family
///
/// Built once and never mutated; safe to share between threads extracting
/// different directories.
pub struct Backend {
    name: &'static str,
    applies: ApplicabilityFn,
    version: VersionFn,
    capabilities: CapabilityTable,
}

impl Backend {
    pub fn new(
        name: &'static str,
        applies: ApplicabilityFn,
        version: VersionFn,
        capabilities: CapabilityTable,
    ) -> Self {
        Self {
            name,
            applies,
            version,
            capabilities,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn applies_to(&self, dir: &Path) -> Result<bool> {
        (self.applies)(dir)
    }

    pub fn version(&self, calc: &Calculation) -> std::result::Result<Option<String>, FieldError> {
        (self.version)(calc)
    }

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_backend_is_shareable() {
        assert_send_sync::<Backend>();
    }

    #[test]
    fn test_accessors() {
        let backend = Backend::new(
            "Test",
            |dir| Ok(dir.ends_with("yes")),
            |_| Ok(Some("1.0".to_string())),
            CapabilityTable::base(),
        );
        assert_eq!(backend.name(), "Test");
        assert!(backend.applies_to(Path::new("/runs/yes")).unwrap());
        assert!(!backend.applies_to(Path::new("/runs/no")).unwrap());
        assert_eq!(
            backend.version(&Calculation::new("/runs/yes")).unwrap().as_deref(),
            Some("1.0")
        );
        assert!(format!("{backend:?}").contains("Test"));
    }
}

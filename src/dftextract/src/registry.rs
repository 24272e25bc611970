//! Backend registry and format detection

use crate::backend::Backend;
use crate::config::AmbiguityPolicy;
use crate::error::{Error, Result};
use crate::{vasp, wien2k};
use once_cell::sync::Lazy;
use std::path::Path;

static STANDARD: Lazy<Registry> = Lazy::new(Registry::standard);

/// Known backends in registration order
#[derive(Debug, Default)]
pub struct Registry {
    backends: Vec<Backend>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// VASP, then Wien2k
    pub fn standard() -> Self {
        Self::new().with(vasp::backend()).with(wien2k::backend())
    }

    /// Process-wide standard registry
    pub fn global() -> &'static Registry {
        &STANDARD
    }

    pub fn register(&mut self, backend: Backend) {
        self.backends.push(backend);
    }

    pub fn with(mut self, backend: Backend) -> Self {
        self.register(backend);
        self
    }

    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    pub fn get(&self, name: &str) -> Option<&Backend> {
        self.backends.iter().find(|b| b.name() == name)
    }

    /// Every backend whose applicability test passes, in registration order
    pub fn candidates(&self, dir: &Path) -> Result<Vec<&Backend>> {
        let mut matches = Vec::new();
        for backend in &self.backends {
            if backend.applies_to(dir)? {
                matches.push(backend);
            }
        }
        Ok(matches)
    }

    /// Detect with the default policy (first match wins)
    pub fn detect(&self, dir: &Path) -> Result<&Backend> {
        self.detect_with(dir, AmbiguityPolicy::First)
    }

    pub fn detect_with(&self, dir: &Path, policy: AmbiguityPolicy) -> Result<&Backend> {
        let candidates = self.candidates(dir)?;
        match (candidates.len(), policy) {
            (0, _) => Err(Error::NoMatchingBackend {
                directory: dir.to_path_buf(),
            }),
            (1, _) | (_, AmbiguityPolicy::First) => {
                if candidates.len() > 1 {
                    tracing::warn!(
                        directory = %dir.display(),
                        chosen = candidates[0].name(),
                        matches = candidates.len(),
                        "several backends match, using the first registered"
                    );
                }
                Ok(candidates[0])
            }
            (_, AmbiguityPolicy::Error) => Err(Error::AmbiguousBackend {
                directory: dir.to_path_buf(),
                candidates: candidates.iter().map(|b| b.name()).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityTable;
    use std::fs;

    fn fake(name: &'static str, applies: fn(&Path) -> Result<bool>) -> Backend {
        Backend::new(name, applies, |_| Ok(None), CapabilityTable::base())
    }

    #[test]
    fn test_no_matching_backend() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("README"), "nothing here").unwrap();
        fs::write(temp_dir.path().join("notes.scf"), "not a wien2k file").unwrap();

        let err = Registry::standard().detect(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::NoMatchingBackend { .. }));
    }

    #[test]
    fn test_missing_directory_is_no_match() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = Registry::standard()
            .detect(&temp_dir.path().join("gone"))
            .unwrap_err();
        assert!(matches!(err, Error::NoMatchingBackend { .. }));
    }

    #[test]
    fn test_detect_vasp() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("OUTCAR"), " vasp.5.4.4\n").unwrap();
        assert_eq!(Registry::global().detect(temp_dir.path()).unwrap().name(), "VASP");
    }

    #[test]
    fn test_detect_wien2k() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join("case.scf"),
            ":LABEL3: using WIEN2k_14.2 (Release 15/10/2014)\n",
        )
        .unwrap();
        assert_eq!(Registry::standard().detect(temp_dir.path()).unwrap().name(), "Wien2k");
    }

    #[test]
    fn test_ambiguous_first_policy_uses_registration_order() {
        let registry = Registry::new()
            .with(fake("A", |_| Ok(true)))
            .with(fake("B", |_| Ok(true)));
        let dir = Path::new("/anywhere");
        assert_eq!(registry.detect(dir).unwrap().name(), "A");
    }

    #[test]
    fn test_ambiguous_error_policy() {
        let registry = Registry::new()
            .with(fake("A", |_| Ok(true)))
            .with(fake("Never", |_| Ok(false)))
            .with(fake("B", |_| Ok(true)));
        match registry.detect_with(Path::new("/anywhere"), AmbiguityPolicy::Error) {
            Err(Error::AmbiguousBackend { candidates, .. }) => assert_eq!(candidates, vec!["A", "B"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_single_match_ignores_policy() {
        let registry = Registry::new()
            .with(fake("A", |_| Ok(false)))
            .with(fake("B", |_| Ok(true)));
        let backend = registry
            .detect_with(Path::new("/anywhere"), AmbiguityPolicy::Error)
            .unwrap();
        assert_eq!(backend.name(), "B");
    }

    #[test]
    fn test_applicability_io_error_propagates() {
        let registry = Registry::new().with(fake("Broken", |dir| {
            Err(Error::io(dir, std::io::Error::other("denied")))
        }));
        let err = registry.detect(Path::new("/anywhere")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_get_by_name() {
        let registry = Registry::standard();
        assert_eq!(registry.backends().len(), 2);
        assert!(registry.get("Wien2k").is_some());
        assert!(registry.get("QE").is_none());
    }
}

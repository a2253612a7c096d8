//! Core runtime configuration.
//!
//! Resolved once at process startup and passed into the apply service. Request handling never
//! reads environment variables itself.

use crate::constants::DEFAULT_TEMPLATE_DIR;
use crate::error::{ApplyError, ApplyResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    template_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError::Config`] if `template_dir` is not an existing directory.
    pub fn new(template_dir: PathBuf) -> ApplyResult<Self> {
        if !template_dir.is_dir() {
            return Err(ApplyError::Config(format!(
                "template directory {} does not exist",
                template_dir.display()
            )));
        }
        Ok(Self { template_dir })
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }
}

/// Resolve the template directory without reading environment variables.
///
/// If `override_dir` is provided it must be a directory. Otherwise this looks for
/// `activity-definitions/` relative to the current working directory and then walks up from
/// `CARGO_MANIFEST_DIR`.
///
/// # Errors
///
/// Returns [`ApplyError::Config`] if no usable directory is found.
pub fn resolve_template_dir(override_dir: Option<PathBuf>) -> ApplyResult<PathBuf> {
    if let Some(dir) = override_dir {
        if dir.is_dir() {
            return Ok(dir);
        }
        return Err(ApplyError::Config(format!(
            "template directory override {} is not a directory",
            dir.display()
        )));
    }

    let cwd_relative = PathBuf::from(DEFAULT_TEMPLATE_DIR);
    if cwd_relative.is_dir() {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .map(|ancestor| ancestor.join(DEFAULT_TEMPLATE_DIR))
        .find(|candidate| candidate.is_dir())
        .ok_or_else(|| {
            ApplyError::Config(format!("could not locate {DEFAULT_TEMPLATE_DIR}/ directory"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn override_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            resolve_template_dir(Some(dir.path().to_path_buf())).unwrap(),
            dir.path()
        );

        let missing = dir.path().join("missing");
        let err = resolve_template_dir(Some(missing)).unwrap_err();
        assert!(matches!(err, ApplyError::Config(_)));
    }

    #[test]
    fn config_rejects_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(CoreConfig::new(dir.path().join("nope")).is_err());

        let cfg = CoreConfig::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(cfg.template_dir(), dir.path());
    }
}

//! Template lookup by id.
//!
//! The apply engine reads templates through [`TemplateRepository`]. Two implementations are
//! provided:
//! - [`InMemoryTemplateRepository`] for library callers and tests
//! - [`DirectoryTemplateRepository`], one `<id>.json` / `<id>.yaml` document per template

use crate::constants::{MAX_TEMPLATE_ID_LEN, TEMPLATE_EXTENSIONS, TEMPLATE_REFERENCE_PREFIX};
use crate::error::{ApplyError, ApplyResult, RepositoryError};
use fhir::{ActivityDefinition, TemplateFormat};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Read-only template store.
pub trait TemplateRepository {
    fn get(&self, id: &str) -> Result<ActivityDefinition, RepositoryError>;
}

impl<T: TemplateRepository + ?Sized> TemplateRepository for &T {
    fn get(&self, id: &str) -> Result<ActivityDefinition, RepositoryError> {
        (**self).get(id)
    }
}

/// Normalise a requested template id.
///
/// Accepts `<id>` or `ActivityDefinition/<id>` and checks the id against the FHIR `id`
/// datatype: 1 to 64 characters from `[A-Za-z0-9-.]`. Ids are embedded in file names, so this
/// also keeps lookups inside the repository directory.
///
/// # Errors
///
/// Returns [`RepositoryError::InvalidId`] if the id is empty, too long, or contains other
/// characters.
pub fn normalise_template_id(raw: &str) -> Result<&str, RepositoryError> {
    let trimmed = raw.trim();
    let id = trimmed
        .strip_prefix(TEMPLATE_REFERENCE_PREFIX)
        .unwrap_or(trimmed);

    let valid = !id.is_empty()
        && id.len() <= MAX_TEMPLATE_ID_LEN
        && id
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'.'))
        && id != "."
        && id != "..";

    if !valid {
        return Err(RepositoryError::InvalidId(raw.to_string()));
    }
    Ok(id)
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct InMemoryTemplateRepository {
    templates: HashMap<String, ActivityDefinition>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `template` under its own id, replacing any previous template with that id.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError::InvalidInput`] if the template has no usable id.
    pub fn insert(&mut self, template: ActivityDefinition) -> ApplyResult<()> {
        let raw = template
            .id
            .as_deref()
            .ok_or_else(|| ApplyError::InvalidInput("template has no id".into()))?;
        let id = normalise_template_id(raw)
            .map_err(|e| ApplyError::InvalidInput(e.to_string()))?
            .to_string();
        self.templates.insert(id, template);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateRepository for InMemoryTemplateRepository {
    fn get(&self, id: &str) -> Result<ActivityDefinition, RepositoryError> {
        let id = normalise_template_id(id)?;
        self.templates
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }
}

// ============================================================================
// Directory-backed
// ============================================================================

/// Templates stored as individual documents in one directory.
///
/// `get("cbc")` reads the first of `cbc.json`, `cbc.yaml`, `cbc.yml` that exists. A document
/// without an `id` takes the id it was looked up by.
#[derive(Clone, Debug)]
pub struct DirectoryTemplateRepository {
    dir: PathBuf,
}

impl DirectoryTemplateRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn locate(&self, id: &str) -> Option<(PathBuf, TemplateFormat)> {
        TEMPLATE_EXTENSIONS.iter().find_map(|ext| {
            let path = self.dir.join(format!("{id}.{ext}"));
            let format = TemplateFormat::from_extension(ext)?;
            path.is_file().then_some((path, format))
        })
    }
}

impl TemplateRepository for DirectoryTemplateRepository {
    fn get(&self, id: &str) -> Result<ActivityDefinition, RepositoryError> {
        let id = normalise_template_id(id)?;
        let (path, format) = self
            .locate(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        let text = std::fs::read_to_string(&path).map_err(|source| RepositoryError::Unreadable {
            id: id.to_string(),
            source,
        })?;

        let mut template =
            ActivityDefinition::parse(&text, format).map_err(|source| RepositoryError::Invalid {
                id: id.to_string(),
                source,
            })?;

        match template.id.as_deref() {
            None => template.id = Some(id.to_string()),
            Some(own) if own != id => {
                tracing::warn!(
                    "template {} declares id {own}, expected {id}",
                    path.display()
                );
            }
            Some(_) => {}
        }

        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const JSON_TEMPLATE: &str =
        r#"{"resourceType":"ActivityDefinition","id":"cbc","kind":"ServiceRequest","code":{"text":"CBC"}}"#;

    #[test]
    fn normalise_accepts_plain_and_prefixed_ids() {
        assert_eq!(normalise_template_id("cbc").unwrap(), "cbc");
        assert_eq!(normalise_template_id("ActivityDefinition/cbc-1.2").unwrap(), "cbc-1.2");
    }

    #[test]
    fn normalise_rejects_unsafe_ids() {
        for raw in ["", "  ", "../etc/passwd", "a/b", "a b", "..", &"x".repeat(65)] {
            assert!(
                matches!(normalise_template_id(raw), Err(RepositoryError::InvalidId(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn in_memory_round_trip() {
        let mut repo = InMemoryTemplateRepository::new();
        repo.insert(ActivityDefinition::parse_json(JSON_TEMPLATE).unwrap())
            .unwrap();
        assert_eq!(repo.len(), 1);

        let template = repo.get("ActivityDefinition/cbc").unwrap();
        assert_eq!(template.kind_code(), "ServiceRequest");
        assert!(matches!(repo.get("other"), Err(RepositoryError::NotFound(id)) if id == "other"));
    }

    #[test]
    fn in_memory_requires_id() {
        let mut repo = InMemoryTemplateRepository::new();
        assert!(repo.insert(ActivityDefinition::default()).is_err());
        assert!(repo.is_empty());
    }

    #[test]
    fn directory_reads_json_and_yaml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cbc.json"), JSON_TEMPLATE).unwrap();
        fs::write(
            dir.path().join("leaflet.yaml"),
            "kind: Communication\ncode:\n  text: Leaflet\n",
        )
        .unwrap();

        let repo = DirectoryTemplateRepository::new(dir.path());
        assert_eq!(repo.get("cbc").unwrap().kind_code(), "ServiceRequest");

        let leaflet = repo.get("leaflet").unwrap();
        assert_eq!(leaflet.kind_code(), "Communication");
        assert_eq!(leaflet.id.as_deref(), Some("leaflet"));
    }

    #[test]
    fn directory_missing_and_invalid_templates() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.json"), r#"{"kind": 7}"#).unwrap();
        let repo = DirectoryTemplateRepository::new(dir.path());

        assert!(matches!(repo.get("absent"), Err(RepositoryError::NotFound(_))));
        match repo.get("broken") {
            Err(RepositoryError::Invalid { id, source }) => {
                assert_eq!(id, "broken");
                assert!(source.to_string().contains("kind"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert!(matches!(repo.get("../broken"), Err(RepositoryError::InvalidId(_))));
    }
}

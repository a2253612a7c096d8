//! Per-call actor references for `$apply`.
//!
//! An [`ApplyContext`] is built for a single apply call and dropped afterwards. Ids are used
//! verbatim as `Reference.reference` on the produced record.

use crate::error::{ApplyError, ApplyResult};
use apply_types::ReferenceId;
use fhir::Reference;

/// Optional hints accepted by the `$apply` operation.
///
/// They are carried through to the caller's logging but do not change how a template maps.
/// Field names follow the `$apply` parameter names (`userType`, `settingContext`, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplyHints {
    pub encounter: Option<String>,
    pub user_type: Option<String>,
    pub user_language: Option<String>,
    pub user_task_context: Option<String>,
    pub setting: Option<String>,
    pub setting_context: Option<String>,
}

/// Actors an apply call acts on behalf of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyContext {
    subject: ReferenceId,
    practitioner: Option<ReferenceId>,
    organization: Option<ReferenceId>,
    hints: ApplyHints,
}

impl ApplyContext {
    pub fn new(subject: ReferenceId) -> Self {
        Self {
            subject,
            practitioner: None,
            organization: None,
            hints: ApplyHints::default(),
        }
    }

    /// Build a context from raw ids as received at a boundary.
    ///
    /// Blank optional ids are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError::InvalidInput`] if the subject id is blank or any id contains
    /// whitespace.
    pub fn from_ids(
        subject: &str,
        practitioner: Option<&str>,
        organization: Option<&str>,
    ) -> ApplyResult<Self> {
        let subject = parse_id("patient", subject)?;
        let practitioner = optional_id("practitioner", practitioner)?;
        let organization = optional_id("organization", organization)?;

        Ok(Self {
            practitioner,
            organization,
            ..Self::new(subject)
        })
    }

    pub fn with_hints(mut self, hints: ApplyHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn subject(&self) -> &ReferenceId {
        &self.subject
    }

    pub fn practitioner(&self) -> Option<&ReferenceId> {
        self.practitioner.as_ref()
    }

    pub fn organization(&self) -> Option<&ReferenceId> {
        self.organization.as_ref()
    }

    pub fn hints(&self) -> &ApplyHints {
        &self.hints
    }

    pub fn subject_reference(&self) -> Reference {
        Reference::new(self.subject.as_str())
    }

    pub fn practitioner_reference(&self) -> Option<Reference> {
        self.practitioner.as_ref().map(|id| Reference::new(id.as_str()))
    }

    pub fn organization_reference(&self) -> Option<Reference> {
        self.organization.as_ref().map(|id| Reference::new(id.as_str()))
    }
}

fn parse_id(role: &str, value: &str) -> ApplyResult<ReferenceId> {
    ReferenceId::new(value).map_err(|e| ApplyError::InvalidInput(format!("{role} id: {e}")))
}

fn optional_id(role: &str, value: Option<&str>) -> ApplyResult<Option<ReferenceId>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_id(role, v))
        .transpose()
}

//! FHIR OperationOutcome: the diagnostic envelope returned instead of a record.

use crate::datatypes::CodeableConcept;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum OperationOutcomeType {
    OperationOutcome,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

/// Subset of the FHIR `issue-type` value set used by apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    Required,
    Value,
    Invariant,
    Processing,
    NotFound,
    NotSupported,
    Exception,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,
    pub code: IssueType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<CodeableConcept>,
}

impl OperationOutcomeIssue {
    /// Detail text of this issue, if any.
    pub fn details_text(&self) -> Option<&str> {
        self.details.as_ref().and_then(CodeableConcept::text)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    #[serde(rename = "resourceType")]
    resource_type: OperationOutcomeType,

    pub issue: Vec<OperationOutcomeIssue>,
}

impl OperationOutcome {
    pub fn builder() -> OperationOutcomeBuilder {
        OperationOutcomeBuilder::default()
    }

    /// Outcome with a single `error` issue carrying `details` as text.
    pub fn error(code: IssueType, details: impl Into<String>) -> Self {
        Self::builder()
            .issue(IssueSeverity::Error, code, details)
            .build()
    }

    /// Details text of the first issue.
    pub fn message(&self) -> Option<&str> {
        self.issue.first().and_then(OperationOutcomeIssue::details_text)
    }
}

/// Accumulates issues for an [`OperationOutcome`].
#[derive(Clone, Debug, Default)]
pub struct OperationOutcomeBuilder {
    issues: Vec<OperationOutcomeIssue>,
}

impl OperationOutcomeBuilder {
    pub fn issue(
        mut self,
        severity: IssueSeverity,
        code: IssueType,
        details: impl Into<String>,
    ) -> Self {
        self.issues.push(OperationOutcomeIssue {
            severity,
            code,
            details: Some(CodeableConcept::from_text(details)),
        });
        self
    }

    pub fn build(self) -> OperationOutcome {
        OperationOutcome {
            resource_type: OperationOutcomeType::OperationOutcome,
            issue: self.issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_fhir_json() {
        let outcome = OperationOutcome::error(
            IssueType::Processing,
            "Unable to resolve ActivityDefinition/ad-1",
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["resourceType"], "OperationOutcome");
        assert_eq!(json["issue"][0]["severity"], "error");
        assert_eq!(json["issue"][0]["code"], "processing");
        assert_eq!(
            json["issue"][0]["details"]["text"],
            "Unable to resolve ActivityDefinition/ad-1"
        );
    }

    #[test]
    fn builder_keeps_issue_order() {
        let outcome = OperationOutcome::builder()
            .issue(IssueSeverity::Error, IssueType::NotFound, "first")
            .issue(IssueSeverity::Warning, IssueType::Value, "second")
            .build();
        assert_eq!(outcome.issue.len(), 2);
        assert_eq!(outcome.message(), Some("first"));
        assert_eq!(outcome.issue[1].code, IssueType::Value);
        assert_eq!(
            serde_json::to_value(IssueType::NotSupported).unwrap(),
            "not-supported"
        );
    }
}

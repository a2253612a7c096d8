use crate::mapping::rules::TemplateField;
use fhir::{IssueType, OperationOutcome, RecordKind};

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("could not resolve activity kind {0:?}")]
    UnknownKind(String),

    #[error("missing required {field} property for {kind}")]
    MissingRequiredField {
        kind: RecordKind,
        field: TemplateField,
    },

    #[error("{field} does not map to {kind}")]
    IllegalFieldForKind {
        kind: RecordKind,
        field: TemplateField,
    },

    #[error("dynamic value for path {path:?} failed: {source}")]
    DynamicValue {
        path: String,
        #[source]
        source: DynamicValueCause,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ApplyError {
    /// Diagnostic envelope for this failure, for boundaries that report errors as FHIR.
    pub fn to_operation_outcome(&self) -> OperationOutcome {
        let code = match self {
            ApplyError::UnknownKind(_) => IssueType::NotSupported,
            ApplyError::MissingRequiredField { .. } => IssueType::Required,
            ApplyError::IllegalFieldForKind { .. } => IssueType::Invalid,
            ApplyError::DynamicValue { .. } => IssueType::Processing,
            ApplyError::InvalidInput(_) => IssueType::Invalid,
            ApplyError::Config(_) => IssueType::Exception,
        };
        OperationOutcome::error(code, self.to_string())
    }
}

/// Why a single dynamic value could not be applied.
#[derive(Debug, thiserror::Error)]
pub enum DynamicValueCause {
    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("write failed: {0}")]
    Path(#[from] PathError),
}

/// Failure reported by an expression evaluator.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct EvaluationError(pub String);

/// Failure reported by a path resolver.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct PathError(pub String);

impl From<fhir::FhirError> for PathError {
    fn from(err: fhir::FhirError) -> Self {
        PathError(err.to_string())
    }
}

/// Failure to look up a template by id.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("ActivityDefinition/{0} not found")]
    NotFound(String),

    #[error("invalid template id {0:?}")]
    InvalidId(String),

    #[error("failed to read ActivityDefinition/{id}: {source}")]
    Unreadable {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ActivityDefinition/{id} is not a valid template: {source}")]
    Invalid {
        id: String,
        #[source]
        source: fhir::FhirError,
    },
}

pub type ApplyResult<T> = std::result::Result<T, ApplyError>;

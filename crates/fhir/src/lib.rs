//! FHIR R4 boundary models for ActivityDefinition `$apply`.
//!
//! This crate provides the **wire models** the apply engine reads and writes:
//! - the `ActivityDefinition` template, parsed from JSON or YAML
//! - the eight record shapes `$apply` can produce, under the [`Resource`] union
//! - `OperationOutcome` diagnostics
//! - path-addressed writes into produced records (used by dynamic values)
//!
//! This crate focuses on:
//! - FHIR JSON field naming and value sets
//! - serialisation/deserialisation with field-path error reporting
//!
//! Mapping rules between templates and records live in `apply-core`, not here.

pub mod activity_definition;
pub mod datatypes;
pub mod operation_outcome;
pub mod path;
pub mod resources;

pub use activity_definition::{ActivityDefinition, DynamicValue, Product, TemplateFormat};
pub use datatypes::{
    Attachment, BooleanType, CodeableConcept, Coding, Dosage, Expression, Extension, Quantity,
    Reference, RelatedArtifact,
};
pub use operation_outcome::{
    IssueSeverity, IssueType, OperationOutcome, OperationOutcomeBuilder, OperationOutcomeIssue,
};
pub use path::{ElementValue, FieldPath};
pub use resources::{
    Communication, CommunicationRequest, DiagnosticReport, DiagnosticReportStatus, EventStatus,
    MedicationRequest, MedicationRequestIntent, MedicationRequestStatus, PayloadComponent,
    Procedure, RecordKind, RequestIntent, RequestPriority, RequestStatus, Resource,
    ServiceRequest, SupplyRequest, SupplyRequestStatus, Task, TaskIntent, TaskStatus,
};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("translation error: {0}")]
    Translation(String),

    #[error("path error: {0}")]
    Path(String),
}

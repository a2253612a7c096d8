//! # Apply Core
//!
//! Resolution of FHIR ActivityDefinition templates into concrete request/event records, the
//! `$apply` operation.
//!
//! A call runs in three steps:
//! - **Dispatch**: the template's `kind` selects one of eight record shapes ([`dispatch`])
//! - **Mapping**: a per-kind mapper builds the base record, then the kind's field rules are checked
//! - **Overlay**: each `dynamicValue` is evaluated and written into the record at its path
//!
//! [`ApplyService`] wraps the three steps behind a [`TemplateRepository`] lookup.
//!
//! **No transport concerns**: the CLI and the REST runner live in their own crates and only
//! translate their inputs into an [`ApplyContext`].

pub mod config;
pub mod constants;
pub mod context;
pub mod dispatch;
pub mod dynamic_values;
pub mod error;
pub mod evaluator;
pub mod mapping;
pub mod repository;
pub mod service;

pub use config::{resolve_template_dir, CoreConfig};
pub use context::{ApplyContext, ApplyHints};
pub use dispatch::dispatch;
pub use dynamic_values::{
    apply_dynamic_values, Evaluation, ExpressionEvaluator, PathResolver, ResourcePathResolver,
};
pub use error::{
    ApplyError, ApplyResult, DynamicValueCause, EvaluationError, PathError, RepositoryError,
};
pub use evaluator::LiteralEvaluator;
pub use mapping::rules::{FieldRules, Requirement, TemplateField};
pub use repository::{
    normalise_template_id, DirectoryTemplateRepository, InMemoryTemplateRepository,
    TemplateRepository,
};
pub use service::{resolve_activity_definition, ApplyOutcome, ApplyService};

pub use apply_types::ReferenceId;

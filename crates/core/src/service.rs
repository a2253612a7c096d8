//! `$apply` orchestration.
//!
//! [`ApplyService`] ties together template lookup, kind dispatch and the dynamic value overlay.
//! It is synchronous and holds no per-call state, so a single instance can be shared behind an
//! `Arc` by a server.

use crate::context::ApplyContext;
use crate::dispatch::dispatch;
use crate::dynamic_values::{
    apply_dynamic_values, ExpressionEvaluator, PathResolver, ResourcePathResolver,
};
use crate::error::{ApplyError, ApplyResult};
use crate::repository::TemplateRepository;
use fhir::{ActivityDefinition, IssueType, OperationOutcome, Resource};

/// What an apply call returns when it did not fail with a typed error.
#[derive(Clone, Debug, PartialEq)]
pub enum ApplyOutcome {
    /// The produced record.
    Resource(Resource),
    /// The template could not be resolved.
    Diagnostic(OperationOutcome),
}

impl ApplyOutcome {
    pub fn resource(&self) -> Option<&Resource> {
        match self {
            ApplyOutcome::Resource(resource) => Some(resource),
            ApplyOutcome::Diagnostic(_) => None,
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        matches!(self, ApplyOutcome::Diagnostic(_))
    }

    /// FHIR JSON payload for this outcome: the record itself or the OperationOutcome.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError::InvalidInput`] if serialisation fails.
    pub fn into_resource_or_outcome(self) -> ApplyResult<serde_json::Value> {
        match self {
            ApplyOutcome::Resource(resource) => resource
                .to_json()
                .map_err(|e| ApplyError::InvalidInput(e.to_string())),
            ApplyOutcome::Diagnostic(outcome) => serde_json::to_value(outcome)
                .map_err(|e| ApplyError::InvalidInput(e.to_string())),
        }
    }
}

/// Resolve `template` into a record for `ctx` without any repository.
///
/// # Errors
///
/// See [`ApplyService::resolve_activity_definition`].
pub fn resolve_activity_definition<E, P>(
    template: &ActivityDefinition,
    ctx: &ApplyContext,
    evaluator: &E,
    resolver: &P,
) -> ApplyResult<Resource>
where
    E: ExpressionEvaluator + ?Sized,
    P: PathResolver + ?Sized,
{
    let (_, base) = dispatch(template, ctx)?;
    apply_dynamic_values(base, template, ctx.subject().as_str(), evaluator, resolver)
}

/// Apply service over a template repository and an expression evaluator.
#[derive(Clone, Debug)]
pub struct ApplyService<R, E, P = ResourcePathResolver> {
    repository: R,
    evaluator: E,
    resolver: P,
}

impl<R, E> ApplyService<R, E>
where
    R: TemplateRepository,
    E: ExpressionEvaluator,
{
    pub fn new(repository: R, evaluator: E) -> Self {
        Self {
            repository,
            evaluator,
            resolver: ResourcePathResolver,
        }
    }
}

impl<R, E, P> ApplyService<R, E, P>
where
    R: TemplateRepository,
    E: ExpressionEvaluator,
    P: PathResolver,
{
    /// Use a custom path resolver for dynamic value writes.
    pub fn with_resolver<Q: PathResolver>(self, resolver: Q) -> ApplyService<R, E, Q> {
        ApplyService {
            repository: self.repository,
            evaluator: self.evaluator,
            resolver,
        }
    }

    /// Look up template `template_id` and resolve it for `ctx`.
    ///
    /// A lookup failure is not an error: it yields [`ApplyOutcome::Diagnostic`] with a single
    /// `error`/`processing` issue naming the id.
    ///
    /// # Errors
    ///
    /// Typed failures from [`Self::resolve_activity_definition`] propagate unchanged.
    pub fn apply_by_id(&self, template_id: &str, ctx: &ApplyContext) -> ApplyResult<ApplyOutcome> {
        let template = match self.repository.get(template_id) {
            Ok(template) => template,
            Err(err) => {
                tracing::warn!(template_id, error = %err, "activity definition lookup failed");
                return Ok(ApplyOutcome::Diagnostic(OperationOutcome::error(
                    IssueType::Processing,
                    format!("Unable to resolve ActivityDefinition/{template_id}"),
                )));
            }
        };

        let hints = ctx.hints();
        tracing::debug!(
            template_id,
            subject = %ctx.subject(),
            encounter = hints.encounter.as_deref().unwrap_or(""),
            setting = hints.setting.as_deref().unwrap_or(""),
            "applying activity definition"
        );

        self.resolve_activity_definition(&template, ctx)
            .map(ApplyOutcome::Resource)
    }

    /// Resolve an already loaded template for `ctx`.
    ///
    /// The template is not modified, so repeated calls with the same inputs produce equal
    /// records.
    ///
    /// # Errors
    ///
    /// - [`ApplyError::UnknownKind`] for an unsupported `kind`.
    /// - [`ApplyError::MissingRequiredField`] / [`ApplyError::IllegalFieldForKind`] for field
    ///   rule violations.
    /// - [`ApplyError::DynamicValue`] when a dynamic value cannot be evaluated or written.
    pub fn resolve_activity_definition(
        &self,
        template: &ActivityDefinition,
        ctx: &ApplyContext,
    ) -> ApplyResult<Resource> {
        resolve_activity_definition(template, ctx, &self.evaluator, &self.resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DynamicValueCause, PathError};
    use crate::evaluator::LiteralEvaluator;
    use crate::mapping::rules::TemplateField;
    use crate::mapping::test_support::{context, context_with};
    use crate::repository::InMemoryTemplateRepository;
    use fhir::{
        BooleanType, CodeableConcept, DynamicValue, ElementValue, Expression, IssueSeverity,
        Quantity, RecordKind, Reference,
    };

    fn repo_with(json: &str) -> InMemoryTemplateRepository {
        let mut repo = InMemoryTemplateRepository::new();
        repo.insert(ActivityDefinition::parse_json(json).unwrap())
            .unwrap();
        repo
    }

    fn service(json: &str) -> ApplyService<InMemoryTemplateRepository, LiteralEvaluator> {
        ApplyService::new(repo_with(json), LiteralEvaluator)
    }

    const CBC: &str = r#"{
        "resourceType": "ActivityDefinition",
        "id": "cbc",
        "kind": "ServiceRequest",
        "code": {"text": "CBC"},
        "dynamicValue": [
            {"path": "priority", "expression": {"language": "text/cql", "expression": "'stat'"}},
            {"path": "doNotPerform", "expression": {"language": "text/cql", "expression": "false"}}
        ]
    }"#;

    #[test]
    fn apply_by_id_produces_record() {
        let svc = service(CBC);
        let outcome = svc
            .apply_by_id("cbc", &context_with(Some("Practitioner/dr-1"), None))
            .unwrap();

        let json = outcome.into_resource_or_outcome().unwrap();
        assert_eq!(json["resourceType"], "ServiceRequest");
        assert_eq!(json["status"], "draft");
        assert_eq!(json["intent"], "order");
        assert_eq!(json["priority"], "stat");
        assert_eq!(json["doNotPerform"], false);
        assert_eq!(json["subject"]["reference"], "Patient/p1");
        assert_eq!(json["requester"]["reference"], "Practitioner/dr-1");
        assert_eq!(json["code"]["text"], "CBC");
    }

    #[test]
    fn lookup_failure_is_a_diagnostic() {
        let svc = service(CBC);
        let outcome = svc.apply_by_id("missing", &context()).unwrap();

        let ApplyOutcome::Diagnostic(diagnostic) = &outcome else {
            panic!("expected diagnostic, got {outcome:?}");
        };
        assert_eq!(diagnostic.issue.len(), 1);
        assert_eq!(diagnostic.issue[0].severity, IssueSeverity::Error);
        assert_eq!(diagnostic.issue[0].code, IssueType::Processing);
        assert_eq!(
            diagnostic.message(),
            Some("Unable to resolve ActivityDefinition/missing")
        );
        assert!(outcome.resource().is_none());

        let json = outcome.into_resource_or_outcome().unwrap();
        assert_eq!(json["resourceType"], "OperationOutcome");
    }

    #[test]
    fn invalid_id_is_also_a_diagnostic() {
        let svc = service(CBC);
        assert!(svc.apply_by_id("../cbc", &context()).unwrap().is_diagnostic());
    }

    #[test]
    fn typed_errors_propagate() {
        let svc = service(
            r#"{"resourceType":"ActivityDefinition","id":"supply","kind":"SupplyRequest"}"#,
        );
        let err = svc.apply_by_id("supply", &context()).unwrap_err();
        assert!(matches!(
            err,
            ApplyError::MissingRequiredField {
                kind: RecordKind::SupplyRequest,
                field: TemplateField::Quantity
            }
        ));
        assert_eq!(
            err.to_operation_outcome().issue[0].code,
            IssueType::Required
        );
    }

    #[test]
    fn resolve_is_idempotent_and_leaves_template_untouched() {
        let template = ActivityDefinition::parse_json(CBC).unwrap();
        let before = template.clone();
        let svc = ApplyService::new(InMemoryTemplateRepository::new(), LiteralEvaluator);

        let first = svc.resolve_activity_definition(&template, &context()).unwrap();
        let second = svc.resolve_activity_definition(&template, &context()).unwrap();
        assert_eq!(first, second);
        assert_eq!(template, before);
    }

    #[test]
    fn apply_by_id_is_idempotent() {
        let svc = service(CBC);
        let ctx = context_with(Some("Practitioner/dr-1"), None);

        let first = svc.apply_by_id("cbc", &ctx).unwrap();
        let second = svc.apply_by_id("cbc", &ctx).unwrap();
        assert!(!first.is_diagnostic());
        assert_eq!(first, second);
    }

    #[test]
    fn dynamic_value_failure_yields_no_record() {
        let mut template = ActivityDefinition {
            kind: Some("SupplyRequest".into()),
            quantity: Some(Quantity::new(2.0, "box")),
            ..ActivityDefinition::default()
        };
        template.dynamic_value.push(DynamicValue::new(
            "occurrenceDateTime",
            Expression::new("text/cql", "Now()"),
        ));

        let err = resolve_activity_definition(
            &template,
            &context(),
            &LiteralEvaluator,
            &ResourcePathResolver,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ApplyError::DynamicValue { ref path, source: DynamicValueCause::Evaluation(_) }
                if path == "occurrenceDateTime"
        ));
    }

    struct Refusing;

    impl PathResolver for Refusing {
        fn set_value(
            &self,
            _resource: &mut Resource,
            path: &str,
            _value: ElementValue,
        ) -> Result<(), PathError> {
            Err(PathError(format!("{path} is read-only")))
        }
    }

    #[test]
    fn custom_resolver_is_used() {
        let svc = service(CBC).with_resolver(Refusing);
        let err = svc.apply_by_id("cbc", &context()).unwrap_err();
        assert!(matches!(
            err,
            ApplyError::DynamicValue { ref path, source: DynamicValueCause::Path(_) }
                if path == "priority"
        ));
    }

    #[test]
    fn free_function_matches_service() {
        let mut template = ActivityDefinition {
            kind: Some("Procedure".into()),
            code: Some(CodeableConcept::from_text("Appendectomy")),
            ..ActivityDefinition::default()
        };
        template
            .dynamic_value
            .push(DynamicValue::new("subject", Expression::new("text/cql", "%subject")));

        let resource = resolve_activity_definition(
            &template,
            &context(),
            &LiteralEvaluator,
            &ResourcePathResolver,
        )
        .unwrap();
        match resource {
            Resource::Procedure(procedure) => {
                assert_eq!(procedure.subject, Reference::new("Patient/p1"));
                assert_eq!(procedure.code, Some(CodeableConcept::from_text("Appendectomy")));
            }
            other => panic!("expected Procedure, got {other:?}"),
        }

        assert_eq!(
            crate::dynamic_values::Evaluation::Boolean(true).into_element(),
            ElementValue::Boolean(BooleanType::new(true))
        );
    }

    #[test]
    fn bundled_templates_apply() {
        let dir = crate::config::resolve_template_dir(None).expect("bundled template directory");
        let svc = ApplyService::new(
            crate::repository::DirectoryTemplateRepository::new(dir),
            LiteralEvaluator,
        );
        let ctx = context_with(Some("Practitioner/dr-1"), None);

        let expect = |id: &str, kind: RecordKind| {
            let outcome = svc.apply_by_id(id, &ctx).expect(id);
            let resource = outcome.resource().expect(id);
            assert_eq!(resource.kind(), kind, "{id}");
            resource.clone()
        };

        match expect("activitydefinition-follow-up", RecordKind::Task) {
            Resource::Task(task) => assert_eq!(task.id.as_deref(), Some("task-follow-up")),
            other => panic!("expected Task, got {other:?}"),
        }
        expect("activitydefinition-cbc", RecordKind::ServiceRequest);
        match expect("smoking-cessation-leaflet", RecordKind::Communication) {
            Resource::Communication(communication) => assert_eq!(communication.payload.len(), 1),
            other => panic!("expected Communication, got {other:?}"),
        }
    }
}

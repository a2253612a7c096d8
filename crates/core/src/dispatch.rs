//! Kind dispatch: template `kind` → record kind → mapped, validated base record.

use crate::context::ApplyContext;
use crate::error::{ApplyError, ApplyResult};
use crate::mapping::{map_record, rules::FieldRules};
use fhir::{ActivityDefinition, RecordKind, Resource};

/// Map `template` into the base record selected by its `kind`.
///
/// # Errors
///
/// - [`ApplyError::UnknownKind`] if `kind` is not one of the eight supported record kinds.
/// - [`ApplyError::MissingRequiredField`] / [`ApplyError::IllegalFieldForKind`] if the template
///   violates the kind's field rules. The mapped record is discarded.
pub fn dispatch(
    template: &ActivityDefinition,
    ctx: &ApplyContext,
) -> ApplyResult<(RecordKind, Resource)> {
    let code = template.kind_code();
    let kind =
        RecordKind::from_code(code).ok_or_else(|| ApplyError::UnknownKind(code.to_string()))?;

    tracing::debug!(
        kind = %kind,
        template_id = template.id.as_deref().unwrap_or("<none>"),
        "mapping activity definition"
    );

    let record = map_record(kind, template, ctx);
    FieldRules::for_kind(kind).check(kind, template)?;

    Ok((kind, record))
}

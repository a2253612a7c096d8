//! Dynamic value overlay.
//!
//! After base mapping, every `dynamicValue` on the template is evaluated and written into the
//! record at its path, in declaration order. Writes take priority over anything the mapper set,
//! and a later entry for the same path wins.
//!
//! Evaluation and path writing are collaborators behind [`ExpressionEvaluator`] and
//! [`PathResolver`]. The evaluator is given the owning template as its context, not the record
//! being built, so an expression cannot observe values the mapper already wrote.

use crate::error::{ApplyError, ApplyResult, DynamicValueCause, EvaluationError, PathError};
use fhir::{ActivityDefinition, BooleanType, ElementValue, Resource};

/// Result of evaluating a dynamic value expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Evaluation {
    /// A host boolean. Wrapped into [`BooleanType`] before it is written.
    Boolean(bool),
    /// Any other value, written as is.
    Value(ElementValue),
}

impl Evaluation {
    /// The only coercion the overlay performs: raw booleans become boolean elements.
    pub fn into_element(self) -> ElementValue {
        match self {
            Evaluation::Boolean(b) => ElementValue::Boolean(BooleanType::new(b)),
            Evaluation::Value(value) => value,
        }
    }
}

/// Evaluates dynamic value expressions.
pub trait ExpressionEvaluator {
    fn evaluate(
        &self,
        template: &ActivityDefinition,
        expression: &str,
        subject: &str,
    ) -> Result<Evaluation, EvaluationError>;
}

/// Writes a value into a record at a dotted path.
pub trait PathResolver {
    fn set_value(
        &self,
        resource: &mut Resource,
        path: &str,
        value: ElementValue,
    ) -> Result<(), PathError>;
}

impl<T: ExpressionEvaluator + ?Sized> ExpressionEvaluator for &T {
    fn evaluate(
        &self,
        template: &ActivityDefinition,
        expression: &str,
        subject: &str,
    ) -> Result<Evaluation, EvaluationError> {
        (**self).evaluate(template, expression, subject)
    }
}

impl<T: PathResolver + ?Sized> PathResolver for &T {
    fn set_value(
        &self,
        resource: &mut Resource,
        path: &str,
        value: ElementValue,
    ) -> Result<(), PathError> {
        (**self).set_value(resource, path, value)
    }
}

/// Path resolver backed by [`Resource::set_path`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ResourcePathResolver;

impl PathResolver for ResourcePathResolver {
    fn set_value(
        &self,
        resource: &mut Resource,
        path: &str,
        value: ElementValue,
    ) -> Result<(), PathError> {
        resource.set_path(path, value).map_err(PathError::from)
    }
}

/// Overlay the template's dynamic values onto `resource`.
///
/// The record is taken by value and only handed back when every entry applied, so a failure
/// never exposes a partially overlaid record. Entries without expression text are skipped.
///
/// # Errors
///
/// Returns [`ApplyError::DynamicValue`] naming the path of the first entry whose evaluation or
/// write failed.
pub fn apply_dynamic_values<E, P>(
    mut resource: Resource,
    template: &ActivityDefinition,
    subject: &str,
    evaluator: &E,
    resolver: &P,
) -> ApplyResult<Resource>
where
    E: ExpressionEvaluator + ?Sized,
    P: PathResolver + ?Sized,
{
    for dynamic_value in &template.dynamic_value {
        let Some(expression) = dynamic_value.expression.text() else {
            tracing::debug!(path = %dynamic_value.path, "skipping dynamic value without expression");
            continue;
        };

        let failed = |cause: DynamicValueCause| ApplyError::DynamicValue {
            path: dynamic_value.path.clone(),
            source: cause,
        };

        let value = evaluator
            .evaluate(template, expression, subject)
            .map_err(|e| failed(e.into()))?
            .into_element();

        resolver
            .set_value(&mut resource, &dynamic_value.path, value)
            .map_err(|e| failed(e.into()))?;

        tracing::debug!(path = %dynamic_value.path, "applied dynamic value");
    }

    Ok(resource)
}

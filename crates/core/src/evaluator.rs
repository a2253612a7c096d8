//! Literal expression evaluator.
//!
//! Stands in for a CQL/FHIRPath engine where none is wired up (the CLI, the REST runner, tests).
//! It understands literals only:
//!
//! | Expression | Result |
//! |---|---|
//! | `true`, `false` | raw boolean |
//! | `42`, `-3` | integer |
//! | `2.5` | decimal |
//! | `'text'` | string (`\'` and `\\` escapes) |
//! | `{...}`, `[...]` | FHIR JSON element |
//! | `null`, `{}` | empty (removes the member) |
//! | `%subject` | Reference to the apply subject |
//!
//! Anything else is an evaluation error.

use crate::dynamic_values::{Evaluation, ExpressionEvaluator};
use crate::error::EvaluationError;
use fhir::{ActivityDefinition, ElementValue};

#[derive(Clone, Copy, Debug, Default)]
pub struct LiteralEvaluator;

impl ExpressionEvaluator for LiteralEvaluator {
    fn evaluate(
        &self,
        _template: &ActivityDefinition,
        expression: &str,
        subject: &str,
    ) -> Result<Evaluation, EvaluationError> {
        let expression = expression.trim();

        match expression {
            "true" => return Ok(Evaluation::Boolean(true)),
            "false" => return Ok(Evaluation::Boolean(false)),
            "null" | "{}" => return Ok(Evaluation::Value(ElementValue::Empty)),
            "%subject" => {
                return Ok(Evaluation::Value(ElementValue::Element(
                    serde_json::json!({ "reference": subject }),
                )))
            }
            _ => {}
        }

        if let Some(inner) = expression
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
        {
            return unquote(inner).map(|s| Evaluation::Value(ElementValue::String(s)));
        }

        if expression.starts_with('{') || expression.starts_with('[') {
            return serde_json::from_str(expression)
                .map(|v| Evaluation::Value(ElementValue::Element(v)))
                .map_err(|e| EvaluationError(format!("invalid element literal: {e}")));
        }

        if let Ok(i) = expression.parse::<i64>() {
            return Ok(Evaluation::Value(ElementValue::Integer(i)));
        }

        if looks_like_decimal(expression) {
            if let Ok(d) = expression.parse::<f64>() {
                return Ok(Evaluation::Value(ElementValue::Decimal(d)));
            }
        }

        Err(EvaluationError(format!(
            "unsupported expression {expression:?}: only literals can be evaluated"
        )))
    }
}

/// Plain `[-]digits.digits`, so that `inf`/`NaN` and exponents stay unsupported.
fn looks_like_decimal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let frac = parts.next().unwrap_or_default();
    !whole.is_empty()
        && !frac.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

fn unquote(inner: &str) -> Result<String, EvaluationError> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('\'' | '\\')) => out.push(escaped),
                Some(other) => {
                    return Err(EvaluationError(format!(
                        "unsupported escape \\{other} in string literal"
                    )))
                }
                None => {
                    return Err(EvaluationError(
                        "string literal ends with a lone backslash".into(),
                    ))
                }
            },
            '\'' => {
                return Err(EvaluationError(
                    "unescaped quote inside string literal".into(),
                ))
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expression: &str) -> Result<Evaluation, EvaluationError> {
        LiteralEvaluator.evaluate(&ActivityDefinition::default(), expression, "Patient/1")
    }

    #[test]
    fn booleans_are_raw() {
        assert_eq!(eval("true").unwrap(), Evaluation::Boolean(true));
        assert_eq!(eval(" false ").unwrap(), Evaluation::Boolean(false));
    }

    #[test]
    fn numbers() {
        assert_eq!(eval("42").unwrap(), Evaluation::Value(ElementValue::Integer(42)));
        assert_eq!(eval("-2.5").unwrap(), Evaluation::Value(ElementValue::Decimal(-2.5)));
        assert!(eval("NaN").is_err());
        assert!(eval("1e3").is_err());
    }

    #[test]
    fn strings_and_escapes() {
        assert_eq!(
            eval(r"'O\'Brien'").unwrap(),
            Evaluation::Value(ElementValue::String("O'Brien".into()))
        );
        assert!(eval("'a'b'").is_err());
        assert!(eval(r"'bad\n'").is_err());
    }

    #[test]
    fn elements_and_empty() {
        assert_eq!(
            eval(r#"{"text":"CBC"}"#).unwrap(),
            Evaluation::Value(ElementValue::Element(serde_json::json!({ "text": "CBC" })))
        );
        assert_eq!(eval("null").unwrap(), Evaluation::Value(ElementValue::Empty));
        assert!(eval("{not json").is_err());
    }

    #[test]
    fn subject_reference() {
        assert_eq!(
            eval("%subject").unwrap(),
            Evaluation::Value(ElementValue::Element(serde_json::json!({ "reference": "Patient/1" })))
        );
    }

    #[test]
    fn non_literals_are_rejected() {
        let err = eval("Today() + 1 day").unwrap_err();
        assert!(err.0.contains("only literals"));
    }
}

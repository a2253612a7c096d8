//! Per-kind required/forbidden template fields.
//!
//! Each record kind accepts only a subset of the optional template fields. The subset is a
//! table rather than code so that it can be read, and tested, kind by kind:
//!
//! | Kind | Required | Forbidden |
//! |---|---|---|
//! | ServiceRequest | code (unless dynamic values are declared) | product, dosage |
//! | MedicationRequest | product | bodySite, code, quantity |
//! | SupplyRequest | quantity | product, dosage, bodySite |
//! | DiagnosticReport | code | |
//!
//! Task, Procedure, Communication and CommunicationRequest accept every field.

use crate::error::{ApplyError, ApplyResult};
use fhir::{ActivityDefinition, RecordKind};

/// Template fields whose presence is constrained by kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateField {
    Code,
    BodySite,
    Product,
    Dosage,
    Quantity,
}

impl TemplateField {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateField::Code => "code",
            TemplateField::BodySite => "bodySite",
            TemplateField::Product => "product",
            TemplateField::Dosage => "dosage",
            TemplateField::Quantity => "quantity",
        }
    }

    pub fn is_present(self, template: &ActivityDefinition) -> bool {
        match self {
            TemplateField::Code => template.has_code(),
            TemplateField::BodySite => template.has_body_site(),
            TemplateField::Product => template.has_product(),
            TemplateField::Dosage => template.has_dosage(),
            TemplateField::Quantity => template.has_quantity(),
        }
    }
}

impl std::fmt::Display for TemplateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    Always,
    /// Satisfied by any declared dynamic value, which may set the field after mapping.
    UnlessDynamicValues,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldRules {
    pub required: &'static [(TemplateField, Requirement)],
    pub forbidden: &'static [TemplateField],
}

const UNCONSTRAINED: FieldRules = FieldRules {
    required: &[],
    forbidden: &[],
};

const SERVICE_REQUEST: FieldRules = FieldRules {
    required: &[(TemplateField::Code, Requirement::UnlessDynamicValues)],
    forbidden: &[TemplateField::Product, TemplateField::Dosage],
};

const MEDICATION_REQUEST: FieldRules = FieldRules {
    required: &[(TemplateField::Product, Requirement::Always)],
    forbidden: &[
        TemplateField::BodySite,
        TemplateField::Code,
        TemplateField::Quantity,
    ],
};

const SUPPLY_REQUEST: FieldRules = FieldRules {
    required: &[(TemplateField::Quantity, Requirement::Always)],
    forbidden: &[
        TemplateField::Product,
        TemplateField::Dosage,
        TemplateField::BodySite,
    ],
};

const DIAGNOSTIC_REPORT: FieldRules = FieldRules {
    required: &[(TemplateField::Code, Requirement::Always)],
    forbidden: &[],
};

impl FieldRules {
    pub fn for_kind(kind: RecordKind) -> &'static FieldRules {
        match kind {
            RecordKind::ServiceRequest => &SERVICE_REQUEST,
            RecordKind::MedicationRequest => &MEDICATION_REQUEST,
            RecordKind::SupplyRequest => &SUPPLY_REQUEST,
            RecordKind::DiagnosticReport => &DIAGNOSTIC_REPORT,
            RecordKind::Task
            | RecordKind::Procedure
            | RecordKind::Communication
            | RecordKind::CommunicationRequest => &UNCONSTRAINED,
        }
    }

    /// Check `template` against these rules, stopping at the first violation.
    ///
    /// Required fields are checked before forbidden ones, each in table order.
    pub fn check(&self, kind: RecordKind, template: &ActivityDefinition) -> ApplyResult<()> {
        for &(field, requirement) in self.required {
            let waived =
                requirement == Requirement::UnlessDynamicValues && template.has_dynamic_value();
            if !waived && !field.is_present(template) {
                return Err(ApplyError::MissingRequiredField { kind, field });
            }
        }

        if let Some(&field) = self.forbidden.iter().find(|f| f.is_present(template)) {
            return Err(ApplyError::IllegalFieldForKind { kind, field });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir::{CodeableConcept, DynamicValue, Expression, Quantity, Reference};

    fn template() -> ActivityDefinition {
        ActivityDefinition::default()
    }

    #[test]
    fn unconstrained_kinds_accept_everything() {
        let mut t = template();
        t.code = Some(CodeableConcept::from_text("x"));
        t.product_reference = Some(Reference::new("Medication/1"));
        t.quantity = Some(Quantity::new(1.0, "box"));
        for kind in [
            RecordKind::Task,
            RecordKind::Procedure,
            RecordKind::Communication,
            RecordKind::CommunicationRequest,
        ] {
            assert!(FieldRules::for_kind(kind).check(kind, &t).is_ok(), "{kind}");
            assert!(FieldRules::for_kind(kind).check(kind, &template()).is_ok(), "{kind}");
        }
    }

    #[test]
    fn service_request_code_waived_by_dynamic_values() {
        let kind = RecordKind::ServiceRequest;
        let rules = FieldRules::for_kind(kind);

        let err = rules.check(kind, &template()).unwrap_err();
        assert!(matches!(
            err,
            ApplyError::MissingRequiredField { field: TemplateField::Code, .. }
        ));

        let mut t = template();
        t.dynamic_value
            .push(DynamicValue::new("code", Expression::new("text/cql", "'CBC'")));
        assert!(rules.check(kind, &t).is_ok());
    }

    #[test]
    fn required_checked_before_forbidden() {
        let kind = RecordKind::SupplyRequest;
        let mut t = template();
        t.product_reference = Some(Reference::new("Device/1"));
        let err = FieldRules::for_kind(kind).check(kind, &t).unwrap_err();
        assert!(matches!(
            err,
            ApplyError::MissingRequiredField { field: TemplateField::Quantity, .. }
        ));
    }

    #[test]
    fn forbidden_fields_reported_in_table_order() {
        let kind = RecordKind::MedicationRequest;
        let mut t = template();
        t.product_reference = Some(Reference::new("Medication/1"));
        t.code = Some(CodeableConcept::from_text("x"));
        t.body_site = vec![CodeableConcept::from_text("arm")];
        let err = FieldRules::for_kind(kind).check(kind, &t).unwrap_err();
        assert!(matches!(
            err,
            ApplyError::IllegalFieldForKind { field: TemplateField::BodySite, .. }
        ));
        assert_eq!(err.to_string(), "bodySite does not map to MedicationRequest");
    }
}

//! Mappers for the request kinds: ServiceRequest, MedicationRequest, SupplyRequest.

use crate::context::ApplyContext;
use fhir::{
    ActivityDefinition, MedicationRequest, MedicationRequestIntent, Product, RequestIntent,
    RequestStatus, ServiceRequest, SupplyRequest,
};

pub(crate) fn map_service_request(
    template: &ActivityDefinition,
    ctx: &ApplyContext,
) -> ServiceRequest {
    let mut request = ServiceRequest::new(
        RequestStatus::Draft,
        RequestIntent::Order,
        ctx.subject_reference(),
    );

    // Practitioner takes precedence; the organization is only a fallback.
    request.requester = ctx
        .practitioner_reference()
        .or_else(|| ctx.organization_reference());

    if template.has_extension() {
        request.extension = template.extension.clone();
    }

    if let Some(code) = template.code() {
        request.code = Some(code.clone());
    }

    if template.has_body_site() {
        request.body_site = template.body_site.clone();
    }

    request
}

pub(crate) fn map_medication_request(
    template: &ActivityDefinition,
    ctx: &ApplyContext,
) -> MedicationRequest {
    let mut request = MedicationRequest::new(MedicationRequestIntent::Order, ctx.subject_reference());

    match template.product() {
        Some(Product::Reference(reference)) => request.medication_reference = Some(reference),
        Some(Product::CodeableConcept(concept)) => {
            request.medication_codeable_concept = Some(concept)
        }
        None => {}
    }

    if template.has_dosage() {
        request.dosage_instruction = template.dosage.clone();
    }

    request
}

pub(crate) fn map_supply_request(
    template: &ActivityDefinition,
    ctx: &ApplyContext,
) -> SupplyRequest {
    let mut request = SupplyRequest::default();

    // Assigned in turn: when both are supplied the organization is the one kept.
    if let Some(practitioner) = ctx.practitioner_reference() {
        request.requester = Some(practitioner);
    }
    if let Some(organization) = ctx.organization_reference() {
        request.requester = Some(organization);
    }

    if let Some(quantity) = template.quantity() {
        request.quantity = Some(quantity.clone());
    }

    if let Some(code) = template.code() {
        request.item_codeable_concept = Some(code.clone());
    }

    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::test_support::{context, context_with, template};
    use fhir::{CodeableConcept, Dosage, Quantity, Reference};

    #[test]
    fn service_request_defaults() {
        let mut t = template("ServiceRequest");
        t.code = Some(CodeableConcept::from_text("CBC"));
        t.body_site = vec![CodeableConcept::from_text("left arm")];

        let request = map_service_request(&t, &context());
        assert_eq!(request.status, RequestStatus::Draft);
        assert_eq!(request.intent, RequestIntent::Order);
        assert_eq!(request.subject, Reference::new("Patient/p1"));
        assert_eq!(request.requester, None);
        assert_eq!(request.code, Some(CodeableConcept::from_text("CBC")));
        assert_eq!(request.body_site, vec![CodeableConcept::from_text("left arm")]);
    }

    #[test]
    fn service_request_requester_prefers_practitioner() {
        let t = template("ServiceRequest");

        let both = map_service_request(&t, &context_with(Some("Practitioner/1"), Some("Organization/2")));
        assert_eq!(both.requester, Some(Reference::new("Practitioner/1")));

        let org_only = map_service_request(&t, &context_with(None, Some("Organization/2")));
        assert_eq!(org_only.requester, Some(Reference::new("Organization/2")));
    }

    #[test]
    fn medication_request_maps_product_and_dosage() {
        let mut t = template("MedicationRequest");
        t.product_reference = Some(Reference::new("Medication/amlodipine"));
        t.dosage = vec![Dosage {
            text: Some("5 mg once daily".into()),
            ..Dosage::default()
        }];

        let request = map_medication_request(&t, &context());
        assert_eq!(request.intent, MedicationRequestIntent::Order);
        assert_eq!(request.status, None);
        assert_eq!(request.subject, Reference::new("Patient/p1"));
        assert_eq!(request.medication_reference, Some(Reference::new("Medication/amlodipine")));
        assert_eq!(request.medication_codeable_concept, None);
        assert_eq!(request.dosage_instruction.len(), 1);
    }

    #[test]
    fn medication_request_accepts_coded_product() {
        let mut t = template("MedicationRequest");
        t.product_codeable_concept = Some(CodeableConcept::from_text("Amlodipine 5 MG"));
        let request = map_medication_request(&t, &context());
        assert_eq!(
            request.medication_codeable_concept,
            Some(CodeableConcept::from_text("Amlodipine 5 MG"))
        );
    }

    #[test]
    fn supply_request_maps_quantity_and_item() {
        let mut t = template("SupplyRequest");
        t.quantity = Some(Quantity::new(10.0, "box"));
        t.code = Some(CodeableConcept::from_text("Gauze"));

        let request = map_supply_request(&t, &context_with(Some("Practitioner/1"), None));
        assert_eq!(request.quantity, Some(Quantity::new(10.0, "box")));
        assert_eq!(request.item_codeable_concept, Some(CodeableConcept::from_text("Gauze")));
        assert_eq!(request.requester, Some(Reference::new("Practitioner/1")));
        assert_eq!(request.status, None);
    }

    #[test]
    fn supply_request_organization_overrides_practitioner() {
        let t = template("SupplyRequest");
        let request =
            map_supply_request(&t, &context_with(Some("Practitioner/1"), Some("Organization/2")));
        assert_eq!(request.requester, Some(Reference::new("Organization/2")));
    }
}

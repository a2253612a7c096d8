//! Field mappers: one pure function per record kind.
//!
//! A mapper sets the kind's fixed defaults and copies the template fields that are legal for
//! the kind. Mappers never fail; whether the template is acceptable for the kind is decided by
//! [`rules::FieldRules`], which the dispatcher checks once the record is built.

mod communication;
mod events;
mod requests;
pub mod rules;
mod task;

use crate::context::ApplyContext;
use fhir::{ActivityDefinition, RecordKind, Resource};

/// Build the base record of `kind` from `template`.
pub fn map_record(kind: RecordKind, template: &ActivityDefinition, ctx: &ApplyContext) -> Resource {
    match kind {
        RecordKind::Task => task::map(template).into(),
        RecordKind::ServiceRequest => requests::map_service_request(template, ctx).into(),
        RecordKind::MedicationRequest => requests::map_medication_request(template, ctx).into(),
        RecordKind::SupplyRequest => requests::map_supply_request(template, ctx).into(),
        RecordKind::Procedure => events::map_procedure(template, ctx).into(),
        RecordKind::DiagnosticReport => events::map_diagnostic_report(template, ctx).into(),
        RecordKind::Communication => communication::map_communication(template, ctx).into(),
        RecordKind::CommunicationRequest => {
            communication::map_communication_request(template, ctx).into()
        }
    }
}

//! Mappers for Procedure and DiagnosticReport.

use crate::context::ApplyContext;
use fhir::{
    ActivityDefinition, Attachment, DiagnosticReport, DiagnosticReportStatus, EventStatus,
    Procedure,
};

pub(crate) fn map_procedure(template: &ActivityDefinition, ctx: &ApplyContext) -> Procedure {
    let mut procedure = Procedure::new(EventStatus::Unknown, ctx.subject_reference());

    if let Some(code) = template.code() {
        procedure.code = Some(code.clone());
    }

    if template.has_body_site() {
        procedure.body_site = template.body_site.clone();
    }

    procedure
}

pub(crate) fn map_diagnostic_report(
    template: &ActivityDefinition,
    ctx: &ApplyContext,
) -> DiagnosticReport {
    let mut report = DiagnosticReport::new(DiagnosticReportStatus::Unknown, ctx.subject_reference());

    if let Some(code) = template.code() {
        report.code = Some(code.clone());
    }

    report.presented_form = template
        .related_artifact
        .iter()
        .map(|artifact| Attachment {
            url: artifact.url().map(str::to_string),
            title: artifact.display().map(str::to_string),
            ..Attachment::default()
        })
        .collect();

    report
}

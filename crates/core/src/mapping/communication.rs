//! Mappers for Communication and CommunicationRequest.

use crate::context::ApplyContext;
use fhir::{
    ActivityDefinition, Attachment, Communication, CommunicationRequest, EventStatus,
    PayloadComponent, RequestStatus,
};

pub(crate) fn map_communication(template: &ActivityDefinition, ctx: &ApplyContext) -> Communication {
    let mut communication = Communication::new(EventStatus::Unknown, ctx.subject_reference());

    if let Some(code) = template.code() {
        communication.reason_code = vec![code.clone()];
    }

    // Only the first artifact with a url becomes payload; the rest are dropped.
    let first_linked = template
        .related_artifact
        .iter()
        .find_map(|artifact| artifact.url().map(|url| (url, artifact.display())));
    if let Some((url, display)) = first_linked {
        let mut attachment = Attachment::from_url(url);
        if let Some(display) = display {
            attachment = attachment.with_title(display);
        }
        communication.payload = vec![PayloadComponent::attachment(attachment)];
    }

    communication
}

pub(crate) fn map_communication_request(
    template: &ActivityDefinition,
    ctx: &ApplyContext,
) -> CommunicationRequest {
    let mut request = CommunicationRequest::new(RequestStatus::Unknown, ctx.subject_reference());

    if let Some(text) = template.code().and_then(|code| code.text()) {
        request.payload.push(PayloadComponent::string(text));
    }

    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::test_support::{context, template};
    use fhir::{CodeableConcept, Coding, Reference, RelatedArtifact};

    fn artifact(url: Option<&str>, display: Option<&str>) -> RelatedArtifact {
        RelatedArtifact {
            artifact_type: Some("documentation".into()),
            url: url.map(str::to_string),
            display: display.map(str::to_string),
        }
    }

    #[test]
    fn communication_uses_code_as_reason() {
        let mut t = template("Communication");
        t.code = Some(CodeableConcept::from_text("Smoking cessation"));

        let communication = map_communication(&t, &context());
        assert_eq!(communication.status, EventStatus::Unknown);
        assert_eq!(communication.subject, Reference::new("Patient/p1"));
        assert_eq!(
            communication.reason_code,
            vec![CodeableConcept::from_text("Smoking cessation")]
        );
        assert!(communication.payload.is_empty());
    }

    #[test]
    fn communication_attaches_first_artifact_with_url_only() {
        let mut t = template("Communication");
        t.related_artifact = vec![
            artifact(None, Some("no url")),
            artifact(Some("http://example.org/leaflet"), Some("Leaflet")),
            artifact(Some("http://example.org/video"), Some("Video")),
        ];

        let communication = map_communication(&t, &context());
        assert_eq!(
            communication.payload,
            vec![PayloadComponent::attachment(
                Attachment::from_url("http://example.org/leaflet").with_title("Leaflet")
            )]
        );
    }

    #[test]
    fn communication_attachment_without_display_has_no_title() {
        let mut t = template("Communication");
        t.related_artifact = vec![artifact(Some("http://example.org/leaflet"), None)];

        let communication = map_communication(&t, &context());
        let attachment = communication.payload[0].content_attachment.as_ref().unwrap();
        assert_eq!(attachment.url.as_deref(), Some("http://example.org/leaflet"));
        assert_eq!(attachment.title, None);
    }

    #[test]
    fn communication_request_payload_from_code_text() {
        let mut t = template("CommunicationRequest");
        t.code = Some(CodeableConcept::from_text("Remind patient to fast"));

        let request = map_communication_request(&t, &context());
        assert_eq!(request.status, RequestStatus::Unknown);
        assert_eq!(
            request.payload,
            vec![PayloadComponent::string("Remind patient to fast")]
        );
    }

    #[test]
    fn communication_request_without_code_text_has_no_payload() {
        let mut t = template("CommunicationRequest");
        t.code = Some(CodeableConcept::from_coding(Coding::new("http://snomed.info/sct", "1234")));

        let request = map_communication_request(&t, &context());
        assert!(request.payload.is_empty());
        assert!(map_communication_request(&template("CommunicationRequest"), &context())
            .payload
            .is_empty());
    }
}

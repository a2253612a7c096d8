//! FHIR-aligned record shapes produced by `$apply`.
//!
//! One struct per target kind plus the [`Resource`] tagged union over them. The structs mirror
//! the subset of each FHIR R4 resource that apply writes or that dynamic values commonly
//! target. They serialise to FHIR JSON (`resourceType` comes from the union tag).
//!
//! Record structs and the typed datatypes use `#[serde(deny_unknown_fields)]` so that a path
//! write naming a member the record (or a nested element) does not have is rejected rather than
//! silently dropped.

use crate::datatypes::{
    Attachment, BooleanType, CodeableConcept, Dosage, Extension, Quantity, Reference,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Record kinds
// ============================================================================

/// The eight record kinds an ActivityDefinition can resolve to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Task,
    ServiceRequest,
    MedicationRequest,
    SupplyRequest,
    Procedure,
    DiagnosticReport,
    Communication,
    CommunicationRequest,
}

impl RecordKind {
    pub const ALL: [RecordKind; 8] = [
        RecordKind::Task,
        RecordKind::ServiceRequest,
        RecordKind::MedicationRequest,
        RecordKind::SupplyRequest,
        RecordKind::Procedure,
        RecordKind::DiagnosticReport,
        RecordKind::Communication,
        RecordKind::CommunicationRequest,
    ];

    /// Exact (case-sensitive) match of a FHIR resource type code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_code() == code)
    }

    pub fn as_code(self) -> &'static str {
        match self {
            RecordKind::Task => "Task",
            RecordKind::ServiceRequest => "ServiceRequest",
            RecordKind::MedicationRequest => "MedicationRequest",
            RecordKind::SupplyRequest => "SupplyRequest",
            RecordKind::Procedure => "Procedure",
            RecordKind::DiagnosticReport => "DiagnosticReport",
            RecordKind::Communication => "Communication",
            RecordKind::CommunicationRequest => "CommunicationRequest",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

// ============================================================================
// Value sets
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Draft,
    Requested,
    Received,
    Accepted,
    Rejected,
    Ready,
    Cancelled,
    InProgress,
    OnHold,
    Failed,
    Completed,
    EnteredInError,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskIntent {
    Unknown,
    Proposal,
    Plan,
    Order,
    OriginalOrder,
    ReflexOrder,
    FillerOrder,
    InstanceOrder,
    Option,
}

/// Status of ServiceRequest and CommunicationRequest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Draft,
    Active,
    OnHold,
    Revoked,
    Completed,
    EnteredInError,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestIntent {
    Proposal,
    Plan,
    Directive,
    Order,
    OriginalOrder,
    ReflexOrder,
    FillerOrder,
    InstanceOrder,
    Option,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestPriority {
    Routine,
    Urgent,
    Asap,
    Stat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MedicationRequestStatus {
    Active,
    OnHold,
    Cancelled,
    Completed,
    EnteredInError,
    Stopped,
    Draft,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MedicationRequestIntent {
    Proposal,
    Plan,
    Order,
    OriginalOrder,
    ReflexOrder,
    FillerOrder,
    InstanceOrder,
    Option,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupplyRequestStatus {
    Draft,
    Active,
    Suspended,
    Cancelled,
    Completed,
    EnteredInError,
    Unknown,
}

/// Status of Procedure and Communication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    Preparation,
    InProgress,
    NotDone,
    OnHold,
    Stopped,
    Completed,
    EnteredInError,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticReportStatus {
    Registered,
    Partial,
    Preliminary,
    Final,
    Amended,
    Corrected,
    Appended,
    Cancelled,
    EnteredInError,
    Unknown,
}

// ============================================================================
// Shared components
// ============================================================================

/// `payload` entry of Communication and CommunicationRequest; `content[x]` is a choice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PayloadComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_string: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_attachment: Option<Attachment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_reference: Option<Reference>,
}

impl PayloadComponent {
    pub fn string(text: impl Into<String>) -> Self {
        Self {
            content_string: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn attachment(attachment: Attachment) -> Self {
        Self {
            content_attachment: Some(attachment),
            ..Self::default()
        }
    }
}

// ============================================================================
// Records
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    pub status: TaskStatus,

    pub intent: TaskIntent,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<RequestPriority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "for", default, skip_serializing_if = "Option::is_none")]
    pub for_: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,
}

impl Task {
    pub fn new(status: TaskStatus, intent: TaskIntent) -> Self {
        Self {
            id: None,
            extension: Vec::new(),
            status,
            intent,
            priority: None,
            code: None,
            description: None,
            for_: None,
            authored_on: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    pub status: RequestStatus,

    pub intent: RequestIntent,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<RequestPriority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_not_perform: Option<BooleanType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    pub subject: Reference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_date_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_site: Vec<CodeableConcept>,
}

impl ServiceRequest {
    pub fn new(status: RequestStatus, intent: RequestIntent, subject: Reference) -> Self {
        Self {
            id: None,
            extension: Vec::new(),
            status,
            intent,
            priority: None,
            do_not_perform: None,
            code: None,
            subject,
            occurrence_date_time: None,
            authored_on: None,
            requester: None,
            body_site: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MedicationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MedicationRequestStatus>,

    pub intent: MedicationRequestIntent,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<RequestPriority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_not_perform: Option<BooleanType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_codeable_concept: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_reference: Option<Reference>,

    pub subject: Reference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dosage_instruction: Vec<Dosage>,
}

impl MedicationRequest {
    pub fn new(intent: MedicationRequestIntent, subject: Reference) -> Self {
        Self {
            id: None,
            status: None,
            intent,
            priority: None,
            do_not_perform: None,
            medication_codeable_concept: None,
            medication_reference: None,
            subject,
            authored_on: None,
            requester: None,
            dosage_instruction: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SupplyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SupplyRequestStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<RequestPriority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_codeable_concept: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_reference: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Procedure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub status: EventStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    pub subject: Reference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_date_time: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_site: Vec<CodeableConcept>,
}

impl Procedure {
    pub fn new(status: EventStatus, subject: Reference) -> Self {
        Self {
            id: None,
            status,
            code: None,
            subject,
            performed_date_time: None,
            body_site: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DiagnosticReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub status: DiagnosticReportStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    pub subject: Reference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presented_form: Vec<Attachment>,
}

impl DiagnosticReport {
    pub fn new(status: DiagnosticReportStatus, subject: Reference) -> Self {
        Self {
            id: None,
            status,
            code: None,
            subject,
            conclusion: None,
            presented_form: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Communication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub status: EventStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<RequestPriority>,

    pub subject: Reference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reason_code: Vec<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<PayloadComponent>,
}

impl Communication {
    pub fn new(status: EventStatus, subject: Reference) -> Self {
        Self {
            id: None,
            status,
            priority: None,
            subject,
            sent: None,
            reason_code: Vec::new(),
            payload: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommunicationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub status: RequestStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<RequestPriority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_not_perform: Option<BooleanType>,

    pub subject: Reference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<PayloadComponent>,
}

impl CommunicationRequest {
    pub fn new(status: RequestStatus, subject: Reference) -> Self {
        Self {
            id: None,
            status,
            priority: None,
            do_not_perform: None,
            subject,
            authored_on: None,
            payload: Vec::new(),
        }
    }
}

// ============================================================================
// Tagged union
// ============================================================================

/// A record produced by `$apply`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Task(Task),
    ServiceRequest(ServiceRequest),
    MedicationRequest(MedicationRequest),
    SupplyRequest(SupplyRequest),
    Procedure(Procedure),
    DiagnosticReport(DiagnosticReport),
    Communication(Communication),
    CommunicationRequest(CommunicationRequest),
}

impl Resource {
    pub fn kind(&self) -> RecordKind {
        match self {
            Resource::Task(_) => RecordKind::Task,
            Resource::ServiceRequest(_) => RecordKind::ServiceRequest,
            Resource::MedicationRequest(_) => RecordKind::MedicationRequest,
            Resource::SupplyRequest(_) => RecordKind::SupplyRequest,
            Resource::Procedure(_) => RecordKind::Procedure,
            Resource::DiagnosticReport(_) => RecordKind::DiagnosticReport,
            Resource::Communication(_) => RecordKind::Communication,
            Resource::CommunicationRequest(_) => RecordKind::CommunicationRequest,
        }
    }

    /// FHIR JSON form of the record, including `resourceType`.
    pub fn to_json(&self) -> Result<serde_json::Value, crate::FhirError> {
        serde_json::to_value(self)
            .map_err(|e| crate::FhirError::Translation(format!("Failed to serialize record: {e}")))
    }
}

macro_rules! impl_from_record {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Resource {
                fn from(record: $variant) -> Self {
                    Resource::$variant(record)
                }
            }
        )*
    };
}

impl_from_record!(
    Task,
    ServiceRequest,
    MedicationRequest,
    SupplyRequest,
    Procedure,
    DiagnosticReport,
    Communication,
    CommunicationRequest,
);

//! FHIR R4 general-purpose data types used by templates and produced records.
//!
//! These are plain data carriers. They serialise to FHIR JSON field names (camelCase) and skip
//! absent values so that a produced record renders the way a FHIR server would return it.
//!
//! Presence follows FHIR `has*` semantics: an element that carries no value (empty string,
//! empty list, concept with neither coding nor text) is treated as absent by the `has_*`/
//! `is_empty` helpers.

use serde::{Deserialize, Serialize};

/// A reference to a code defined by a terminology system.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_selected: Option<bool>,
}

impl Coding {
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

/// A concept expressed as zero or more codings plus an optional plain-text rendering.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Concept carrying only a text rendering.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Concept carrying a single coding.
    pub fn from_coding(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
            ..Self::default()
        }
    }

    pub fn with_coding(mut self, coding: Coding) -> Self {
        self.coding.push(coding);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Text rendering, if one is present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.coding.is_empty() && self.text().is_none()
    }
}

/// A reference from one resource to another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Type the reference refers to, e.g. `Patient`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<String>,

    /// Logical reference as a FHIR `Identifier`, kept as raw JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    /// Reference whose `reference` is the given literal id, used verbatim.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reference.as_deref().is_none_or(str::is_empty)
            && self.display.as_deref().is_none_or(str::is_empty)
            && self.identifier.is_none()
    }
}

/// A measured amount.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Quantity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    /// `<` | `<=` | `>=` | `>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Quantity {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            unit: Some(unit.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.unit.is_none() && self.system.is_none() && self.code.is_none()
    }
}

/// Content in a format defined elsewhere, referenced by url.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Inline content, base64 encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation: Option<String>,
}

impl Attachment {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// An opaque extension. The `value[x]` member (and anything else besides `url`) is kept
/// verbatim so extensions survive a template-to-record copy unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub url: String,

    #[serde(flatten)]
    pub value: serde_json::Map<String, serde_json::Value>,
}

impl Extension {
    pub fn new(url: impl Into<String>, value_key: &str, value: serde_json::Value) -> Self {
        let mut map = serde_json::Map::new();
        map.insert(value_key.to_string(), value);
        Self {
            url: url.into(),
            value: map,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_empty() && self.value.is_empty()
    }
}

/// Related artifacts such as documentation or supporting material.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedArtifact {
    /// documentation | justification | citation | predecessor | successor | derived-from |
    /// depends-on | composed-of
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl RelatedArtifact {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn display(&self) -> Option<&str> {
        self.display.as_deref().filter(|d| !d.is_empty())
    }
}

/// How a medication is or should be taken.
///
/// Only the commonly authored members are typed; the rest (`timing`, `doseAndRate`, ...) are
/// kept as raw JSON so that copying a dosage from a template loses nothing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dosage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<CodeableConcept>,

    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl Dosage {
    pub fn is_empty(&self) -> bool {
        self.sequence.is_none()
            && self.text.as_deref().is_none_or(str::is_empty)
            && self.route.as_ref().is_none_or(CodeableConcept::is_empty)
            && self.other.is_empty()
    }
}

/// An expression in a named language, as carried by `ActivityDefinition.dynamicValue`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl Expression {
    pub fn new(language: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            expression: Some(expression.into()),
        }
    }

    /// Expression text, if present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.expression.as_deref().filter(|e| !e.is_empty())
    }
}

/// The FHIR `boolean` primitive as an element.
///
/// Evaluators hand back raw `bool`s; values written into a record go through this wrapper so
/// the write carries an element rather than a host primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BooleanType(bool);

impl BooleanType {
    pub fn new(value: bool) -> Self {
        Self(value)
    }

    pub fn value(self) -> bool {
        self.0
    }
}

impl From<bool> for BooleanType {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

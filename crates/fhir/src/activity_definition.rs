//! FHIR-aligned ActivityDefinition wire model.
//!
//! An ActivityDefinition is the declarative template that `$apply` resolves into a concrete
//! record. This module owns:
//! - the template struct (FHIR JSON field names)
//! - parsing from JSON or YAML with field-path error reporting
//! - FHIR `has*` style accessors used by the mapping rules
//!
//! Notes:
//! - `kind` is kept as a free code so that unrecognised kinds are reported when the template is
//!   applied rather than when it is loaded
//! - Unknown members are ignored; real templates carry many elements (`meta`, `library`,
//!   `timing[x]`, ...) that apply does not use

use crate::datatypes::{
    CodeableConcept, Dosage, Expression, Extension, Quantity, Reference, RelatedArtifact,
};
use crate::FhirError;
use serde::{Deserialize, Serialize};

const RESOURCE_TYPE: &str = "ActivityDefinition";

/// A declarative activity template.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Publication status (draft | active | retired | unknown).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_artifact: Vec<RelatedArtifact>,

    /// Target record kind, e.g. `ServiceRequest`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_reference: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_codeable_concept: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dosage: Vec<Dosage>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_site: Vec<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dynamic_value: Vec<DynamicValue>,
}

/// A `(path, expression)` pair evaluated after base mapping and written into the record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicValue {
    pub path: String,

    #[serde(default)]
    pub expression: Expression,
}

impl DynamicValue {
    pub fn new(path: impl Into<String>, expression: Expression) -> Self {
        Self {
            path: path.into(),
            expression,
        }
    }
}

/// The `product[x]` choice of an ActivityDefinition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Product {
    Reference(Reference),
    CodeableConcept(CodeableConcept),
}

/// Serialisation format of a template document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateFormat {
    Json,
    Yaml,
}

impl TemplateFormat {
    /// Format implied by a file extension (`json`, `yaml`, `yml`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl ActivityDefinition {
    /// Parse a template from JSON or YAML text.
    ///
    /// This uses `serde_path_to_error` to surface the path of the failing member (for example
    /// `dynamicValue[0].path`) when the document does not match the template schema.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if:
    /// - the text does not match the template schema,
    /// - `resourceType` is present but is not `ActivityDefinition`,
    /// - both `productReference` and `productCodeableConcept` are set.
    pub fn parse(text: &str, format: TemplateFormat) -> Result<Self, FhirError> {
        let parsed = match format {
            TemplateFormat::Json => {
                let mut deserializer = serde_json::Deserializer::from_str(text);
                let parsed =
                    serde_path_to_error::deserialize::<_, ActivityDefinition>(&mut deserializer)
                        .map_err(|err| {
                            schema_mismatch(err.path().to_string(), err.into_inner())
                        })?;
                deserializer
                    .end()
                    .map_err(|err| schema_mismatch(String::new(), err))?;
                parsed
            }
            TemplateFormat::Yaml => {
                let deserializer = serde_yaml::Deserializer::from_str(text);
                serde_path_to_error::deserialize::<_, ActivityDefinition>(deserializer)
                    .map_err(|err| schema_mismatch(err.path().to_string(), err.into_inner()))?
            }
        };

        parsed.validate()?;
        Ok(parsed)
    }

    pub fn parse_json(text: &str) -> Result<Self, FhirError> {
        Self::parse(text, TemplateFormat::Json)
    }

    pub fn parse_yaml(text: &str) -> Result<Self, FhirError> {
        Self::parse(text, TemplateFormat::Yaml)
    }

    fn validate(&self) -> Result<(), FhirError> {
        if let Some(resource_type) = self.resource_type.as_deref() {
            if resource_type != RESOURCE_TYPE {
                return Err(FhirError::Translation(format!(
                    "Expected resourceType {RESOURCE_TYPE}, found {resource_type}"
                )));
            }
        }

        if self.product_reference.is_some() && self.product_codeable_concept.is_some() {
            return Err(FhirError::Translation(
                "product[x] carries both productReference and productCodeableConcept".into(),
            ));
        }

        Ok(())
    }

    /// Kind code, or the empty string when the template declares none.
    pub fn kind_code(&self) -> &str {
        self.kind.as_deref().unwrap_or_default()
    }

    pub fn code(&self) -> Option<&CodeableConcept> {
        self.code.as_ref().filter(|c| !c.is_empty())
    }

    pub fn has_code(&self) -> bool {
        self.code().is_some()
    }

    pub fn has_extension(&self) -> bool {
        self.extension.iter().any(|ext| !ext.is_empty())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    pub fn has_body_site(&self) -> bool {
        self.body_site.iter().any(|site| !site.is_empty())
    }

    pub fn product(&self) -> Option<Product> {
        if let Some(reference) = self.product_reference.as_ref().filter(|r| !r.is_empty()) {
            return Some(Product::Reference(reference.clone()));
        }
        self.product_codeable_concept
            .as_ref()
            .filter(|c| !c.is_empty())
            .map(|c| Product::CodeableConcept(c.clone()))
    }

    pub fn has_product(&self) -> bool {
        self.product().is_some()
    }

    pub fn has_dosage(&self) -> bool {
        self.dosage.iter().any(|dosage| !dosage.is_empty())
    }

    pub fn quantity(&self) -> Option<&Quantity> {
        self.quantity.as_ref().filter(|q| !q.is_empty())
    }

    pub fn has_quantity(&self) -> bool {
        self.quantity().is_some()
    }

    pub fn has_dynamic_value(&self) -> bool {
        !self.dynamic_value.is_empty()
    }
}

fn schema_mismatch(path: String, source: impl std::fmt::Display) -> FhirError {
    let path = if path.is_empty() || path == "." {
        "<root>"
    } else {
        path.as_str()
    };
    FhirError::Translation(format!("Template schema mismatch at {path}: {source}"))
}

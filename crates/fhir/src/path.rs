//! Path-addressed writes into produced records.
//!
//! Dynamic values name their target with a dotted FHIR path such as `doNotPerform`,
//! `code.text` or `payload[0].contentString`. This module parses that restricted grammar and
//! writes a value at the path by editing the record's FHIR JSON tree and reading it back into
//! the same record type. The record is only replaced when the edited tree still fits its shape,
//! so a failed write leaves the record untouched.
//!
//! Grammar:
//!
//! ```text
//! path    := segment ("." segment)*
//! segment := name ("[" index "]")?
//! name    := [A-Za-z_][A-Za-z0-9_]*
//! ```
//!
//! A leading segment equal to the record's resource type (`ServiceRequest.status`) is accepted
//! and ignored.

use crate::datatypes::BooleanType;
use crate::resources::Resource;
use crate::FhirError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A value ready to be written into a record.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementValue {
    Boolean(BooleanType),
    Integer(i64),
    Decimal(f64),
    String(String),
    /// A structured element (CodeableConcept, Reference, ...) in FHIR JSON form.
    Element(Value),
    /// Removes the member at the path.
    Empty,
}

impl ElementValue {
    fn into_json(self) -> Result<Option<Value>, FhirError> {
        let value = match self {
            ElementValue::Boolean(b) => Value::Bool(b.value()),
            ElementValue::Integer(i) => Value::from(i),
            ElementValue::Decimal(d) => serde_json::Number::from_f64(d)
                .map(Value::Number)
                .ok_or_else(|| FhirError::Path(format!("decimal {d} is not a finite number")))?,
            ElementValue::String(s) => Value::String(s),
            ElementValue::Element(v) => v,
            ElementValue::Empty => return Ok(None),
        };
        Ok(Some(value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Segment {
    name: String,
    index: Option<usize>,
}

/// A parsed dotted field path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parse a dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Path`] for an empty path, an empty or malformed segment, or a
    /// malformed index.
    pub fn parse(path: &str) -> Result<Self, FhirError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(FhirError::Path("path cannot be empty".into()));
        }

        let mut segments = Vec::new();
        for raw in trimmed.split('.') {
            segments.push(parse_segment(raw, path)?);
        }

        Ok(Self { segments })
    }

    fn without_type_prefix(mut self, resource_type: &str) -> Result<Self, FhirError> {
        let first = &self.segments[0];
        if first.name == resource_type && first.index.is_none() {
            self.segments.remove(0);
            if self.segments.is_empty() {
                return Err(FhirError::Path(format!(
                    "path {resource_type} names the record itself, not a member"
                )));
            }
        }
        if self.segments[0].name == "resourceType" {
            return Err(FhirError::Path("resourceType cannot be written".into()));
        }
        Ok(self)
    }

    /// Write `value` at this path inside a JSON object tree.
    fn write(&self, tree: &mut Value, value: Option<Value>) -> Result<(), FhirError> {
        let (last, parents) = self
            .segments
            .split_last()
            .ok_or_else(|| FhirError::Path("path cannot be empty".into()))?;

        let mut node = tree;
        for segment in parents {
            node = descend(node, segment, self)?;
        }

        let object = node
            .as_object_mut()
            .ok_or_else(|| FhirError::Path(format!("{self}: parent of {} is not an element", last.name)))?;

        match (last.index, value) {
            (None, Some(value)) => {
                object.insert(last.name.clone(), value);
            }
            (None, None) => {
                object.remove(&last.name);
            }
            (Some(index), value) => {
                let array = object
                    .entry(last.name.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                let items = array
                    .as_array_mut()
                    .ok_or_else(|| FhirError::Path(format!("{self}: {} is not a list", last.name)))?;
                match value {
                    Some(value) if index < items.len() => items[index] = value,
                    Some(value) if index == items.len() => items.push(value),
                    None if index < items.len() => {
                        items.remove(index);
                    }
                    _ => {
                        return Err(FhirError::Path(format!(
                            "{self}: index {index} is out of range for {} (length {})",
                            last.name,
                            items.len()
                        )))
                    }
                }
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.name)?;
            if let Some(index) = segment.index {
                write!(f, "[{index}]")?;
            }
        }
        Ok(())
    }
}

fn parse_segment(raw: &str, path: &str) -> Result<Segment, FhirError> {
    let (name, index) = match raw.find('[') {
        Some(open) => {
            let close = raw
                .strip_suffix(']')
                .ok_or_else(|| FhirError::Path(format!("malformed index in path {path:?}")))?;
            let digits = &close[open + 1..];
            let index = digits
                .parse::<usize>()
                .map_err(|_| FhirError::Path(format!("malformed index in path {path:?}")))?;
            (&raw[..open], Some(index))
        }
        None => (raw, None),
    };

    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !valid {
        return Err(FhirError::Path(format!(
            "invalid segment {raw:?} in path {path:?}"
        )));
    }

    Ok(Segment {
        name: name.to_string(),
        index,
    })
}

/// Step into `segment`, creating missing intermediate elements.
fn descend<'a>(
    node: &'a mut Value,
    segment: &Segment,
    path: &FieldPath,
) -> Result<&'a mut Value, FhirError> {
    let object = node
        .as_object_mut()
        .ok_or_else(|| FhirError::Path(format!("{path}: parent of {} is not an element", segment.name)))?;

    let Some(index) = segment.index else {
        let child = object
            .entry(segment.name.clone())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        return Ok(child);
    };

    let array = object
        .entry(segment.name.clone())
        .or_insert_with(|| Value::Array(Vec::new()));
    let items = array
        .as_array_mut()
        .ok_or_else(|| FhirError::Path(format!("{path}: {} is not a list", segment.name)))?;
    if index == items.len() {
        items.push(Value::Object(serde_json::Map::new()));
    }
    let len = items.len();
    items.get_mut(index).ok_or_else(|| {
        FhirError::Path(format!(
            "{path}: index {index} is out of range for {} (length {len})",
            segment.name
        ))
    })
}

fn write_record<T>(record: &mut T, path: &FieldPath, value: Option<Value>) -> Result<(), FhirError>
where
    T: Serialize + DeserializeOwned,
{
    let mut tree = serde_json::to_value(&*record)
        .map_err(|e| FhirError::Path(format!("{path}: failed to serialize record: {e}")))?;

    path.write(&mut tree, value)?;

    let updated = serde_path_to_error::deserialize::<_, T>(tree).map_err(|err| {
        let at = err.path().to_string();
        let source = err.into_inner();
        let at = if at.is_empty() || at == "." {
            "<root>".to_string()
        } else {
            at
        };
        FhirError::Path(format!("{path}: value does not fit the record at {at}: {source}"))
    })?;

    *record = updated;
    Ok(())
}

impl Resource {
    /// Write `value` into this record at the dotted `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Path`] if the path is malformed, names a member the record does not
    /// have, or the value's type does not fit the member. The record is unchanged on error.
    pub fn set_path(&mut self, path: &str, value: ElementValue) -> Result<(), FhirError> {
        let path = FieldPath::parse(path)?.without_type_prefix(self.kind().as_code())?;
        let value = value.into_json()?;

        match self {
            Resource::Task(r) => write_record(r, &path, value),
            Resource::ServiceRequest(r) => write_record(r, &path, value),
            Resource::MedicationRequest(r) => write_record(r, &path, value),
            Resource::SupplyRequest(r) => write_record(r, &path, value),
            Resource::Procedure(r) => write_record(r, &path, value),
            Resource::DiagnosticReport(r) => write_record(r, &path, value),
            Resource::Communication(r) => write_record(r, &path, value),
            Resource::CommunicationRequest(r) => write_record(r, &path, value),
        }
    }
}

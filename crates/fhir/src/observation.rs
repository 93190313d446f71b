//! FHIR R4 Observation wire model and translation helpers.
//!
//! One Observation is produced per reported result. The value is either a
//! quantity (numeric results, units coded in UCUM) or a plain string.

use crate::datatypes::{CodeableConcept, Coding, Identifier, Quantity, Reference};
use crate::{FhirError, FhirResult, ResourceType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Code system for result interpretation flags.
pub const INTERPRETATION_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/v3-ObservationInterpretation";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Status of a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObservationStatus {
    Registered,
    Preliminary,
    Final,
    Amended,
    Corrected,
    Cancelled,
    EnteredInError,
    Unknown,
}

impl ObservationStatus {
    pub fn to_wire(self) -> &'static str {
        match self {
            ObservationStatus::Registered => "registered",
            ObservationStatus::Preliminary => "preliminary",
            ObservationStatus::Final => "final",
            ObservationStatus::Amended => "amended",
            ObservationStatus::Corrected => "corrected",
            ObservationStatus::Cancelled => "cancelled",
            ObservationStatus::EnteredInError => "entered-in-error",
            ObservationStatus::Unknown => "unknown",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "registered" => Some(ObservationStatus::Registered),
            "preliminary" => Some(ObservationStatus::Preliminary),
            "final" => Some(ObservationStatus::Final),
            "amended" => Some(ObservationStatus::Amended),
            "corrected" => Some(ObservationStatus::Corrected),
            "cancelled" => Some(ObservationStatus::Cancelled),
            "entered-in-error" => Some(ObservationStatus::EnteredInError),
            "unknown" => Some(ObservationStatus::Unknown),
            _ => None,
        }
    }
}

/// The value of a result.
#[derive(Clone, Debug, PartialEq)]
pub enum ObservationValue {
    Quantity(Quantity),
    Text(String),
}

/// Domain-level carrier for observation data.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationData {
    pub id: String,
    pub identifiers: Vec<Identifier>,
    pub status: ObservationStatus,
    /// What was observed. Results reported without a code render without one.
    pub code: Option<Coding>,
    pub subject: Option<Reference>,
    pub encounter: Option<Reference>,
    pub effective: Option<NaiveDateTime>,
    pub value: Option<ObservationValue>,
    pub interpretation: Option<Coding>,
    /// Reference range as free text, e.g. `3.5-5.0`.
    pub reference_range: Option<String>,
}

// ============================================================================
// Public Observation operations
// ============================================================================

/// Observation resource operations.
pub struct Observation;

impl Observation {
    /// Parse an Observation resource from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] on schema mismatch, a resourceType other than
    /// "Observation", an unknown status, or a document carrying both
    /// `valueQuantity` and `valueString`.
    pub fn parse(json_text: &str) -> FhirResult<ObservationData> {
        let wire: ObservationWire = crate::from_json(json_text, "Observation")?;
        crate::expect_resource_type(&wire.resource_type, ResourceType::Observation)?;
        wire_to_domain(wire)
    }

    /// Render an Observation resource as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if the id is not a valid FHIR id.
    pub fn render(data: &ObservationData) -> FhirResult<String> {
        crate::expect_valid_id(&data.id, ResourceType::Observation)?;
        let wire = domain_to_wire(data);
        crate::to_json(&wire, "Observation")
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct ObservationWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,

    #[serde(rename = "effectiveDateTime", skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<NaiveDateTime>,

    #[serde(rename = "valueQuantity", skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,

    #[serde(rename = "valueString", skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interpretation: Vec<CodeableConcept>,

    #[serde(rename = "referenceRange", default, skip_serializing_if = "Vec::is_empty")]
    pub reference_range: Vec<ReferenceRangeWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ReferenceRangeWire {
    pub text: String,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: ObservationWire) -> FhirResult<ObservationData> {
    let status = ObservationStatus::from_wire(&wire.status).ok_or_else(|| {
        FhirError::Translation(format!("Unknown observation status '{}'", wire.status))
    })?;

    let value = match (wire.value_quantity, wire.value_string) {
        (Some(_), Some(_)) => {
            return Err(FhirError::Translation(
                "Observation carries both valueQuantity and valueString".into(),
            ))
        }
        (Some(quantity), None) => Some(ObservationValue::Quantity(quantity)),
        (None, Some(text)) => Some(ObservationValue::Text(text)),
        (None, None) => None,
    };

    Ok(ObservationData {
        id: wire.id,
        identifiers: wire.identifier,
        status,
        code: wire.code.and_then(|c| c.coding.into_iter().next()),
        subject: wire.subject,
        encounter: wire.encounter,
        effective: wire.effective_date_time,
        value,
        interpretation: wire
            .interpretation
            .into_iter()
            .flat_map(|i| i.coding)
            .next(),
        reference_range: wire.reference_range.into_iter().next().map(|r| r.text),
    })
}

fn domain_to_wire(data: &ObservationData) -> ObservationWire {
    let (value_quantity, value_string) = match &data.value {
        Some(ObservationValue::Quantity(quantity)) => (Some(quantity.clone()), None),
        Some(ObservationValue::Text(text)) => (None, Some(text.clone())),
        None => (None, None),
    };

    ObservationWire {
        resource_type: ResourceType::Observation.as_str().to_string(),
        id: data.id.clone(),
        identifier: data.identifiers.clone(),
        status: data.status.to_wire().to_string(),
        code: data.code.clone().map(CodeableConcept::from_coding),
        subject: data.subject.clone(),
        encounter: data.encounter.clone(),
        effective_date_time: data.effective,
        value_quantity,
        value_string,
        interpretation: data
            .interpretation
            .iter()
            .cloned()
            .map(CodeableConcept::from_coding)
            .collect(),
        reference_range: data
            .reference_range
            .iter()
            .map(|text| ReferenceRangeWire { text: text.clone() })
            .collect(),
    }
}

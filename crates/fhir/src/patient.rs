//! FHIR R4 Patient wire model and translation helpers.
//!
//! This module provides both domain-level types and the wire model for the Patient
//! resource, which carries demographics and identification for the subject of a message.
//!
//! Responsibilities:
//! - Define public domain-level types for the transformer
//! - Define a strict wire model for JSON serialisation/deserialisation
//! - Provide translation helpers between domain primitives and the wire model
//! - Validate the resource id and discriminator
//!
//! Notes:
//! - The flat domain structure holds a single name, address and phone number; the
//!   wire format allows several and parsing keeps the first of each.

use crate::datatypes::{CodeableConcept, Identifier};
use crate::{FhirError, FhirResult, ResourceType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Purpose of a human name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameUse {
    /// Official name.
    Official,
    /// Usual/preferred name.
    Usual,
    /// Temporary name.
    Temp,
    /// Nickname or informal name.
    Nickname,
    /// Anonymous name.
    Anonymous,
    /// Old name (no longer in use).
    Old,
    /// Maiden name.
    Maiden,
}

impl NameUse {
    /// Convert to FHIR wire format string.
    fn to_wire(self) -> &'static str {
        match self {
            NameUse::Official => "official",
            NameUse::Usual => "usual",
            NameUse::Temp => "temp",
            NameUse::Nickname => "nickname",
            NameUse::Anonymous => "anonymous",
            NameUse::Old => "old",
            NameUse::Maiden => "maiden",
        }
    }

    /// Parse from FHIR wire format string.
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "official" => Some(NameUse::Official),
            "usual" => Some(NameUse::Usual),
            "temp" => Some(NameUse::Temp),
            "nickname" => Some(NameUse::Nickname),
            "anonymous" => Some(NameUse::Anonymous),
            "old" => Some(NameUse::Old),
            "maiden" => Some(NameUse::Maiden),
            _ => None,
        }
    }
}

/// FHIR administrative gender.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    /// Convert to FHIR wire format string.
    pub fn to_wire(self) -> &'static str {
        match self {
            AdministrativeGender::Male => "male",
            AdministrativeGender::Female => "female",
            AdministrativeGender::Other => "other",
            AdministrativeGender::Unknown => "unknown",
        }
    }

    /// Parse from FHIR wire format string.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "male" => Some(AdministrativeGender::Male),
            "female" => Some(AdministrativeGender::Female),
            "other" => Some(AdministrativeGender::Other),
            "unknown" => Some(AdministrativeGender::Unknown),
            _ => None,
        }
    }
}

/// A postal address (always rendered with `use: home`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientAddress {
    /// Street lines, in order.
    pub line: Vec<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl PatientAddress {
    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
            && self.city.is_none()
            && self.state.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
    }
}

/// Domain-level carrier for patient data (flat structure).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientData {
    /// FHIR resource id.
    pub id: String,

    /// Business identifiers (source patient id, MRN).
    pub identifiers: Vec<Identifier>,

    /// Purpose of the name (official, usual, nickname, etc.).
    pub name_use: Option<NameUse>,

    /// Family name (surname).
    pub family: Option<String>,

    /// Given names (first name, middle names).
    pub given: Vec<String>,

    pub gender: Option<AdministrativeGender>,

    pub birth_date: Option<NaiveDate>,

    pub address: Option<PatientAddress>,

    /// Home phone number.
    pub phone: Option<String>,

    pub marital_status: Option<CodeableConcept>,
}

impl PatientData {
    /// A patient with only an id; every other element absent.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            identifiers: Vec::new(),
            name_use: None,
            family: None,
            given: Vec::new(),
            gender: None,
            birth_date: None,
            address: None,
            phone: None,
            marital_status: None,
        }
    }
}

// ============================================================================
// Public Patient operations
// ============================================================================

/// Patient resource operations.
///
/// This is a zero-sized type used for namespacing patient-related operations.
/// All methods are associated functions.
pub struct Patient;

impl Patient {
    /// Parse a Patient resource from JSON text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path" (e.g. `name[0].family`)
    /// to the failing field when the JSON does not match the wire schema.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not represent a valid Patient resource,
    /// - any field has an unexpected type or any unknown keys are present,
    /// - resourceType is not "Patient",
    /// - the gender is not an administrative gender code.
    pub fn parse(json_text: &str) -> FhirResult<PatientData> {
        let wire: PatientWire = crate::from_json(json_text, "Patient")?;
        crate::expect_resource_type(&wire.resource_type, ResourceType::Patient)?;
        wire_to_domain(wire)
    }

    /// Render a Patient resource as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if the id is not a valid FHIR id, or
    /// [`FhirError::Translation`] if serialisation fails.
    pub fn render(data: &PatientData) -> FhirResult<String> {
        crate::expect_valid_id(&data.id, ResourceType::Patient)?;
        let wire = domain_to_wire(data);
        crate::to_json(&wire, "Patient")
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct PatientWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanNameWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPointWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(rename = "birthDate", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<AddressWire>,

    #[serde(rename = "maritalStatus", skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<CodeableConcept>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct HumanNameWire {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ContactPointWire {
    pub system: String,

    pub value: String,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct AddressWire {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(rename = "postalCode", skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: PatientWire) -> FhirResult<PatientData> {
    let gender = wire
        .gender
        .as_deref()
        .map(|g| {
            AdministrativeGender::from_wire(g)
                .ok_or_else(|| FhirError::Translation(format!("Unknown patient gender '{g}'")))
        })
        .transpose()?;

    let first_name = wire.name.into_iter().next();
    let phone = wire
        .telecom
        .into_iter()
        .find(|t| t.system == "phone")
        .map(|t| t.value);
    let address = wire.address.into_iter().next().map(|a| PatientAddress {
        line: a.line,
        city: a.city,
        state: a.state,
        postal_code: a.postal_code,
        country: a.country,
    });

    Ok(PatientData {
        id: wire.id,
        identifiers: wire.identifier,
        name_use: first_name
            .as_ref()
            .and_then(|n| n.use_type.as_deref())
            .and_then(NameUse::from_wire),
        family: first_name.as_ref().and_then(|n| n.family.clone()),
        given: first_name.map(|n| n.given).unwrap_or_default(),
        gender,
        birth_date: wire.birth_date,
        address,
        phone,
        marital_status: wire.marital_status,
    })
}

fn domain_to_wire(data: &PatientData) -> PatientWire {
    let name = if data.name_use.is_some() || data.family.is_some() || !data.given.is_empty() {
        vec![HumanNameWire {
            use_type: data.name_use.map(|u| u.to_wire().to_string()),
            family: data.family.clone(),
            given: data.given.clone(),
        }]
    } else {
        vec![]
    };

    let telecom = data
        .phone
        .iter()
        .map(|phone| ContactPointWire {
            system: "phone".to_string(),
            value: phone.clone(),
            use_type: Some("home".to_string()),
        })
        .collect();

    let address = data
        .address
        .iter()
        .filter(|a| !a.is_empty())
        .map(|a| AddressWire {
            use_type: Some("home".to_string()),
            line: a.line.clone(),
            city: a.city.clone(),
            state: a.state.clone(),
            postal_code: a.postal_code.clone(),
            country: a.country.clone(),
        })
        .collect();

    PatientWire {
        resource_type: ResourceType::Patient.as_str().to_string(),
        id: data.id.clone(),
        identifier: data.identifiers.clone(),
        name,
        telecom,
        gender: data.gender.map(|g| g.to_wire().to_string()),
        birth_date: data.birth_date,
        address,
        marital_status: data.marital_status.clone(),
    }
}

//! FHIR R4 Encounter wire model and translation helpers.
//!
//! An Encounter records the visit a message refers to: its class (inpatient,
//! outpatient, emergency), the period, the assigned location and the clinicians
//! attached to it.

use crate::datatypes::{CodeableConcept, Coding, Identifier, Period, Reference};
use crate::{FhirError, FhirResult, ResourceType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Code system for encounter classes.
pub const ACT_CODE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-ActCode";

/// Code system for participant roles.
pub const PARTICIPATION_TYPE_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/v3-ParticipationType";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Lifecycle state of an encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncounterStatus {
    Planned,
    Arrived,
    InProgress,
    Finished,
    Cancelled,
    Unknown,
}

impl EncounterStatus {
    fn to_wire(self) -> &'static str {
        match self {
            EncounterStatus::Planned => "planned",
            EncounterStatus::Arrived => "arrived",
            EncounterStatus::InProgress => "in-progress",
            EncounterStatus::Finished => "finished",
            EncounterStatus::Cancelled => "cancelled",
            EncounterStatus::Unknown => "unknown",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(EncounterStatus::Planned),
            "arrived" => Some(EncounterStatus::Arrived),
            "in-progress" => Some(EncounterStatus::InProgress),
            "finished" => Some(EncounterStatus::Finished),
            "cancelled" => Some(EncounterStatus::Cancelled),
            "unknown" => Some(EncounterStatus::Unknown),
            _ => None,
        }
    }
}

/// Classification of an encounter, coded in v3-ActCode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncounterClass {
    Inpatient,
    Ambulatory,
    Emergency,
}

impl EncounterClass {
    pub fn code(self) -> &'static str {
        match self {
            EncounterClass::Inpatient => "IMP",
            EncounterClass::Ambulatory => "AMB",
            EncounterClass::Emergency => "EMER",
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            EncounterClass::Inpatient => "inpatient encounter",
            EncounterClass::Ambulatory => "ambulatory",
            EncounterClass::Emergency => "emergency",
        }
    }

    fn to_coding(self) -> Coding {
        Coding::new(ACT_CODE_SYSTEM, self.code()).with_display(self.display())
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "IMP" => Some(EncounterClass::Inpatient),
            "AMB" => Some(EncounterClass::Ambulatory),
            "EMER" => Some(EncounterClass::Emergency),
            _ => None,
        }
    }
}

/// Role a clinician plays in an encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticipantRole {
    Attending,
    Referring,
}

impl ParticipantRole {
    fn to_coding(self) -> Coding {
        match self {
            ParticipantRole::Attending => {
                Coding::new(PARTICIPATION_TYPE_SYSTEM, "ATND").with_display("attender")
            }
            ParticipantRole::Referring => {
                Coding::new(PARTICIPATION_TYPE_SYSTEM, "REF").with_display("referrer")
            }
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "ATND" => Some(ParticipantRole::Attending),
            "REF" => Some(ParticipantRole::Referring),
            _ => None,
        }
    }
}

/// A clinician attached to an encounter, referenced by display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncounterParticipant {
    pub role: ParticipantRole,
    pub display: String,
}

/// Domain-level carrier for encounter data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncounterData {
    pub id: String,
    pub identifiers: Vec<Identifier>,
    pub status: EncounterStatus,
    pub class: Option<EncounterClass>,
    /// Hospital service, as free text.
    pub service_type: Option<String>,
    pub subject: Option<Reference>,
    pub participants: Vec<EncounterParticipant>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    /// Location display text.
    pub location: Option<String>,
}

// ============================================================================
// Public Encounter operations
// ============================================================================

/// Encounter resource operations.
pub struct Encounter;

impl Encounter {
    /// Parse an Encounter resource from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] on schema mismatch, a resourceType other than
    /// "Encounter", or an unknown status, class or participant code.
    pub fn parse(json_text: &str) -> FhirResult<EncounterData> {
        let wire: EncounterWire = crate::from_json(json_text, "Encounter")?;
        crate::expect_resource_type(&wire.resource_type, ResourceType::Encounter)?;
        wire_to_domain(wire)
    }

    /// Render an Encounter resource as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if the id is not a valid FHIR id.
    pub fn render(data: &EncounterData) -> FhirResult<String> {
        crate::expect_valid_id(&data.id, ResourceType::Encounter)?;
        crate::to_json(&domain_to_wire(data), "Encounter")
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct EncounterWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<Coding>,

    #[serde(rename = "serviceType", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participant: Vec<ParticipantWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<LocationWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ParticipantWire {
    #[serde(rename = "type")]
    pub type_: Vec<CodeableConcept>,

    pub individual: Reference,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct LocationWire {
    pub location: Reference,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: EncounterWire) -> FhirResult<EncounterData> {
    let status = EncounterStatus::from_wire(&wire.status).ok_or_else(|| {
        FhirError::Translation(format!("Unknown encounter status '{}'", wire.status))
    })?;

    let class = wire
        .class
        .map(|c| {
            EncounterClass::from_code(&c.code).ok_or_else(|| {
                FhirError::Translation(format!("Unknown encounter class '{}'", c.code))
            })
        })
        .transpose()?;

    let participants = wire
        .participant
        .into_iter()
        .map(|p| {
            let role = p
                .type_
                .iter()
                .flat_map(|t| t.coding.iter())
                .find_map(|c| ParticipantRole::from_code(&c.code))
                .ok_or_else(|| {
                    FhirError::Translation("Encounter participant has no known role".into())
                })?;
            Ok(EncounterParticipant {
                role,
                display: p.individual.display.unwrap_or_default(),
            })
        })
        .collect::<FhirResult<Vec<_>>>()?;

    let period = wire.period.unwrap_or_default();

    Ok(EncounterData {
        id: wire.id,
        identifiers: wire.identifier,
        status,
        class,
        service_type: wire.service_type.and_then(|s| s.text),
        subject: wire.subject,
        participants,
        start: period.start,
        end: period.end,
        location: wire
            .location
            .into_iter()
            .next()
            .and_then(|l| l.location.display),
    })
}

fn domain_to_wire(data: &EncounterData) -> EncounterWire {
    let period = Period {
        start: data.start,
        end: data.end,
    };

    EncounterWire {
        resource_type: ResourceType::Encounter.as_str().to_string(),
        id: data.id.clone(),
        identifier: data.identifiers.clone(),
        status: data.status.to_wire().to_string(),
        class: data.class.map(EncounterClass::to_coding),
        service_type: data.service_type.as_deref().map(CodeableConcept::from_text),
        subject: data.subject.clone(),
        participant: data
            .participants
            .iter()
            .map(|p| ParticipantWire {
                type_: vec![CodeableConcept::from_coding(p.role.to_coding())],
                individual: Reference::display(p.display.clone()),
            })
            .collect(),
        period: (!period.is_empty()).then_some(period),
        location: data
            .location
            .iter()
            .map(|l| LocationWire {
                location: Reference::display(l.clone()),
            })
            .collect(),
    }
}

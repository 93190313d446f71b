//! FHIR R4 ServiceRequest wire model and translation helpers.
//!
//! Orders are always rendered with `intent: order`.

use crate::datatypes::{CodeableConcept, Coding, Identifier, Reference};
use crate::{FhirError, FhirResult, ResourceType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const INTENT_ORDER: &str = "order";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Status of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestStatus {
    Draft,
    Active,
    OnHold,
    Revoked,
    Completed,
    EnteredInError,
    Unknown,
}

impl RequestStatus {
    pub fn to_wire(self) -> &'static str {
        match self {
            RequestStatus::Draft => "draft",
            RequestStatus::Active => "active",
            RequestStatus::OnHold => "on-hold",
            RequestStatus::Revoked => "revoked",
            RequestStatus::Completed => "completed",
            RequestStatus::EnteredInError => "entered-in-error",
            RequestStatus::Unknown => "unknown",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(RequestStatus::Draft),
            "active" => Some(RequestStatus::Active),
            "on-hold" => Some(RequestStatus::OnHold),
            "revoked" => Some(RequestStatus::Revoked),
            "completed" => Some(RequestStatus::Completed),
            "entered-in-error" => Some(RequestStatus::EnteredInError),
            "unknown" => Some(RequestStatus::Unknown),
            _ => None,
        }
    }
}

/// Urgency of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestPriority {
    Routine,
    Urgent,
    Asap,
    Stat,
}

impl RequestPriority {
    pub fn to_wire(self) -> &'static str {
        match self {
            RequestPriority::Routine => "routine",
            RequestPriority::Urgent => "urgent",
            RequestPriority::Asap => "asap",
            RequestPriority::Stat => "stat",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "routine" => Some(RequestPriority::Routine),
            "urgent" => Some(RequestPriority::Urgent),
            "asap" => Some(RequestPriority::Asap),
            "stat" => Some(RequestPriority::Stat),
            _ => None,
        }
    }
}

/// Domain-level carrier for order data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceRequestData {
    pub id: String,
    pub identifiers: Vec<Identifier>,
    pub status: RequestStatus,
    pub priority: Option<RequestPriority>,
    pub code: Option<Coding>,
    /// The patient the order is for, when the message identifies one.
    pub subject: Option<Reference>,
    pub encounter: Option<Reference>,
    pub authored_on: Option<NaiveDateTime>,
    pub requester: Option<Reference>,
}

// ============================================================================
// Public ServiceRequest operations
// ============================================================================

/// ServiceRequest resource operations.
pub struct ServiceRequest;

impl ServiceRequest {
    /// Parse a ServiceRequest resource from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] on schema mismatch, a resourceType other than
    /// "ServiceRequest", an intent other than "order", or unknown status/priority codes.
    pub fn parse(json_text: &str) -> FhirResult<ServiceRequestData> {
        let wire: ServiceRequestWire = crate::from_json(json_text, "ServiceRequest")?;
        crate::expect_resource_type(&wire.resource_type, ResourceType::ServiceRequest)?;
        wire_to_domain(wire)
    }

    /// Render a ServiceRequest resource as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if the id is not a valid FHIR id.
    pub fn render(data: &ServiceRequestData) -> FhirResult<String> {
        crate::expect_valid_id(&data.id, ResourceType::ServiceRequest)?;
        let wire = domain_to_wire(data);
        crate::to_json(&wire, "ServiceRequest")
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ServiceRequestWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    pub status: String,

    pub intent: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,

    #[serde(rename = "authoredOn", skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<NaiveDateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: ServiceRequestWire) -> FhirResult<ServiceRequestData> {
    if wire.intent != INTENT_ORDER {
        return Err(FhirError::Translation(format!(
            "Unsupported ServiceRequest intent '{}'",
            wire.intent
        )));
    }

    let status = RequestStatus::from_wire(&wire.status).ok_or_else(|| {
        FhirError::Translation(format!("Unknown request status '{}'", wire.status))
    })?;

    let priority = wire
        .priority
        .as_deref()
        .map(|p| {
            RequestPriority::from_wire(p)
                .ok_or_else(|| FhirError::Translation(format!("Unknown request priority '{p}'")))
        })
        .transpose()?;

    Ok(ServiceRequestData {
        id: wire.id,
        identifiers: wire.identifier,
        status,
        priority,
        code: wire.code.and_then(|c| c.coding.into_iter().next()),
        subject: wire.subject,
        encounter: wire.encounter,
        authored_on: wire.authored_on,
        requester: wire.requester,
    })
}

fn domain_to_wire(data: &ServiceRequestData) -> ServiceRequestWire {
    ServiceRequestWire {
        resource_type: ResourceType::ServiceRequest.as_str().to_string(),
        id: data.id.clone(),
        identifier: data.identifiers.clone(),
        status: data.status.to_wire().to_string(),
        intent: INTENT_ORDER.to_string(),
        priority: data.priority.map(|p| p.to_wire().to_string()),
        code: data.code.clone().map(CodeableConcept::from_coding),
        subject: data.subject.clone(),
        encounter: data.encounter.clone(),
        authored_on: data.authored_on,
        requester: data.requester.clone(),
    }
}

//! FHIR R4 wire/boundary support for the HL7 bridge.
//!
//! This crate provides **wire models** and **render/parse helpers** for the FHIR
//! resources the bridge emits:
//! - `Patient`, `Encounter`, `Observation` and `ServiceRequest` JSON documents
//! - the shared complex datatypes they are built from ([`datatypes`])
//! - the [`TargetResource`] envelope that carries a rendered document
//!
//! This crate focuses on:
//! - FHIR R4 semantic alignment (JSON only, no REST transport)
//! - strict serialisation/deserialisation of the subset the bridge produces
//! - translation between domain-level data carriers and wire structs
//!
//! It knows nothing about HL7 v2. Mapping from the parsed message model into the
//! `*Data` carriers defined here lives in `bridge-core`.
//!
//! The bridge itself only renders. Each resource's `parse` reads a rendered document
//! back into its `*Data` carrier, so callers and the `bridge-core` integration tests
//! can check what was emitted field by field.

pub mod datatypes;
pub mod encounter;
pub mod observation;
pub mod patient;
pub mod resource;
pub mod service_request;

// Re-export facades
pub use encounter::Encounter;
pub use observation::Observation;
pub use patient::Patient;
pub use service_request::ServiceRequest;

// Re-export public domain-level types
pub use datatypes::{CodeableConcept, Coding, Identifier, Period, Quantity, Reference};
pub use encounter::{EncounterClass, EncounterData, EncounterParticipant, EncounterStatus, ParticipantRole};
pub use observation::{ObservationData, ObservationStatus, ObservationValue};
pub use patient::{AdministrativeGender, NameUse, PatientAddress, PatientData};
pub use resource::{is_valid_id, sanitize_id, ResourceType, TargetResource, FHIR_VERSION};
pub use service_request::{RequestPriority, RequestStatus, ServiceRequestData};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// Deserialize a wire struct from JSON, reporting the failing path on schema mismatch.
///
/// `label` names the resource in the error message (for example `Patient`).
pub(crate) fn from_json<T: DeserializeOwned>(json_text: &str, label: &str) -> FhirResult<T> {
    let mut deserializer = serde_json::Deserializer::from_str(json_text);

    let wire = match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(parsed) => parsed,
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            return Err(FhirError::Translation(format!(
                "{label} schema mismatch at {path}: {source}"
            )));
        }
    };

    deserializer.end()?;
    Ok(wire)
}

/// Serialize a wire struct as pretty-printed JSON.
pub(crate) fn to_json<T: Serialize>(wire: &T, label: &str) -> FhirResult<String> {
    serde_json::to_string_pretty(wire)
        .map_err(|e| FhirError::Translation(format!("Failed to serialise {label}: {e}")))
}

/// Check the `resourceType` discriminator of a parsed document.
pub(crate) fn expect_resource_type(found: &str, expected: ResourceType) -> FhirResult<()> {
    if found != expected.as_str() {
        return Err(FhirError::InvalidInput(format!(
            "Expected resourceType '{}', got '{found}'",
            expected.as_str()
        )));
    }
    Ok(())
}

/// Check that a resource id satisfies the FHIR id rules before rendering.
pub(crate) fn expect_valid_id(id: &str, resource_type: ResourceType) -> FhirResult<()> {
    if !is_valid_id(id) {
        return Err(FhirError::InvalidInput(format!(
            "'{id}' is not a valid {} id",
            resource_type.as_str()
        )));
    }
    Ok(())
}

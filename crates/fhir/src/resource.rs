//! Resource kinds, id rules and the rendered-resource envelope.

use crate::{FhirError, FhirResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// FHIR release every rendered document conforms to.
pub const FHIR_VERSION: &str = "4.0.1";

/// Maximum length of a FHIR resource id.
pub const MAX_ID_LEN: usize = 64;

/// The resource types the bridge emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum ResourceType {
    Patient,
    Encounter,
    Observation,
    ServiceRequest,
}

impl ResourceType {
    /// All emitted types, in emission order.
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Patient,
        ResourceType::Encounter,
        ResourceType::Observation,
        ResourceType::ServiceRequest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Patient => "Patient",
            ResourceType::Encounter => "Encounter",
            ResourceType::Observation => "Observation",
            ResourceType::ServiceRequest => "ServiceRequest",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = FhirError;

    /// Case-insensitive; `service-request` and `service_request` are accepted too.
    fn from_str(s: &str) -> FhirResult<Self> {
        let normalised: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalised.as_str() {
            "patient" => Ok(ResourceType::Patient),
            "encounter" => Ok(ResourceType::Encounter),
            "observation" => Ok(ResourceType::Observation),
            "servicerequest" => Ok(ResourceType::ServiceRequest),
            _ => Err(FhirError::InvalidInput(format!(
                "unsupported resource type '{s}'"
            ))),
        }
    }
}

/// Whether `id` satisfies FHIR id rules: 1-64 of `[A-Za-z0-9-.]`.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

/// Derive a valid FHIR id from a source identifier.
///
/// Disallowed characters become `-`, leading and trailing `-` are dropped and the
/// result is cut to 64 characters.
///
/// # Returns
///
/// `None` when nothing usable remains, in which case the caller mints an id.
pub fn sanitize_id(raw: &str) -> Option<String> {
    let mapped: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = mapped.trim_matches('-');
    if trimmed.is_empty() {
        return None;
    }
    let cut: String = trimmed.chars().take(MAX_ID_LEN).collect();
    Some(cut.trim_end_matches('-').to_string())
}

/// A rendered FHIR resource plus the bookkeeping the bridge attaches to it.
///
/// The JSON document is rendered once at construction; the envelope is immutable.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResource {
    id: String,
    resource_type: ResourceType,
    fhir_version: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_message_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TargetResource {
    /// Wrap a rendered document.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if `id` is not a valid FHIR id.
    pub fn new(
        resource_type: ResourceType,
        id: impl Into<String>,
        content: String,
        source_message_id: Option<String>,
    ) -> FhirResult<Self> {
        let id = id.into();
        crate::expect_valid_id(&id, resource_type)?;
        Ok(Self {
            id,
            resource_type,
            fhir_version: FHIR_VERSION,
            content,
            source_message_id,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn fhir_version(&self) -> &'static str {
        self.fhir_version
    }

    /// The rendered JSON document.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Control id of the message this resource was derived from.
    pub fn source_message_id(&self) -> Option<&str> {
        self.source_message_id.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Literal reference to this resource, `{type}/{id}`.
    pub fn reference(&self) -> String {
        format!("{}/{}", self.resource_type.as_str(), self.id)
    }

    /// The rendered document as a JSON value.
    pub fn document(&self) -> FhirResult<serde_json::Value> {
        Ok(serde_json::from_str(&self.content)?)
    }
}

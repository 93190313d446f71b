//! Typed intermediate model between the wire format and FHIR.
//!
//! Every sub-model uses `Option` fields: an absent source field is `None`, never an
//! empty string. The parser only sets `patient`/`visit` when at least one identifying
//! field was present, and only keeps observation/order records that carry a code or
//! an identifying number.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use hl7::{FieldPath, Message, HEADER_SEGMENT};
use serde::Serialize;
use std::fmt;

// ============================================================================
// Received message
// ============================================================================

/// Lifecycle of a message through the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    Received,
    Validating,
    Valid,
    Invalid,
    Transforming,
    Transformed,
    Error,
}

impl MessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageStatus::Received => "RECEIVED",
            MessageStatus::Validating => "VALIDATING",
            MessageStatus::Valid => "VALID",
            MessageStatus::Invalid => "INVALID",
            MessageStatus::Transforming => "TRANSFORMING",
            MessageStatus::Transformed => "TRANSFORMED",
            MessageStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message as received: the raw text plus header values inferred from it.
///
/// Inference is best-effort; text that cannot be decoded still yields a
/// `RawMessage` with no inferred values, and fails later in the parser.
/// Construction decodes the text once; [`crate::Pipeline::process`] decodes it
/// once more and shares that decode between parsing and validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawMessage {
    text: String,
    message_id: Option<String>,
    message_type: Option<String>,
    version: Option<String>,
    sending_application: Option<String>,
    receiving_application: Option<String>,
    timestamp: Option<NaiveDateTime>,
    received_at: DateTime<Utc>,
}

impl RawMessage {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let decoded = Message::parse(&text).ok();
        let header = |field: usize, component: Option<usize>| {
            let message = decoded.as_ref()?;
            let mut path = FieldPath::new(HEADER_SEGMENT, field);
            if let Some(component) = component {
                path = path.component(component);
            }
            message.get(&path)
        };

        Self {
            message_id: header(10, None),
            message_type: decoded.as_ref().and_then(full_message_type),
            version: header(12, Some(1)),
            sending_application: header(3, Some(1)),
            receiving_application: header(5, Some(1)),
            timestamp: header(7, Some(1)).and_then(|ts| hl7::parse_datetime(&ts)),
            received_at: Utc::now(),
            text,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The message control id (MSH-10).
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// Message type and trigger, e.g. `ADT^A01`.
    pub fn message_type(&self) -> Option<&str> {
        self.message_type.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn sending_application(&self) -> Option<&str> {
        self.sending_application.as_deref()
    }

    pub fn receiving_application(&self) -> Option<&str> {
        self.receiving_application.as_deref()
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

/// `TYPE^TRIGGER` from MSH-9, or just the type when no trigger was sent.
pub(crate) fn full_message_type(message: &Message) -> Option<String> {
    let msh9 = |component| message.get(&FieldPath::new(HEADER_SEGMENT, 9).component(component));
    match (msh9(1), msh9(2)) {
        (Some(code), Some(trigger)) => Some(format!("{code}^{trigger}")),
        (code, _) => code,
    }
}

// ============================================================================
// Parsed message
// ============================================================================

/// MSH values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Header {
    pub message_type: Option<String>,
    pub trigger_event: Option<String>,
    pub control_id: Option<String>,
    pub version: Option<String>,
    pub processing_id: Option<String>,
    pub sending_application: Option<String>,
    pub sending_facility: Option<String>,
    pub receiving_application: Option<String>,
    pub receiving_facility: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

/// PID-11 address parts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AddressRecord {
    pub street: Option<String>,
    pub other_designation: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Demographics from PID.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PatientRecord {
    pub patient_id: Option<String>,
    pub medical_record_number: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    /// Administrative sex code as sent (`M`, `F`, ...).
    pub sex: Option<String>,
    pub address: Option<AddressRecord>,
    pub phone: Option<String>,
    pub marital_status: Option<String>,
    pub race: Option<String>,
}

impl PatientRecord {
    pub(crate) fn is_identified(&self) -> bool {
        self.patient_id.is_some() || self.first_name.is_some() || self.last_name.is_some()
    }
}

/// PV1-3 assigned location.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub unit: Option<String>,
    pub room: Option<String>,
    pub bed: Option<String>,
    pub facility: Option<String>,
}

impl Location {
    /// `unit - Room R - Bed B`, with absent parts left out.
    pub fn display(&self) -> Option<String> {
        let parts: Vec<String> = [
            self.unit.clone(),
            self.room.as_ref().map(|room| format!("Room {room}")),
            self.bed.as_ref().map(|bed| format!("Bed {bed}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        (!parts.is_empty()).then(|| parts.join(" - "))
    }
}

/// A clinician from an XCN field (id, family name, given name).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Provider {
    pub id: Option<String>,
    pub family_name: Option<String>,
    pub given_name: Option<String>,
}

impl Provider {
    /// `Given Family` when a name is known, otherwise the id.
    pub fn display(&self) -> Option<String> {
        let name: Vec<&str> = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if name.is_empty() {
            self.id.clone()
        } else {
            Some(name.join(" "))
        }
    }
}

/// Visit details from PV1.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VisitRecord {
    pub visit_number: Option<String>,
    /// Patient class code as sent (`I`, `O`, `E`, ...).
    pub patient_class: Option<String>,
    pub location: Option<Location>,
    pub admission_type: Option<String>,
    pub hospital_service: Option<String>,
    pub admitted_at: Option<NaiveDateTime>,
    pub discharged_at: Option<NaiveDateTime>,
    pub attending: Option<Provider>,
    pub referring: Option<Provider>,
}

impl VisitRecord {
    pub(crate) fn is_identified(&self) -> bool {
        self.visit_number.is_some() || self.patient_class.is_some() || self.location.is_some()
    }
}

/// One OBX result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ObservationRecord {
    pub set_id: Option<String>,
    pub code: Option<String>,
    pub display: Option<String>,
    /// Value exactly as sent; numeric detection happens in the transformer.
    pub value: Option<String>,
    pub units: Option<String>,
    pub reference_range: Option<String>,
    pub abnormal_flag: Option<String>,
    pub result_status: Option<String>,
    pub observed_at: Option<NaiveDateTime>,
}

/// One order from ORC + OBR.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub order_number: Option<String>,
    pub placer_order_number: Option<String>,
    pub filler_order_number: Option<String>,
    pub status: Option<String>,
    pub code: Option<String>,
    pub display: Option<String>,
    pub ordering_provider: Option<Provider>,
    pub ordered_at: Option<NaiveDateTime>,
    pub priority: Option<String>,
}

/// The typed intermediate representation of one message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParsedMessage {
    pub header: Header,
    pub patient: Option<PatientRecord>,
    pub visit: Option<VisitRecord>,
    /// Source order is preserved.
    pub observations: Vec<ObservationRecord>,
    pub orders: Vec<OrderRecord>,
}

impl ParsedMessage {
    pub fn control_id(&self) -> Option<&str> {
        self.header.control_id.as_deref()
    }

    pub fn patient_id(&self) -> Option<&str> {
        self.patient.as_ref()?.patient_id.as_deref()
    }
}

/// Something the parser dropped or could not interpret.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParseNotice {
    pub kind: NoticeKind,
    /// Segment or field location, e.g. `OBX(2)` or `PV1-44`.
    pub location: String,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoticeKind {
    DroppedSegment,
    MalformedTimestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_message_infers_header_values() {
        let raw = RawMessage::new(
            "MSH|^~\\&|LAB|F1|EHR|F2|20240715120000||ORU^R01|MSG7|P|2.5\rPID|1||9\r",
        );
        assert_eq!(raw.message_id(), Some("MSG7"));
        assert_eq!(raw.message_type(), Some("ORU^R01"));
        assert_eq!(raw.version(), Some("2.5"));
        assert_eq!(raw.sending_application(), Some("LAB"));
        assert_eq!(raw.receiving_application(), Some("EHR"));
        assert!(raw.timestamp().is_some());
    }

    #[test]
    fn message_type_without_trigger_is_bare() {
        let message = Message::parse("MSH|^~\\&|A||B||20240101||ACK|1|P|2.4").expect("parse");
        assert_eq!(full_message_type(&message).as_deref(), Some("ACK"));

        let raw = RawMessage::new("MSH|^~\\&|A||B||20240101||ACK|1|P|2.4");
        assert_eq!(raw.message_type(), Some("ACK"));
    }

    #[test]
    fn raw_message_tolerates_undecodable_text() {
        let raw = RawMessage::new("not an hl7 message");
        assert_eq!(raw.text(), "not an hl7 message");
        assert!(raw.message_id().is_none());
        assert!(raw.message_type().is_none());
    }

    #[test]
    fn location_display_skips_absent_parts() {
        let full = Location {
            unit: Some("4W".into()),
            room: Some("401".into()),
            bed: Some("A".into()),
            facility: None,
        };
        assert_eq!(full.display().as_deref(), Some("4W - Room 401 - Bed A"));

        let bed_only = Location {
            bed: Some("2".into()),
            ..Location::default()
        };
        assert_eq!(bed_only.display().as_deref(), Some("Bed 2"));
        assert_eq!(Location::default().display(), None);
    }

    #[test]
    fn provider_display_prefers_name() {
        let named = Provider {
            id: Some("1234".into()),
            family_name: Some("Smith".into()),
            given_name: Some("Anna".into()),
        };
        assert_eq!(named.display().as_deref(), Some("Anna Smith"));

        let id_only = Provider {
            id: Some("1234".into()),
            ..Provider::default()
        };
        assert_eq!(id_only.display().as_deref(), Some("1234"));
    }
}

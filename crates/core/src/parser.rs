//! Message Parser: raw text to [`ParsedMessage`].
//!
//! Decoding into segments is delegated to the `hl7` crate; this module decides what
//! each segment means. Header, PID and PV1 are extracted for every message type, then
//! extraction dispatches on the base message type:
//! - `ORM`: one order from ORC + OBR
//! - `ORU`: one observation per OBX, in source order, up to the configured bound
//! - anything else: header, patient and visit only
//!
//! Field-level problems never fail a message. They degrade to an absent value and,
//! where something was actually lost, a [`ParseNotice`].

use crate::constants::{MRN_IDENTIFIER_TYPE, SUPPORTED_MESSAGE_TYPES};
use crate::model::{
    AddressRecord, Header, Location, NoticeKind, ObservationRecord, OrderRecord, ParseNotice,
    ParsedMessage, PatientRecord, Provider, RawMessage, VisitRecord,
};
use crate::BridgeConfig;
use chrono::{NaiveDate, NaiveDateTime};
use hl7::{FieldPath, Hl7Result, Message, HEADER_SEGMENT};

/// Extracts the intermediate model from HL7 v2 text.
#[derive(Clone, Debug)]
pub struct MessageParser {
    max_result_segments: usize,
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new(&BridgeConfig::default())
    }
}

impl MessageParser {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            max_result_segments: config.max_result_segments(),
        }
    }

    /// Parse raw text into a [`ParsedMessage`].
    ///
    /// # Errors
    ///
    /// Returns [`hl7::Hl7Error`] when the text cannot be decoded into a header plus
    /// segments, or declares an unsupported version or encoding.
    pub fn parse(&self, raw: &str) -> Hl7Result<ParsedMessage> {
        self.parse_with_notices(raw).map(|(parsed, _)| parsed)
    }

    /// Parse the text carried by a [`RawMessage`].
    pub fn parse_message(&self, raw: &RawMessage) -> Hl7Result<ParsedMessage> {
        self.parse(raw.text())
    }

    /// Parse raw text, also returning what was dropped or could not be interpreted.
    pub fn parse_with_notices(&self, raw: &str) -> Hl7Result<(ParsedMessage, Vec<ParseNotice>)> {
        let message = Message::parse(raw)?;
        Ok(self.parse_decoded(&message))
    }

    /// Extract the intermediate model from a message that is already decoded.
    pub fn parse_decoded(&self, message: &Message) -> (ParsedMessage, Vec<ParseNotice>) {
        let mut extractor = Extractor::new(message);

        let header = extractor.header();
        let base_type = header
            .message_type
            .as_deref()
            .map(str::to_ascii_uppercase)
            .unwrap_or_default();
        if !base_type.is_empty() && !supports_message_type(&base_type) {
            tracing::debug!(message_type = %base_type, "no type-specific extraction for message type");
        }

        let mut parsed = ParsedMessage {
            patient: extractor.patient(),
            visit: extractor.visit(),
            header,
            observations: Vec::new(),
            orders: Vec::new(),
        };

        match base_type.as_str() {
            "ORM" => parsed.orders.extend(extractor.order()),
            "ORU" => parsed.observations = extractor.observations(self.max_result_segments),
            _ => {}
        }

        tracing::debug!(
            control_id = parsed.control_id().unwrap_or("<none>"),
            message_type = %base_type,
            observations = parsed.observations.len(),
            orders = parsed.orders.len(),
            notices = extractor.notices.len(),
            "parsed message"
        );
        (parsed, extractor.notices)
    }
}

/// Whether a base message type (`ADT`, `ORU`, ...) has dedicated handling.
///
/// Case-insensitive. Unsupported types are still parsed for header, patient and visit.
pub fn supports_message_type(message_type: &str) -> bool {
    let base = message_type.split('^').next().unwrap_or_default().trim();
    SUPPORTED_MESSAGE_TYPES
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(base))
}

// ============================================================================
// Extraction (internal)
// ============================================================================

struct Extractor<'a> {
    message: &'a Message,
    notices: Vec<ParseNotice>,
}

impl<'a> Extractor<'a> {
    fn new(message: &'a Message) -> Self {
        Self {
            message,
            notices: Vec::new(),
        }
    }

    fn text(&self, path: FieldPath) -> Option<String> {
        self.message.get(&path)
    }

    fn datetime(&mut self, path: FieldPath) -> Option<NaiveDateTime> {
        let raw = self.message.get(&path)?;
        let parsed = hl7::parse_datetime(&raw);
        if parsed.is_none() {
            self.malformed_timestamp(&path, &raw);
        }
        parsed
    }

    fn date(&mut self, path: FieldPath) -> Option<NaiveDate> {
        let raw = self.message.get(&path)?;
        let parsed = hl7::parse_date(&raw);
        if parsed.is_none() {
            self.malformed_timestamp(&path, &raw);
        }
        parsed
    }

    fn malformed_timestamp(&mut self, path: &FieldPath, raw: &str) {
        self.notices.push(ParseNotice {
            kind: NoticeKind::MalformedTimestamp,
            location: format!("{}-{}", segment_label(path), path.field),
            message: format!("'{raw}' is not a valid HL7 timestamp; value treated as absent"),
        });
    }

    fn dropped(&mut self, location: String, message: impl Into<String>) {
        tracing::warn!(%location, "dropping segment");
        self.notices.push(ParseNotice {
            kind: NoticeKind::DroppedSegment,
            location,
            message: message.into(),
        });
    }

    fn header(&mut self) -> Header {
        let msh = |field| FieldPath::new(HEADER_SEGMENT, field);
        Header {
            message_type: self.text(msh(9).component(1)),
            trigger_event: self.text(msh(9).component(2)),
            control_id: self.text(msh(10)),
            version: self.text(msh(12).component(1)),
            processing_id: self.text(msh(11).component(1)),
            sending_application: self.text(msh(3).component(1)),
            sending_facility: self.text(msh(4).component(1)),
            receiving_application: self.text(msh(5).component(1)),
            receiving_facility: self.text(msh(6).component(1)),
            timestamp: self.datetime(msh(7).component(1)),
        }
    }

    fn patient(&mut self) -> Option<PatientRecord> {
        if !self.message.has_segment("PID") {
            return None;
        }
        let pid = |field| FieldPath::new("PID", field);

        let patient_id = self.text(pid(3).component(1));
        let medical_record_number = self.medical_record_number().or_else(|| patient_id.clone());

        let address = AddressRecord {
            street: self.text(pid(11).component(1)),
            other_designation: self.text(pid(11).component(2)),
            city: self.text(pid(11).component(3)),
            state: self.text(pid(11).component(4)),
            postal_code: self.text(pid(11).component(5)),
            country: self.text(pid(11).component(6)),
        };

        let record = PatientRecord {
            patient_id,
            medical_record_number,
            last_name: self.text(pid(5).component(1)),
            first_name: self.text(pid(5).component(2)),
            middle_name: self.text(pid(5).component(3)),
            birth_date: self.date(pid(7).component(1)),
            sex: self.text(pid(8).component(1)),
            address: (address != AddressRecord::default()).then_some(address),
            phone: self.text(pid(13).component(1)),
            marital_status: self.text(pid(16).component(1)),
            race: self.text(pid(10).component(1)),
        };

        if record.is_identified() {
            Some(record)
        } else {
            tracing::debug!("PID carries no identifier or name; patient omitted");
            None
        }
    }

    /// Id of the PID-3 repetition typed `MR`, if any.
    fn medical_record_number(&self) -> Option<String> {
        let repetitions = self
            .message
            .segment("PID", 0)?
            .raw_field(3)?
            .split(self.message.delimiters().repetition)
            .count();

        (0..repetitions).find_map(|repetition| {
            let identifier = FieldPath::new("PID", 3).field_repetition(repetition);
            let type_code = self.text(identifier.clone().component(5))?;
            if type_code.eq_ignore_ascii_case(MRN_IDENTIFIER_TYPE) {
                self.text(identifier.component(1))
            } else {
                None
            }
        })
    }

    fn provider(&self, path: FieldPath) -> Option<Provider> {
        let provider = Provider {
            id: self.text(path.clone().component(1)),
            family_name: self.text(path.clone().component(2)),
            given_name: self.text(path.component(3)),
        };
        (provider != Provider::default()).then_some(provider)
    }

    fn visit(&mut self) -> Option<VisitRecord> {
        if !self.message.has_segment("PV1") {
            return None;
        }
        let pv1 = |field| FieldPath::new("PV1", field);

        let location = Location {
            unit: self.text(pv1(3).component(1)),
            room: self.text(pv1(3).component(2)),
            bed: self.text(pv1(3).component(3)),
            facility: self.text(pv1(3).component(4)),
        };

        let record = VisitRecord {
            visit_number: self.text(pv1(19).component(1)),
            patient_class: self.text(pv1(2).component(1)),
            location: (location != Location::default()).then_some(location),
            admission_type: self.text(pv1(4).component(1)),
            hospital_service: self.text(pv1(10).component(1)),
            admitted_at: self.datetime(pv1(44).component(1)),
            discharged_at: self.datetime(pv1(45).component(1)),
            attending: self.provider(pv1(7)),
            referring: self.provider(pv1(8)),
        };

        if record.is_identified() {
            Some(record)
        } else {
            tracing::debug!("PV1 carries no visit number, class or location; visit omitted");
            None
        }
    }

    fn order(&mut self) -> Option<OrderRecord> {
        let has_orc = self.message.has_segment("ORC");
        let has_obr = self.message.has_segment("OBR");
        if !has_orc && !has_obr {
            return None;
        }
        let orc = |field| FieldPath::new("ORC", field);
        let obr = |field| FieldPath::new("OBR", field);

        let record = OrderRecord {
            order_number: self.text(orc(2).component(1)),
            placer_order_number: self
                .text(orc(2).component(1))
                .or_else(|| self.text(obr(2).component(1))),
            filler_order_number: self
                .text(orc(3).component(1))
                .or_else(|| self.text(obr(3).component(1))),
            status: self.text(orc(1).component(1)),
            code: self.text(obr(4).component(1)),
            display: self.text(obr(4).component(2)),
            ordering_provider: self.provider(orc(12)),
            ordered_at: self.datetime(orc(9).component(1)),
            priority: self.text(obr(5).component(1)),
        };

        if record.order_number.is_some() || record.code.is_some() {
            Some(record)
        } else {
            self.dropped(
                if has_orc { "ORC" } else { "OBR" }.to_string(),
                "order carries neither an order number nor a code",
            );
            None
        }
    }

    fn observations(&mut self, limit: usize) -> Vec<ObservationRecord> {
        let present = self.message.count("OBX");
        if present > limit {
            self.dropped(
                format!("OBX({limit})"),
                format!("{} OBX segments beyond the limit of {limit} were ignored", present - limit),
            );
        }

        let mut records = Vec::with_capacity(present.min(limit));
        for index in 0..present.min(limit) {
            let obx = |field| FieldPath::new("OBX", field).repetition(index);
            let record = ObservationRecord {
                set_id: self.text(obx(1)),
                code: self.text(obx(3).component(1)),
                display: self.text(obx(3).component(2)),
                value: self.text(obx(5).component(1)),
                units: self.text(obx(6).component(1)),
                reference_range: self.text(obx(7).component(1)),
                abnormal_flag: self.text(obx(8).component(1)),
                result_status: self.text(obx(11).component(1)),
                observed_at: self.datetime(obx(14).component(1)),
            };

            if record.code.is_some() || record.set_id.is_some() {
                records.push(record);
            } else {
                self.dropped(
                    format!("OBX({index})"),
                    "result carries neither a set id nor an observation code",
                );
            }
        }
        records
    }
}

fn segment_label(path: &FieldPath) -> String {
    if path.segment_repetition > 0 {
        format!("{}({})", path.segment, path.segment_repetition)
    } else {
        path.segment.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl7::Hl7Error;

    const HEADER: &str = "MSH|^~\\&|A|F1|B|F2|20240715120000||ADT^A01|12345|P|2.4";

    fn parse(text: &str) -> ParsedMessage {
        MessageParser::default().parse(text).expect("parse message")
    }

    fn with_header(header: &str, body: &[&str]) -> String {
        let mut text = header.to_string();
        for segment in body {
            text.push('\r');
            text.push_str(segment);
        }
        text
    }

    #[test]
    fn extracts_header_fields() {
        let parsed = parse(&with_header(HEADER, &["PID|1||123"]));
        let header = &parsed.header;
        assert_eq!(header.message_type.as_deref(), Some("ADT"));
        assert_eq!(header.trigger_event.as_deref(), Some("A01"));
        assert_eq!(header.control_id.as_deref(), Some("12345"));
        assert_eq!(header.version.as_deref(), Some("2.4"));
        assert_eq!(header.processing_id.as_deref(), Some("P"));
        assert_eq!(header.sending_application.as_deref(), Some("A"));
        assert_eq!(header.receiving_facility.as_deref(), Some("F2"));
        assert_eq!(
            header.timestamp,
            NaiveDate::from_ymd_opt(2024, 7, 15).and_then(|d| d.and_hms_opt(12, 0, 0))
        );
    }

    #[test]
    fn splits_name_into_parts() {
        let parsed = parse(&with_header(HEADER, &["PID|1||123||DOE^JOHN^Q"]));
        let patient = parsed.patient.expect("patient");
        assert_eq!(patient.last_name.as_deref(), Some("DOE"));
        assert_eq!(patient.first_name.as_deref(), Some("JOHN"));
        assert_eq!(patient.middle_name.as_deref(), Some("Q"));
    }

    #[test]
    fn family_only_name_leaves_given_parts_absent() {
        let parsed = parse(&with_header(HEADER, &["PID|1||123||DOE"]));
        let patient = parsed.patient.expect("patient");
        assert_eq!(patient.last_name.as_deref(), Some("DOE"));
        assert!(patient.first_name.is_none());
        assert!(patient.middle_name.is_none());
    }

    #[test]
    fn extracts_demographics() {
        let parsed = parse(&with_header(
            HEADER,
            &["PID|1||123^^^HOSP^PI~M555^^^HOSP^MR||DOE^JANE||19800101|F||2106-3|1 Main St^Apt 2^Springfield^IL^62701||555-1234|||M"],
        ));
        let patient = parsed.patient.expect("patient");
        assert_eq!(patient.patient_id.as_deref(), Some("123"));
        assert_eq!(patient.medical_record_number.as_deref(), Some("M555"));
        assert_eq!(patient.birth_date, NaiveDate::from_ymd_opt(1980, 1, 1));
        assert_eq!(patient.sex.as_deref(), Some("F"));
        assert_eq!(patient.race.as_deref(), Some("2106-3"));
        assert_eq!(patient.phone.as_deref(), Some("555-1234"));
        assert_eq!(patient.marital_status.as_deref(), Some("M"));

        let address = patient.address.expect("address");
        assert_eq!(address.street.as_deref(), Some("1 Main St"));
        assert_eq!(address.other_designation.as_deref(), Some("Apt 2"));
        assert_eq!(address.city.as_deref(), Some("Springfield"));
        assert_eq!(address.state.as_deref(), Some("IL"));
        assert_eq!(address.postal_code.as_deref(), Some("62701"));
    }

    #[test]
    fn mrn_falls_back_to_patient_id() {
        let parsed = parse(&with_header(HEADER, &["PID|1||123^^^MRN||DOE^JOHN"]));
        let patient = parsed.patient.expect("patient");
        assert_eq!(patient.medical_record_number.as_deref(), Some("123"));
    }

    #[test]
    fn empty_address_components_mean_no_address() {
        let parsed = parse(&with_header(HEADER, &["PID|1||123||DOE||||||^^^^"]));
        assert!(parsed.patient.expect("patient").address.is_none());
    }

    #[test]
    fn pid_without_identity_yields_no_patient() {
        let parsed = parse(&with_header(HEADER, &["PID|1||||||19800101|M"]));
        assert!(parsed.patient.is_none());
    }

    #[test]
    fn extracts_visit_with_location_and_providers() {
        let parsed = parse(&with_header(
            HEADER,
            &[
                "PID|1||123",
                "PV1|1|I|4W^401^A^MAIN|E|||1234^Smith^Anna|5678^Jones^Bob||MED|||||||||V100|||||||||||||||||||||||||20240715080000|20240716100000",
            ],
        ));
        let visit = parsed.visit.expect("visit");
        assert_eq!(visit.visit_number.as_deref(), Some("V100"));
        assert_eq!(visit.patient_class.as_deref(), Some("I"));
        assert_eq!(visit.admission_type.as_deref(), Some("E"));
        assert_eq!(visit.hospital_service.as_deref(), Some("MED"));

        let location = visit.location.expect("location");
        assert_eq!(location.unit.as_deref(), Some("4W"));
        assert_eq!(location.room.as_deref(), Some("401"));
        assert_eq!(location.bed.as_deref(), Some("A"));
        assert_eq!(location.facility.as_deref(), Some("MAIN"));

        assert_eq!(
            visit.attending.and_then(|p| p.display()).as_deref(),
            Some("Anna Smith")
        );
        assert_eq!(visit.referring.and_then(|p| p.id).as_deref(), Some("5678"));
        assert_eq!(
            visit.admitted_at,
            NaiveDate::from_ymd_opt(2024, 7, 15).and_then(|d| d.and_hms_opt(8, 0, 0))
        );
        assert!(visit.discharged_at.is_some());
    }

    #[test]
    fn no_pv1_means_no_visit() {
        let parsed = parse(&with_header(HEADER, &["PID|1||123"]));
        assert!(parsed.visit.is_none());
    }

    #[test]
    fn extracts_one_order_from_orc_and_obr() {
        let header = "MSH|^~\\&|A|F1|B|F2|20240715120000||ORM^O01|O1|P|2.3";
        let parsed = parse(&with_header(
            header,
            &[
                "PID|1||123",
                "ORC|NW|ORD1|FIL1||||||20240715113000|||1234^Smith^Anna",
                "OBR|1|PLC1||CBC^Complete Blood Count|S",
            ],
        ));
        assert_eq!(parsed.orders.len(), 1);
        let order = &parsed.orders[0];
        assert_eq!(order.order_number.as_deref(), Some("ORD1"));
        assert_eq!(order.placer_order_number.as_deref(), Some("ORD1"));
        assert_eq!(order.filler_order_number.as_deref(), Some("FIL1"));
        assert_eq!(order.status.as_deref(), Some("NW"));
        assert_eq!(order.code.as_deref(), Some("CBC"));
        assert_eq!(order.display.as_deref(), Some("Complete Blood Count"));
        assert_eq!(order.priority.as_deref(), Some("S"));
        assert!(order.ordered_at.is_some());
        assert_eq!(
            order.ordering_provider.as_ref().and_then(Provider::display).as_deref(),
            Some("Anna Smith")
        );
    }

    #[test]
    fn order_without_number_or_code_is_dropped_with_notice() {
        let header = "MSH|^~\\&|A|F1|B|F2|20240715120000||ORM^O01|O1|P|2.3";
        let (parsed, notices) = MessageParser::default()
            .parse_with_notices(&with_header(header, &["PID|1||123", "ORC|NW", "OBR|1"]))
            .expect("parse");
        assert!(parsed.orders.is_empty());
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::DroppedSegment);
    }

    #[test]
    fn placer_number_comes_from_order_control_first() {
        let header = "MSH|^~\\&|A|F1|B|F2|20240715120000||ORM^O01|O2|P|2.3";
        let parsed = parse(&with_header(header, &["PID|1||123", "ORC|NW|ORD1|FIL1", "OBR|1|||CBC"]));
        let order = &parsed.orders[0];
        assert_eq!(order.placer_order_number.as_deref(), Some("ORD1"));
        assert_eq!(order.filler_order_number.as_deref(), Some("FIL1"));

        let parsed = parse(&with_header(header, &["PID|1||123", "ORC|NW", "OBR|1|OBR1|OBRF|CBC"]));
        let order = &parsed.orders[0];
        assert_eq!(order.placer_order_number.as_deref(), Some("OBR1"));
        assert_eq!(order.filler_order_number.as_deref(), Some("OBRF"));
    }

    #[test]
    fn extracts_observations_in_source_order() {
        let header = "MSH|^~\\&|LAB|F1|EHR|F2|20240715120000||ORU^R01|R1|P|2.5";
        let parsed = parse(&with_header(
            header,
            &[
                "PID|1||123",
                "OBR|1|||PANEL",
                "OBX|1|NM|2823-3^Potassium||4.2|mmol/L|3.5-5.0|N|||F|||20240715110000",
                "OBX|2|NM|2951-2^Sodium||140|mmol/L|135-145|N|||F",
                "OBX|3|ST|COLOR^Color||Yellow||||||P",
            ],
        ));
        let codes: Vec<_> = parsed
            .observations
            .iter()
            .map(|o| o.code.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(codes, vec!["2823-3", "2951-2", "COLOR"]);

        let potassium = &parsed.observations[0];
        assert_eq!(potassium.set_id.as_deref(), Some("1"));
        assert_eq!(potassium.display.as_deref(), Some("Potassium"));
        assert_eq!(potassium.value.as_deref(), Some("4.2"));
        assert_eq!(potassium.units.as_deref(), Some("mmol/L"));
        assert_eq!(potassium.reference_range.as_deref(), Some("3.5-5.0"));
        assert_eq!(potassium.abnormal_flag.as_deref(), Some("N"));
        assert_eq!(potassium.result_status.as_deref(), Some("F"));
        assert!(potassium.observed_at.is_some());
        assert_eq!(parsed.observations[2].result_status.as_deref(), Some("P"));
    }

    #[test]
    fn observation_bound_is_enforced() {
        let config = BridgeConfig::new(
            2,
            20,
            "http://hospital.example.org".into(),
            crate::ValidationPolicy::Reject,
        )
        .expect("config");
        let header = "MSH|^~\\&|LAB|F1|EHR|F2|20240715120000||ORU^R01|R1|P|2.5";
        let text = with_header(
            header,
            &["PID|1||123", "OBX|1||A||1", "OBX|2||B||2", "OBX|3||C||3"],
        );
        let (parsed, notices) = MessageParser::new(&config)
            .parse_with_notices(&text)
            .expect("parse");
        assert_eq!(parsed.observations.len(), 2);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::DroppedSegment);
    }

    #[test]
    fn uninterpretable_obx_is_dropped_with_notice() {
        let header = "MSH|^~\\&|LAB|F1|EHR|F2|20240715120000||ORU^R01|R1|P|2.5";
        let (parsed, notices) = MessageParser::default()
            .parse_with_notices(&with_header(header, &["OBX|1||A||1", "OBX|||||2"]))
            .expect("parse");
        assert_eq!(parsed.observations.len(), 1);
        assert_eq!(notices[0].location, "OBX(1)");
    }

    #[test]
    fn malformed_timestamps_degrade_to_absent() {
        let (parsed, notices) = MessageParser::default()
            .parse_with_notices(&with_header(HEADER, &["PID|1||123||DOE||1980-01-01"]))
            .expect("parse");
        assert!(parsed.patient.expect("patient").birth_date.is_none());
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::MalformedTimestamp);
        assert_eq!(notices[0].location, "PID-7");
    }

    #[test]
    fn adt_does_not_extract_orders_or_observations() {
        let parsed = parse(&with_header(
            HEADER,
            &["PID|1||123", "ORC|NW|ORD1", "OBX|1||A||1"],
        ));
        assert!(parsed.orders.is_empty());
        assert!(parsed.observations.is_empty());
    }

    #[test]
    fn parsing_is_deterministic() {
        let text = with_header(HEADER, &["PID|1||123^^^MRN||DOE^JOHN||19800101|M"]);
        assert_eq!(parse(&text), parse(&text));
    }

    #[test]
    fn parse_message_reads_wrapper_text() {
        let raw = RawMessage::new(with_header(HEADER, &["PID|1||123"]));
        let parsed = MessageParser::default().parse_message(&raw).expect("parse");
        assert_eq!(parsed.patient_id(), Some("123"));
    }

    #[test]
    fn text_without_header_is_a_parse_error() {
        let err = MessageParser::default()
            .parse("PID|1||123\rPV1|1|I")
            .expect_err("no header");
        assert!(matches!(err, Hl7Error::MissingHeader));
    }

    #[test]
    fn supported_message_types_are_case_insensitive() {
        assert!(supports_message_type("ADT"));
        assert!(supports_message_type("oru"));
        assert!(supports_message_type("SIU^S12"));
        assert!(!supports_message_type("DFT"));
        assert!(!supports_message_type(""));
    }
}

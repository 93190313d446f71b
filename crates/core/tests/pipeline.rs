use bridge_core::{
    BridgeConfig, BridgeError, IssueCode, MessageParser, MessageStatus, Pipeline, RawMessage,
    ResourceOutcome, TransformCache, Transformer, ValidationPolicy, Validator,
};
use fhir::{
    Encounter, Observation, ObservationValue, Patient, Reference, ResourceType, ServiceRequest,
};
use std::sync::Arc;

const HEADER: &str = "MSH|^~\\&|A|F1|B|F2|20240715120000||ADT^A01|12345|P|2.4";

const ORU: &str = "MSH|^~\\&|LAB|HOSP|EHR|HOSP|20240715120000||ORU^R01|LAB42|P|2.5\r\
PID|1||123^^^MRN||DOE^JOHN^Q||19800101|M\r\
PV1|1|I|4W^401^A||||||||||||||||V100\r\
OBR|1|ORD1||GLU^Glucose\r\
OBX|1|NM|GLU^Glucose||7.5|mmol/L|3.5-7.8|N|||F|||20240715110000\r\
OBX|2|ST|HGT^Height||Tall||||||P\r\
OBX|3|NM|NA^Sodium||140|mmol/L|135-145|N|||F";

fn adt(pid: &str) -> String {
    format!("{HEADER}\r{pid}")
}

#[test]
fn adt_a01_maps_to_one_patient() {
    let text = adt("PID|1||123^^^MRN||DOE^JOHN||19800101|M");

    let validator = Validator::default();
    assert!(validator.validate_structure(&text).errors().is_empty());
    let business = validator.validate_business_rules(&text);
    assert!(business.errors().is_empty());
    assert!(business.warnings().is_empty());

    let outcome = Pipeline::new(&BridgeConfig::default())
        .process(&RawMessage::new(text))
        .expect("processed");
    assert_eq!(outcome.status, MessageStatus::Transformed);
    assert_eq!(outcome.resources.len(), 1);

    let resource = &outcome.resources[0];
    assert_eq!(resource.resource_type(), ResourceType::Patient);
    assert_eq!(resource.id(), "123");

    let patient = Patient::parse(resource.content()).expect("parse rendered patient");
    assert_eq!(patient.family.as_deref(), Some("DOE"));
    assert_eq!(patient.given, vec!["JOHN".to_string()]);
    assert_eq!(patient.gender.map(|g| g.to_wire()), Some("male"));
    assert_eq!(
        patient.birth_date.map(|d| d.to_string()).as_deref(),
        Some("1980-01-01")
    );
}

#[test]
fn empty_patient_id_is_reported_but_patient_still_parses() {
    let text = adt("PID|1||||DOE^JOHN||19800101|M");

    let outcome = Validator::default().validate(&text);
    let codes: Vec<_> = outcome.errors().iter().map(|issue| issue.code).collect();
    assert_eq!(codes, vec![IssueCode::EmptyPatientId]);

    let parsed = MessageParser::default().parse(&text).expect("parsed");
    let patient = parsed.patient.expect("patient present");
    assert_eq!(patient.patient_id, None);
    assert_eq!(patient.last_name.as_deref(), Some("DOE"));
    assert_eq!(patient.first_name.as_deref(), Some("JOHN"));
}

#[test]
fn missing_header_is_a_parse_error() {
    let text = "PID|1||123^^^MRN||DOE^JOHN||19800101|M";

    assert!(MessageParser::default().parse(text).is_err());

    let outcome = Validator::default().validate_structure(text);
    assert_eq!(outcome.errors()[0].code, IssueCode::ParseError);

    let err = Pipeline::new(&BridgeConfig::default())
        .process(&RawMessage::new(text))
        .expect_err("parse failure");
    match err {
        BridgeError::Hl7(_) => {}
        other => panic!("expected Hl7 error, got {other:?}"),
    }
}

#[test]
fn parsing_is_deterministic() {
    let parser = MessageParser::default();
    assert_eq!(parser.parse(ORU).expect("first"), parser.parse(ORU).expect("second"));
}

#[test]
fn oru_maps_patient_encounter_and_ordered_observations() {
    let outcome = Pipeline::new(&BridgeConfig::default())
        .process(&RawMessage::new(ORU))
        .expect("processed");
    assert!(outcome.skips.is_empty());

    let types: Vec<_> = outcome.resources.iter().map(|r| r.resource_type()).collect();
    assert_eq!(
        types,
        vec![
            ResourceType::Patient,
            ResourceType::Encounter,
            ResourceType::Observation,
            ResourceType::Observation,
            ResourceType::Observation,
        ]
    );

    let observations: Vec<serde_json::Value> = outcome.resources[2..]
        .iter()
        .map(|r| r.document().expect("json"))
        .collect();
    let codes: Vec<_> = observations
        .iter()
        .map(|o| o["code"]["coding"][0]["code"].clone())
        .collect();
    assert_eq!(codes, vec!["GLU", "HGT", "NA"]);

    assert_eq!(observations[0]["valueQuantity"]["value"], 7.5);
    assert_eq!(observations[0]["valueQuantity"]["unit"], "mmol/L");
    assert_eq!(observations[0]["subject"]["reference"], "Patient/123");
    assert_eq!(observations[0]["encounter"]["reference"], "Encounter/V100");
    assert_eq!(observations[1]["valueString"], "Tall");
    assert_eq!(observations[1]["status"], "preliminary");

    let encounter = Encounter::parse(outcome.resources[1].content()).expect("parse encounter");
    assert_eq!(encounter.id, "V100");
    assert_eq!(
        encounter.subject,
        Some(Reference::to(ResourceType::Patient, "123"))
    );
    assert_eq!(encounter.location.as_deref(), Some("4W - Room 401 - Bed A"));
    assert!(outcome
        .resources
        .iter()
        .all(|r| r.source_message_id() == Some("LAB42")));
}

#[test]
fn order_without_patient_still_emits_service_request() {
    let text = "MSH|^~\\&|CPOE|HOSP|LAB|HOSP|20240715120000||ORM^O01|ORD77|P|2.3\r\
ORC|NW|ORD1|FIL1\r\
OBR|1|||CBC^Complete Blood Count";

    let validation = Validator::default().validate(text);
    assert!(validation.is_valid(), "unexpected errors: {:?}", validation.errors());

    let outcome = Pipeline::new(&BridgeConfig::default())
        .process(&RawMessage::new(text))
        .expect("processed");
    assert_eq!(outcome.status, MessageStatus::Transformed);
    assert!(outcome.skips.is_empty());

    let types: Vec<_> = outcome.resources.iter().map(|r| r.resource_type()).collect();
    assert_eq!(types, vec![ResourceType::ServiceRequest]);

    let order = ServiceRequest::parse(outcome.resources[0].content()).expect("parse order");
    assert_eq!(order.id, "ORD1");
    assert_eq!(order.subject, None);
    assert_eq!(order.code.map(|c| c.code).as_deref(), Some("CBC"));
}

#[test]
fn every_kept_result_becomes_an_observation() {
    let text = "MSH|^~\\&|LAB|HOSP|EHR|HOSP|20240715120000||ORU^R01|LAB43|P|2.5\r\
PID|1||123^^^MRN||DOE^JOHN\r\
OBR|1|ORD1||PANEL\r\
OBX|1|NM|GLU^Glucose||7.5|mmol/L\r\
OBX|2|ST|||Comment only\r\
OBX|3|NM|NA^Sodium||140|mmol/L";

    let (parsed, notices) = MessageParser::default()
        .parse_with_notices(text)
        .expect("parsed");
    assert_eq!(parsed.observations.len(), 3);
    assert!(notices.is_empty());

    let outcome = Pipeline::new(&BridgeConfig::default())
        .process(&RawMessage::new(text))
        .expect("processed");
    assert!(outcome.skips.is_empty());

    let observations: Vec<_> = outcome
        .resources
        .iter()
        .filter(|r| r.resource_type() == ResourceType::Observation)
        .map(|r| Observation::parse(r.content()).expect("parse observation"))
        .collect();
    assert_eq!(observations.len(), parsed.observations.len());
    assert_eq!(observations[1].code, None);
    assert_eq!(
        observations[1].value,
        Some(ObservationValue::Text("Comment only".to_string()))
    );
    let codes: Vec<_> = observations
        .iter()
        .map(|o| o.code.as_ref().map(|c| c.code.as_str()))
        .collect();
    assert_eq!(codes, vec![Some("GLU"), None, Some("NA")]);
}

#[test]
fn message_without_visit_has_no_encounter() {
    let parsed = MessageParser::default()
        .parse(&adt("PID|1||123||DOE^JOHN"))
        .expect("parsed");
    let report = Transformer::default().transform(&parsed);
    assert_eq!(report.of_type(ResourceType::Encounter).count(), 0);
    assert_eq!(
        Transformer::default().transform_resource(&parsed, ResourceType::Encounter),
        ResourceOutcome::NotApplicable
    );
}

#[test]
fn quarantine_policy_from_yaml_config() {
    let config = BridgeConfig::from_yaml_str("validation_policy: quarantine\n").expect("config");
    let outcome = Pipeline::new(&config)
        .process(&RawMessage::new(adt("PID|1||||DOE^JOHN")))
        .expect("quarantined");
    assert_eq!(outcome.status, MessageStatus::Invalid);
    assert!(outcome.resources.is_empty());
}

#[test]
fn cache_is_shared_across_pipelines_and_invalidated_per_patient() {
    let cache = Arc::new(TransformCache::new());
    let config = BridgeConfig::default();
    let first = Pipeline::new(&config).with_cache(Arc::clone(&cache));
    let second = Pipeline::new(&config).with_cache(Arc::clone(&cache));

    first.process(&RawMessage::new(ORU)).expect("first");
    second.process(&RawMessage::new(ORU)).expect("second");
    assert_eq!(cache.len(), 1);

    assert_eq!(cache.invalidate_patient("123"), 1);
    assert!(cache.is_empty());
}

#[test]
fn policy_is_rejected_by_default() {
    assert_eq!(
        BridgeConfig::default().validation_policy(),
        ValidationPolicy::Reject
    );
}

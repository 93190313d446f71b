//! Transformer: [`ParsedMessage`] to FHIR [`TargetResource`]s.
//!
//! Emits one Patient for the patient record, one Encounter for the visit, one
//! Observation per result and one ServiceRequest per order, in that order. Each item
//! maps independently: a failure is logged, reported as a [`MappingSkip`] and the
//! remaining items still map.
//!
//! Resource ids come from the source identifiers (sanitised to the FHIR id grammar)
//! and fall back to a random UUID. Patient and Encounter ids are fixed before any
//! resource is rendered so every subject/encounter reference resolves within the batch.

use crate::constants::{
    FILLER_ORDER_NUMBER_SYSTEM, LOINC_SYSTEM, MARITAL_STATUS_SYSTEM, MRN_SYSTEM,
    ORDER_NUMBER_SYSTEM, PATIENT_ID_SYSTEM, PLACER_ORDER_NUMBER_SYSTEM, UCUM_SYSTEM,
    VISIT_NUMBER_SYSTEM,
};
use crate::model::{ObservationRecord, OrderRecord, ParsedMessage, PatientRecord, VisitRecord};
use crate::BridgeConfig;
use fhir::observation::INTERPRETATION_SYSTEM;
use fhir::{
    sanitize_id, AdministrativeGender, CodeableConcept, Coding, Encounter, EncounterClass,
    EncounterData, EncounterParticipant, EncounterStatus, FhirResult, Identifier, NameUse,
    Observation, ObservationData, ObservationStatus, ObservationValue, ParticipantRole, Patient,
    PatientAddress, PatientData, Quantity, Reference, RequestPriority, RequestStatus,
    ResourceType, ServiceRequest, ServiceRequestData, TargetResource,
};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

// ============================================================================
// Public domain-level types
// ============================================================================

/// One item that could not be mapped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSkip {
    pub resource_type: ResourceType,
    /// Position among items of the same type (0 for Patient and Encounter).
    pub index: usize,
    pub reason: String,
}

/// Everything one transformation produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TransformReport {
    pub resources: Vec<TargetResource>,
    pub skips: Vec<MappingSkip>,
}

impl TransformReport {
    /// Resources of one type, in emission order.
    pub fn of_type(&self, resource_type: ResourceType) -> impl Iterator<Item = &TargetResource> {
        self.resources
            .iter()
            .filter(move |resource| resource.resource_type() == resource_type)
    }
}

/// Result of asking for a single resource type.
#[derive(Clone, Debug, PartialEq)]
pub enum ResourceOutcome {
    Mapped(TargetResource),
    /// The message carries nothing that maps to this type.
    NotApplicable,
    Skipped(MappingSkip),
}

// ============================================================================
// Transformer
// ============================================================================

/// Maps the intermediate model to FHIR R4 resources.
#[derive(Clone, Debug)]
pub struct Transformer {
    config: BridgeConfig,
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new(&BridgeConfig::default())
    }
}

impl Transformer {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Map every populated sub-model. Never fails; unmappable items become skips.
    pub fn transform(&self, parsed: &ParsedMessage) -> TransformReport {
        let ids = LinkedIds::assign(parsed);
        let mut report = TransformReport::default();

        for resource_type in ResourceType::ALL {
            for outcome in self.map_all(parsed, &ids, resource_type) {
                match outcome {
                    ResourceOutcome::Mapped(resource) => report.resources.push(resource),
                    ResourceOutcome::Skipped(skip) => report.skips.push(skip),
                    ResourceOutcome::NotApplicable => {}
                }
            }
        }

        tracing::info!(
            control_id = parsed.control_id().unwrap_or("<none>"),
            resources = report.resources.len(),
            skipped = report.skips.len(),
            "transformed message"
        );
        report
    }

    /// Map only the first item of one resource type.
    pub fn transform_resource(
        &self,
        parsed: &ParsedMessage,
        resource_type: ResourceType,
    ) -> ResourceOutcome {
        let ids = LinkedIds::assign(parsed);
        self.map_all(parsed, &ids, resource_type)
            .into_iter()
            .next()
            .unwrap_or(ResourceOutcome::NotApplicable)
    }

    fn map_all(
        &self,
        parsed: &ParsedMessage,
        ids: &LinkedIds,
        resource_type: ResourceType,
    ) -> Vec<ResourceOutcome> {
        let source = parsed.control_id().map(str::to_string);
        let wrap = |index: usize, rendered: FhirResult<(String, String)>| {
            let resource = rendered.and_then(|(id, content)| {
                TargetResource::new(resource_type, id, content, source.clone())
            });
            match resource {
                Ok(resource) => ResourceOutcome::Mapped(resource),
                Err(err) => {
                    tracing::warn!(
                        control_id = source.as_deref().unwrap_or("<none>"),
                        resource_type = %resource_type,
                        index,
                        error = %err,
                        "skipping unmappable item"
                    );
                    ResourceOutcome::Skipped(MappingSkip {
                        resource_type,
                        index,
                        reason: err.to_string(),
                    })
                }
            }
        };

        match resource_type {
            ResourceType::Patient => match (&parsed.patient, &ids.patient) {
                (Some(patient), Some(id)) => vec![wrap(0, self.render_patient(patient, id))],
                _ => Vec::new(),
            },
            ResourceType::Encounter => match (&parsed.visit, &ids.encounter) {
                (Some(visit), Some(id)) => vec![wrap(0, self.render_encounter(visit, id, ids))],
                _ => Vec::new(),
            },
            ResourceType::Observation => {
                let mut used = HashSet::new();
                parsed
                    .observations
                    .iter()
                    .enumerate()
                    .map(|(index, record)| {
                        let id = unique_id(record.set_id.as_deref(), &mut used);
                        wrap(index, render_observation(record, id, ids))
                    })
                    .collect()
            }
            ResourceType::ServiceRequest => {
                let mut used = HashSet::new();
                parsed
                    .orders
                    .iter()
                    .enumerate()
                    .map(|(index, record)| {
                        let id = unique_id(record.order_number.as_deref(), &mut used);
                        wrap(index, self.render_service_request(record, id, ids))
                    })
                    .collect()
            }
        }
    }

    fn system(&self, suffix: &str) -> String {
        self.config.identifier_system(suffix)
    }

    fn render_patient(&self, record: &PatientRecord, id: &str) -> FhirResult<(String, String)> {
        let mut data = PatientData::new(id);

        if let Some(patient_id) = &record.patient_id {
            data.identifiers
                .push(Identifier::new(self.system(PATIENT_ID_SYSTEM), patient_id));
        }
        if let Some(mrn) = &record.medical_record_number {
            if record.patient_id.as_ref() != Some(mrn) {
                data.identifiers.push(Identifier::new(self.system(MRN_SYSTEM), mrn));
            }
        }

        if record.last_name.is_some() || record.first_name.is_some() {
            data.name_use = Some(NameUse::Official);
            data.family = record.last_name.clone();
            data.given = [&record.first_name, &record.middle_name]
                .into_iter()
                .flatten()
                .cloned()
                .collect();
        }

        data.gender = record.sex.as_deref().map(map_gender);
        data.birth_date = record.birth_date;

        data.address = record.address.as_ref().and_then(|address| {
            let mapped = PatientAddress {
                line: [&address.street, &address.other_designation]
                    .into_iter()
                    .flatten()
                    .cloned()
                    .collect(),
                city: address.city.clone(),
                state: address.state.clone(),
                postal_code: address.postal_code.clone(),
                country: address.country.clone(),
            };
            (!mapped.is_empty()).then_some(mapped)
        });
        data.phone = record.phone.clone();

        data.marital_status = record.marital_status.as_deref().map(|code| {
            let display = marital_status_display(code).unwrap_or(code);
            CodeableConcept::from_coding(
                Coding::new(MARITAL_STATUS_SYSTEM, code).with_display(display),
            )
        });

        Ok((data.id.clone(), Patient::render(&data)?))
    }

    fn render_encounter(
        &self,
        record: &VisitRecord,
        id: &str,
        ids: &LinkedIds,
    ) -> FhirResult<(String, String)> {
        let mut identifiers = Vec::new();
        if let Some(visit_number) = &record.visit_number {
            identifiers.push(Identifier::new(self.system(VISIT_NUMBER_SYSTEM), visit_number));
        }

        let participants = [
            (ParticipantRole::Attending, &record.attending),
            (ParticipantRole::Referring, &record.referring),
        ]
        .into_iter()
        .filter_map(|(role, provider)| {
            let display = provider.as_ref()?.display()?;
            Some(EncounterParticipant { role, display })
        })
        .collect();

        let data = EncounterData {
            id: id.to_string(),
            identifiers,
            status: EncounterStatus::Finished,
            class: record.patient_class.as_deref().map(map_encounter_class),
            service_type: record.hospital_service.clone(),
            subject: ids.subject(),
            participants,
            start: record.admitted_at,
            end: record.discharged_at,
            location: record.location.as_ref().and_then(|location| location.display()),
        };

        Ok((data.id.clone(), Encounter::render(&data)?))
    }

    fn render_service_request(
        &self,
        record: &OrderRecord,
        id: String,
        ids: &LinkedIds,
    ) -> FhirResult<(String, String)> {
        let identifiers = [
            (ORDER_NUMBER_SYSTEM, &record.order_number),
            (PLACER_ORDER_NUMBER_SYSTEM, &record.placer_order_number),
            (FILLER_ORDER_NUMBER_SYSTEM, &record.filler_order_number),
        ]
        .into_iter()
        .filter_map(|(suffix, value)| {
            value
                .as_ref()
                .map(|value| Identifier::new(self.system(suffix), value))
        })
        .collect();

        let data = ServiceRequestData {
            id,
            identifiers,
            status: record
                .status
                .as_deref()
                .map_or(RequestStatus::Active, map_request_status),
            priority: record.priority.as_deref().map(map_request_priority),
            code: coded(record.code.as_deref(), record.display.as_deref()),
            subject: ids.subject(),
            encounter: ids.encounter(),
            authored_on: record.ordered_at,
            requester: record
                .ordering_provider
                .as_ref()
                .and_then(|provider| provider.display())
                .map(Reference::display),
        };

        Ok((data.id.clone(), ServiceRequest::render(&data)?))
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Ids of the resources other resources point at.
struct LinkedIds {
    patient: Option<String>,
    encounter: Option<String>,
}

impl LinkedIds {
    fn assign(parsed: &ParsedMessage) -> Self {
        Self {
            patient: parsed
                .patient
                .as_ref()
                .map(|patient| resource_id(patient.patient_id.as_deref())),
            encounter: parsed
                .visit
                .as_ref()
                .map(|visit| resource_id(visit.visit_number.as_deref())),
        }
    }

    fn subject(&self) -> Option<Reference> {
        self.patient
            .as_deref()
            .map(|id| Reference::to(ResourceType::Patient, id))
    }

    fn encounter(&self) -> Option<Reference> {
        self.encounter
            .as_deref()
            .map(|id| Reference::to(ResourceType::Encounter, id))
    }
}

fn render_observation(
    record: &ObservationRecord,
    id: String,
    ids: &LinkedIds,
) -> FhirResult<(String, String)> {
    let data = ObservationData {
        id,
        identifiers: Vec::new(),
        status: record
            .result_status
            .as_deref()
            .and_then(map_observation_status)
            .unwrap_or(ObservationStatus::Final),
        code: coded(record.code.as_deref(), record.display.as_deref()),
        subject: ids.subject(),
        encounter: ids.encounter(),
        effective: record.observed_at,
        value: record
            .value
            .as_deref()
            .map(|value| observation_value(value, record.units.as_deref())),
        interpretation: record.abnormal_flag.as_deref().map(interpretation),
        reference_range: record.reference_range.clone(),
    };

    Ok((data.id.clone(), Observation::render(&data)?))
}

fn resource_id(candidate: Option<&str>) -> String {
    candidate
        .and_then(sanitize_id)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Like [`resource_id`], but never repeats an id already handed out in `used`.
fn unique_id(candidate: Option<&str>, used: &mut HashSet<String>) -> String {
    let id = candidate
        .and_then(sanitize_id)
        .filter(|id| !used.contains(id))
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    used.insert(id.clone());
    id
}

fn coded(code: Option<&str>, display: Option<&str>) -> Option<Coding> {
    let coding = Coding::new(LOINC_SYSTEM, code?);
    Some(match display {
        Some(display) => coding.with_display(display),
        None => coding,
    })
}

/// Numeric values become a Quantity (UCUM-coded when units are present).
fn observation_value(value: &str, units: Option<&str>) -> ObservationValue {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => ObservationValue::Quantity(Quantity {
            value: number,
            unit: units.map(str::to_string),
            system: units.map(|_| UCUM_SYSTEM.to_string()),
            code: units.map(str::to_string),
        }),
        _ => ObservationValue::Text(value.to_string()),
    }
}

fn map_gender(code: &str) -> AdministrativeGender {
    match code.trim().to_ascii_uppercase().as_str() {
        "M" | "MALE" => AdministrativeGender::Male,
        "F" | "FEMALE" => AdministrativeGender::Female,
        "O" | "OTHER" => AdministrativeGender::Other,
        _ => AdministrativeGender::Unknown,
    }
}

fn map_encounter_class(code: &str) -> EncounterClass {
    match code.trim().to_ascii_uppercase().as_str() {
        "I" | "INPATIENT" => EncounterClass::Inpatient,
        "E" | "EMERGENCY" => EncounterClass::Emergency,
        _ => EncounterClass::Ambulatory,
    }
}

fn map_observation_status(code: &str) -> Option<ObservationStatus> {
    match code.trim().to_ascii_uppercase().as_str() {
        "P" | "PRELIMINARY" => Some(ObservationStatus::Preliminary),
        "F" | "FINAL" => Some(ObservationStatus::Final),
        "C" | "CORRECTED" => Some(ObservationStatus::Corrected),
        "X" | "CANCELLED" => Some(ObservationStatus::Cancelled),
        _ => None,
    }
}

fn map_request_status(code: &str) -> RequestStatus {
    match code.trim().to_ascii_uppercase().as_str() {
        "C" | "COMPLETED" => RequestStatus::Completed,
        "CA" | "CANCELLED" => RequestStatus::Revoked,
        "H" | "HOLD" => RequestStatus::OnHold,
        _ => RequestStatus::Active,
    }
}

fn map_request_priority(code: &str) -> RequestPriority {
    match code.trim().to_ascii_uppercase().as_str() {
        "S" | "STAT" => RequestPriority::Stat,
        "A" | "ASAP" => RequestPriority::Asap,
        "U" | "URGENT" => RequestPriority::Urgent,
        _ => RequestPriority::Routine,
    }
}

fn marital_status_display(code: &str) -> Option<&'static str> {
    let display = match code.trim().to_ascii_uppercase().as_str() {
        "A" => "Annulled",
        "D" => "Divorced",
        "I" => "Interlocutory",
        "L" => "Legally Separated",
        "M" => "Married",
        "P" => "Polygamous",
        "S" => "Never Married",
        "T" => "Domestic partner",
        "U" => "unmarried",
        "W" => "Widowed",
        _ => return None,
    };
    Some(display)
}

fn interpretation(flag: &str) -> Coding {
    let code = flag.trim().to_ascii_uppercase();
    let display = match code.as_str() {
        "N" => Some("Normal"),
        "H" => Some("High"),
        "L" => Some("Low"),
        "HH" => Some("Critical high"),
        "LL" => Some("Critical low"),
        "A" => Some("Abnormal"),
        "AA" => Some("Critical abnormal"),
        _ => None,
    };
    let coding = Coding::new(INTERPRETATION_SYSTEM, code);
    match display {
        Some(display) => coding.with_display(display),
        None => coding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, Provider};
    use chrono::NaiveDate;
    use serde_json::Value;

    fn document(resource: &TargetResource) -> Value {
        resource.document().expect("rendered JSON")
    }

    fn patient(id: &str) -> PatientRecord {
        PatientRecord {
            patient_id: Some(id.into()),
            last_name: Some("DOE".into()),
            first_name: Some("JOHN".into()),
            ..PatientRecord::default()
        }
    }

    fn observation(set_id: &str, code: &str, value: &str) -> ObservationRecord {
        ObservationRecord {
            set_id: Some(set_id.into()),
            code: Some(code.into()),
            value: Some(value.into()),
            ..ObservationRecord::default()
        }
    }

    #[test]
    fn maps_patient_demographics() {
        let mut record = patient("123");
        record.birth_date = NaiveDate::from_ymd_opt(1980, 1, 1);
        record.sex = Some("M".into());
        record.marital_status = Some("M".into());
        let parsed = ParsedMessage {
            patient: Some(record),
            ..ParsedMessage::default()
        };

        let report = Transformer::default().transform(&parsed);
        assert_eq!(report.resources.len(), 1);
        assert!(report.skips.is_empty());

        let resource = &report.resources[0];
        assert_eq!(resource.resource_type(), ResourceType::Patient);
        assert_eq!(resource.id(), "123");

        let json = document(resource);
        assert_eq!(json["name"][0]["family"], "DOE");
        assert_eq!(json["name"][0]["given"], serde_json::json!(["JOHN"]));
        assert_eq!(json["gender"], "male");
        assert_eq!(json["birthDate"], "1980-01-01");
        assert_eq!(json["identifier"][0]["system"], "http://hospital.example.org/patient-id");
        assert_eq!(json["maritalStatus"]["coding"][0]["display"], "Married");
    }

    #[test]
    fn mrn_identifier_only_when_distinct() {
        let mut record = patient("123");
        record.medical_record_number = Some("123".into());
        let same = ParsedMessage {
            patient: Some(record.clone()),
            ..ParsedMessage::default()
        };
        let report = Transformer::default().transform(&same);
        let json = document(&report.resources[0]);
        assert_eq!(json["identifier"].as_array().map(Vec::len), Some(1));

        record.medical_record_number = Some("MRN9".into());
        let distinct = ParsedMessage {
            patient: Some(record),
            ..ParsedMessage::default()
        };
        let report = Transformer::default().transform(&distinct);
        let json = document(&report.resources[0]);
        assert_eq!(json["identifier"][1]["value"], "MRN9");
        assert_eq!(json["identifier"][1]["system"], "http://hospital.example.org/mrn");
    }

    #[test]
    fn unknown_sex_code_maps_to_unknown() {
        assert_eq!(map_gender("X"), AdministrativeGender::Unknown);
        assert_eq!(map_gender("female"), AdministrativeGender::Female);
    }

    #[test]
    fn patient_without_id_gets_generated_id() {
        let record = PatientRecord {
            last_name: Some("DOE".into()),
            ..PatientRecord::default()
        };
        let parsed = ParsedMessage {
            patient: Some(record),
            ..ParsedMessage::default()
        };
        let report = Transformer::default().transform(&parsed);
        let id = report.resources[0].id();
        assert!(Uuid::parse_str(id).is_ok(), "expected uuid id, got {id}");
    }

    #[test]
    fn numeric_values_become_quantities() {
        match observation_value("7.5", Some("mmol/L")) {
            ObservationValue::Quantity(quantity) => {
                assert_eq!(quantity.value, 7.5);
                assert_eq!(quantity.system.as_deref(), Some(UCUM_SYSTEM));
                assert_eq!(quantity.code.as_deref(), Some("mmol/L"));
            }
            other => panic!("expected quantity, got {other:?}"),
        }
        assert_eq!(
            observation_value("Tall", None),
            ObservationValue::Text("Tall".into())
        );
        assert_eq!(
            observation_value("NaN", None),
            ObservationValue::Text("NaN".into())
        );
    }

    #[test]
    fn observations_keep_source_order_and_link_to_patient_and_encounter() {
        let parsed = ParsedMessage {
            patient: Some(patient("123")),
            visit: Some(VisitRecord {
                visit_number: Some("V100".into()),
                ..VisitRecord::default()
            }),
            observations: vec![
                observation("1", "GLU", "7.5"),
                observation("2", "HGT", "Tall"),
                observation("3", "NA", "140"),
            ],
            ..ParsedMessage::default()
        };

        let report = Transformer::default().transform(&parsed);
        let observations: Vec<_> = report.of_type(ResourceType::Observation).collect();
        assert_eq!(observations.len(), 3);
        let ids: Vec<_> = observations.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        let first = document(observations[0]);
        assert_eq!(first["subject"]["reference"], "Patient/123");
        assert_eq!(first["encounter"]["reference"], "Encounter/V100");
        assert_eq!(first["valueQuantity"]["value"], 7.5);
        assert_eq!(first["status"], "final");
        assert_eq!(first["code"]["coding"][0]["system"], LOINC_SYSTEM);

        let second = document(observations[1]);
        assert_eq!(second["valueString"], "Tall");
    }

    #[test]
    fn no_visit_means_no_encounter() {
        let parsed = ParsedMessage {
            patient: Some(patient("123")),
            observations: vec![observation("1", "GLU", "7.5")],
            ..ParsedMessage::default()
        };
        let report = Transformer::default().transform(&parsed);
        assert_eq!(report.of_type(ResourceType::Encounter).count(), 0);

        let json = document(&report.resources[1]);
        assert!(json.get("encounter").is_none());
    }

    #[test]
    fn uncoded_observation_still_maps() {
        let parsed = ParsedMessage {
            patient: Some(patient("123")),
            observations: vec![
                observation("1", "NA", "140"),
                ObservationRecord {
                    set_id: Some("2".into()),
                    value: Some("5".into()),
                    ..ObservationRecord::default()
                },
                observation("3", "GLU", "7.5"),
            ],
            ..ParsedMessage::default()
        };

        let report = Transformer::default().transform(&parsed);
        assert!(report.skips.is_empty());
        let observations: Vec<_> = report.of_type(ResourceType::Observation).collect();
        assert_eq!(observations.len(), 3);

        let uncoded = document(observations[1]);
        assert!(uncoded.get("code").is_none());
        assert_eq!(uncoded["valueQuantity"]["value"], 5.0);
        assert_eq!(uncoded["subject"]["reference"], "Patient/123");
        assert_eq!(document(observations[2])["code"]["coding"][0]["code"], "GLU");
    }

    #[test]
    fn duplicate_set_ids_get_distinct_resource_ids() {
        let parsed = ParsedMessage {
            observations: vec![observation("1", "A", "1"), observation("1", "B", "2")],
            ..ParsedMessage::default()
        };
        let report = Transformer::default().transform(&parsed);
        assert_eq!(report.resources.len(), 2);
        assert_ne!(report.resources[0].id(), report.resources[1].id());
    }

    #[test]
    fn maps_encounter_details() {
        let parsed = ParsedMessage {
            patient: Some(patient("123")),
            visit: Some(VisitRecord {
                visit_number: Some("V100".into()),
                patient_class: Some("I".into()),
                location: Some(Location {
                    unit: Some("4W".into()),
                    room: Some("401".into()),
                    bed: Some("A".into()),
                    facility: None,
                }),
                attending: Some(Provider {
                    id: Some("1234".into()),
                    family_name: Some("Smith".into()),
                    given_name: Some("Anna".into()),
                }),
                ..VisitRecord::default()
            }),
            ..ParsedMessage::default()
        };

        let outcome = Transformer::default().transform_resource(&parsed, ResourceType::Encounter);
        let resource = match outcome {
            ResourceOutcome::Mapped(resource) => resource,
            other => panic!("expected mapped encounter, got {other:?}"),
        };
        let json = document(&resource);
        assert_eq!(json["id"], "V100");
        assert_eq!(json["status"], "finished");
        assert_eq!(json["class"]["code"], "IMP");
        assert_eq!(json["subject"]["reference"], "Patient/123");
        assert_eq!(json["location"][0]["location"]["display"], "4W - Room 401 - Bed A");
        assert_eq!(json["participant"][0]["individual"]["display"], "Anna Smith");
    }

    #[test]
    fn unrecognised_class_defaults_to_ambulatory() {
        assert_eq!(map_encounter_class("O"), EncounterClass::Ambulatory);
        assert_eq!(map_encounter_class("Q"), EncounterClass::Ambulatory);
        assert_eq!(map_encounter_class("e"), EncounterClass::Emergency);
    }

    #[test]
    fn maps_service_request() {
        let parsed = ParsedMessage {
            patient: Some(patient("123")),
            orders: vec![OrderRecord {
                order_number: Some("ORD1".into()),
                placer_order_number: Some("ORD1".into()),
                filler_order_number: Some("F9".into()),
                status: Some("CA".into()),
                code: Some("CBC".into()),
                display: Some("Complete blood count".into()),
                priority: Some("S".into()),
                ordering_provider: Some(Provider {
                    id: Some("77".into()),
                    ..Provider::default()
                }),
                ..OrderRecord::default()
            }],
            ..ParsedMessage::default()
        };

        let outcome =
            Transformer::default().transform_resource(&parsed, ResourceType::ServiceRequest);
        let resource = match outcome {
            ResourceOutcome::Mapped(resource) => resource,
            other => panic!("expected mapped service request, got {other:?}"),
        };
        let json = document(&resource);
        assert_eq!(json["id"], "ORD1");
        assert_eq!(json["status"], "revoked");
        assert_eq!(json["intent"], "order");
        assert_eq!(json["priority"], "stat");
        assert_eq!(json["subject"]["reference"], "Patient/123");
        assert_eq!(json["requester"]["display"], "77");
        assert_eq!(json["identifier"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn order_without_patient_maps_without_subject() {
        let parsed = ParsedMessage {
            orders: vec![OrderRecord {
                order_number: Some("ORD1".into()),
                code: Some("CBC".into()),
                ..OrderRecord::default()
            }],
            ..ParsedMessage::default()
        };
        let resource =
            match Transformer::default().transform_resource(&parsed, ResourceType::ServiceRequest) {
                ResourceOutcome::Mapped(resource) => resource,
                other => panic!("expected mapped service request, got {other:?}"),
            };
        let json = document(&resource);
        assert_eq!(json["id"], "ORD1");
        assert_eq!(json["intent"], "order");
        assert!(json.get("subject").is_none());

        let report = Transformer::default().transform(&parsed);
        assert!(report.skips.is_empty());
        assert_eq!(report.of_type(ResourceType::ServiceRequest).count(), 1);
    }

    #[test]
    fn absent_sub_model_is_not_applicable() {
        let outcome = Transformer::default()
            .transform_resource(&ParsedMessage::default(), ResourceType::Patient);
        assert_eq!(outcome, ResourceOutcome::NotApplicable);
    }

    #[test]
    fn status_tables_accept_long_codes() {
        assert_eq!(map_observation_status("corrected"), Some(ObservationStatus::Corrected));
        assert_eq!(map_observation_status("Z"), None);
        assert_eq!(map_request_status("hold"), RequestStatus::OnHold);
        assert_eq!(map_request_status("?"), RequestStatus::Active);
        assert_eq!(map_request_priority("urgent"), RequestPriority::Urgent);
        assert_eq!(map_request_priority("?"), RequestPriority::Routine);
    }

    #[test]
    fn abnormal_flag_maps_to_interpretation() {
        let coding = interpretation("h");
        assert_eq!(coding.code, "H");
        assert_eq!(coding.display.as_deref(), Some("High"));
        assert_eq!(interpretation("ZZ").display, None);
    }
}

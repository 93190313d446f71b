//! Constants used throughout the bridge core crate.
//!
//! Code system URIs, identifier system suffixes, configuration defaults and the
//! environment variable names the binaries read at startup.

/// Default upper bound on OBX segments extracted from one result message.
pub const DEFAULT_MAX_RESULT_SEGMENTS: usize = 1_000;

/// Default length above which a message control id draws a warning.
pub const DEFAULT_MAX_CONTROL_ID_LEN: usize = 20;

/// Default base URI for business identifier systems.
pub const DEFAULT_IDENTIFIER_SYSTEM_BASE: &str = "http://hospital.example.org";

/// Identifier system suffixes, appended to the configured base URI.
pub const PATIENT_ID_SYSTEM: &str = "patient-id";
pub const MRN_SYSTEM: &str = "mrn";
pub const VISIT_NUMBER_SYSTEM: &str = "visit-number";
pub const ORDER_NUMBER_SYSTEM: &str = "order-number";
pub const PLACER_ORDER_NUMBER_SYSTEM: &str = "placer-order-number";
pub const FILLER_ORDER_NUMBER_SYSTEM: &str = "filler-order-number";

pub const LOINC_SYSTEM: &str = "http://loinc.org";
pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";
pub const MARITAL_STATUS_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-MaritalStatus";

/// Base message types with dedicated handling.
pub const SUPPORTED_MESSAGE_TYPES: [&str; 5] = ["ADT", "ORM", "ORU", "MDM", "SIU"];

/// Identifier type code (PID-3.5) marking a medical record number.
pub const MRN_IDENTIFIER_TYPE: &str = "MR";

pub const CONFIG_ENV: &str = "BRIDGE_CONFIG";
pub const MAX_RESULT_SEGMENTS_ENV: &str = "BRIDGE_MAX_RESULT_SEGMENTS";
pub const MAX_CONTROL_ID_LEN_ENV: &str = "BRIDGE_MAX_CONTROL_ID_LEN";
pub const IDENTIFIER_SYSTEM_ENV: &str = "BRIDGE_IDENTIFIER_SYSTEM";
pub const VALIDATION_POLICY_ENV: &str = "BRIDGE_VALIDATION_POLICY";

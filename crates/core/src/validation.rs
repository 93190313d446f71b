//! Two-phase message validation.
//!
//! The structural phase checks that the message decodes, that required segments and
//! header fields are present and that MSH comes first. The business-rule phase checks
//! value formats and cross-field consistency. Both phases are callable on their own,
//! run every check they own and accumulate the results into one [`ValidationOutcome`].
//!
//! Validation never fails: text that cannot be decoded yields a `PARSE_ERROR` (or
//! `EMPTY_MESSAGE`) issue, not an `Err`.

use crate::model::{full_message_type, NoticeKind, ParseNotice};
use crate::BridgeConfig;
use hl7::{FieldPath, Hl7Error, Message, HEADER_SEGMENT};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}|\d{6}|\d{8})$").expect("valid date pattern"));

static DATETIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{8}(\d{4}(\d{2})?(\.\d{1,4})?([+-]\d{4})?)?$").expect("valid datetime pattern")
});

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^2\.[0-9]+(\.[0-9]+)?$").expect("valid version pattern"));

static PROCESSING_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[PDT]$").expect("valid processing id pattern"));

static SEX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[MFOU]$").expect("valid sex code pattern"));

/// Header fields that must be non-empty. MSH-8 (security) is optional.
const REQUIRED_HEADER_FIELDS: [(usize, &str); 11] = [
    (1, "Field Separator"),
    (2, "Encoding Characters"),
    (3, "Sending Application"),
    (4, "Sending Facility"),
    (5, "Receiving Application"),
    (6, "Receiving Facility"),
    (7, "Date/Time of Message"),
    (9, "Message Type"),
    (10, "Message Control ID"),
    (11, "Processing ID"),
    (12, "Version ID"),
];

// ============================================================================
// Public domain-level types
// ============================================================================

/// Stable issue codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    EmptyMessage,
    ParseError,
    MissingSegment,
    SegmentOrder,
    MissingField,
    InvalidDatetime,
    UnsupportedVersion,
    InvalidProcessingId,
    EmptyPatientId,
    InvalidDate,
    InvalidGender,
    SameApplications,
    LongControlId,
    DroppedSegment,
    MalformedTimestamp,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::EmptyMessage => "EMPTY_MESSAGE",
            IssueCode::ParseError => "PARSE_ERROR",
            IssueCode::MissingSegment => "MISSING_SEGMENT",
            IssueCode::SegmentOrder => "SEGMENT_ORDER",
            IssueCode::MissingField => "MISSING_FIELD",
            IssueCode::InvalidDatetime => "INVALID_DATETIME",
            IssueCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            IssueCode::InvalidProcessingId => "INVALID_PROCESSING_ID",
            IssueCode::EmptyPatientId => "EMPTY_PATIENT_ID",
            IssueCode::InvalidDate => "INVALID_DATE",
            IssueCode::InvalidGender => "INVALID_GENDER",
            IssueCode::SameApplications => "SAME_APPLICATIONS",
            IssueCode::LongControlId => "LONG_CONTROL_ID",
            IssueCode::DroppedSegment => "DROPPED_SEGMENT",
            IssueCode::MalformedTimestamp => "MALFORMED_TIMESTAMP",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    /// Field location such as `MSH-7`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    fn new(code: IssueCode, segment: Option<&str>, field: Option<String>, message: String) -> Self {
        Self {
            code,
            segment: segment.map(str::to_string),
            field,
            message,
        }
    }

    fn at(code: IssueCode, segment: &str, field: usize, message: String) -> Self {
        Self::new(code, Some(segment), Some(format!("{segment}-{field}")), message)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.field, &self.segment) {
            (Some(field), _) => write!(f, "[{}] {field}: {}", self.code, self.message),
            (None, Some(segment)) => write!(f, "[{}] {segment}: {}", self.code, self.message),
            (None, None) => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl From<ParseNotice> for ValidationIssue {
    fn from(notice: ParseNotice) -> Self {
        let code = match notice.kind {
            NoticeKind::DroppedSegment => IssueCode::DroppedSegment,
            NoticeKind::MalformedTimestamp => IssueCode::MalformedTimestamp,
        };
        let segment: String = notice
            .location
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        Self {
            code,
            segment: Some(segment),
            field: Some(notice.location),
            message: notice.message,
        }
    }
}

/// Result of one validation run.
///
/// The message is valid iff there are no errors; warnings never invalidate it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationOutcome {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
    message_type: Option<String>,
    version: Option<String>,
}

/// Serialized shape of a [`ValidationOutcome`]; `valid` is derived from the errors.
#[derive(Serialize)]
struct OutcomeDocument<'a> {
    valid: bool,
    errors: &'a [ValidationIssue],
    warnings: &'a [ValidationIssue],
    #[serde(skip_serializing_if = "Option::is_none")]
    message_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
}

impl Serialize for ValidationOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        OutcomeDocument {
            valid: self.is_valid(),
            errors: &self.errors,
            warnings: &self.warnings,
            message_type: self.message_type(),
            version: self.version(),
        }
        .serialize(serializer)
    }
}

impl ValidationOutcome {
    fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            message_type: None,
            version: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationIssue] {
        &self.errors
    }

    pub fn warnings(&self) -> &[ValidationIssue] {
        &self.warnings
    }

    /// Detected message type and trigger, e.g. `ADT^A01`.
    pub fn message_type(&self) -> Option<&str> {
        self.message_type.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Whether any error or warning carries `code`.
    pub fn has_code(&self, code: IssueCode) -> bool {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .any(|issue| issue.code == code)
    }

    /// Append non-blocking findings, e.g. parser notices.
    pub fn with_warnings(mut self, warnings: impl IntoIterator<Item = ValidationIssue>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub(crate) fn into_errors(self) -> Vec<ValidationIssue> {
        self.errors
    }

    fn error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    fn warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    fn absorb(&mut self, other: ValidationOutcome) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        if self.message_type.is_none() {
            self.message_type = other.message_type;
        }
        if self.version.is_none() {
            self.version = other.version;
        }
    }
}

// ============================================================================
// Validator
// ============================================================================

/// Structural and business-rule validator.
#[derive(Clone, Debug)]
pub struct Validator {
    max_control_id_len: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&BridgeConfig::default())
    }
}

impl Validator {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            max_control_id_len: config.max_control_id_len(),
        }
    }

    /// Run the structural phase only.
    pub fn validate_structure(&self, raw: &str) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::new();
        if let Some(message) = decode(raw, &mut outcome) {
            check_structure(&message, &mut outcome);
        }
        outcome
    }

    /// Run the business-rule phase only.
    pub fn validate_business_rules(&self, raw: &str) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::new();
        if let Some(message) = decode(raw, &mut outcome) {
            self.check_business_rules(&message, &mut outcome);
        }
        outcome
    }

    /// Run the structural phase, then business rules if the message decoded.
    pub fn validate(&self, raw: &str) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::new();
        match decode(raw, &mut outcome) {
            Some(message) => self.check_all(&message, outcome),
            None => outcome,
        }
    }

    /// Run both phases against a message that is already decoded.
    pub fn validate_message(&self, message: &Message) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::new();
        describe(message, &mut outcome);
        self.check_all(message, outcome)
    }

    fn check_all(&self, message: &Message, mut outcome: ValidationOutcome) -> ValidationOutcome {
        check_structure(message, &mut outcome);
        let mut business = ValidationOutcome::new();
        self.check_business_rules(message, &mut business);
        outcome.absorb(business);

        tracing::debug!(
            message_type = outcome.message_type().unwrap_or("<unknown>"),
            errors = outcome.errors.len(),
            warnings = outcome.warnings.len(),
            "validated message"
        );
        outcome
    }

    fn check_business_rules(&self, message: &Message, outcome: &mut ValidationOutcome) {
        let msh = |field| FieldPath::new(HEADER_SEGMENT, field);

        if let Some(timestamp) = message.get(&msh(7).component(1)) {
            if !DATETIME_PATTERN.is_match(&timestamp) {
                outcome.error(ValidationIssue::at(
                    IssueCode::InvalidDatetime,
                    HEADER_SEGMENT,
                    7,
                    format!("Invalid datetime format in MSH-7: {timestamp}"),
                ));
            }
        }

        if let Some(version) = message.get(&msh(12).component(1)) {
            if !VERSION_PATTERN.is_match(&version) {
                outcome.warning(ValidationIssue::at(
                    IssueCode::UnsupportedVersion,
                    HEADER_SEGMENT,
                    12,
                    format!("Unsupported HL7 version: {version}. Supported versions are 2.x"),
                ));
            }
        }

        if let Some(processing_id) = message.get(&msh(11).component(1)) {
            if !PROCESSING_ID_PATTERN.is_match(&processing_id) {
                outcome.warning(ValidationIssue::at(
                    IssueCode::InvalidProcessingId,
                    HEADER_SEGMENT,
                    11,
                    format!(
                        "Processing ID should be P (Production), D (Debug), or T (Training). Found: {processing_id}"
                    ),
                ));
            }
        }

        if message.has_segment("PID") {
            let pid = |field| FieldPath::new("PID", field);

            if message.get(&pid(3).component(1)).is_none() {
                outcome.error(ValidationIssue::at(
                    IssueCode::EmptyPatientId,
                    "PID",
                    3,
                    "Patient ID cannot be empty when PID segment is present".into(),
                ));
            }

            if let Some(birth_date) = message.get(&pid(7).component(1)) {
                if !DATE_PATTERN.is_match(&birth_date) {
                    outcome.error(ValidationIssue::at(
                        IssueCode::InvalidDate,
                        "PID",
                        7,
                        format!("Invalid date format in PID-7: {birth_date}"),
                    ));
                }
            }

            if let Some(sex) = message.get(&pid(8).component(1)) {
                if !SEX_PATTERN.is_match(&sex) {
                    outcome.warning(ValidationIssue::at(
                        IssueCode::InvalidGender,
                        "PID",
                        8,
                        format!("Gender should be M, F, O, or U. Found: {sex}"),
                    ));
                }
            }
        }

        if let (Some(sending), Some(receiving)) = (message.get(&msh(3)), message.get(&msh(5))) {
            if sending == receiving {
                outcome.warning(ValidationIssue::new(
                    IssueCode::SameApplications,
                    Some(HEADER_SEGMENT),
                    Some("MSH-3".into()),
                    format!("Sending and receiving applications are the same: {sending}"),
                ));
            }
        }

        if let Some(control_id) = message.get(&msh(10)) {
            let length = control_id.chars().count();
            if length > self.max_control_id_len {
                outcome.warning(ValidationIssue::at(
                    IssueCode::LongControlId,
                    HEADER_SEGMENT,
                    10,
                    format!(
                        "Message Control ID is longer than recommended {} characters: {length}",
                        self.max_control_id_len
                    ),
                ));
            }
        }
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Decode the text, recording why when it cannot be decoded.
fn decode(raw: &str, outcome: &mut ValidationOutcome) -> Option<Message> {
    if raw.trim().is_empty() {
        outcome.error(ValidationIssue::new(
            IssueCode::EmptyMessage,
            None,
            None,
            "HL7 message cannot be null or empty".into(),
        ));
        return None;
    }

    match Message::parse(raw) {
        Ok(message) => {
            describe(&message, outcome);
            Some(message)
        }
        Err(Hl7Error::EmptyMessage) => {
            outcome.error(ValidationIssue::new(
                IssueCode::EmptyMessage,
                None,
                None,
                "HL7 message contains no segments".into(),
            ));
            None
        }
        Err(err) => {
            outcome.error(ValidationIssue::new(
                IssueCode::ParseError,
                None,
                None,
                format!("Failed to parse HL7 message: {err}"),
            ));
            None
        }
    }
}

/// Record the detected message type and version.
fn describe(message: &Message, outcome: &mut ValidationOutcome) {
    outcome.message_type = full_message_type(message);
    outcome.version = message.get(&FieldPath::new(HEADER_SEGMENT, 12).component(1));
}

fn check_structure(message: &Message, outcome: &mut ValidationOutcome) {
    let is_adt = message
        .component(HEADER_SEGMENT, 9, 1)
        .is_some_and(|code| code.eq_ignore_ascii_case("ADT"));
    if is_adt && !message.has_segment("PID") {
        outcome.error(ValidationIssue::new(
            IssueCode::MissingSegment,
            Some("PID"),
            None,
            "PID segment is required for ADT messages".into(),
        ));
    }

    if let Some(first) = message.segment_names().next() {
        if first != HEADER_SEGMENT {
            outcome.warning(ValidationIssue::new(
                IssueCode::SegmentOrder,
                Some(first),
                None,
                "MSH segment should be the first segment in the message".into(),
            ));
        }
    }

    for (field, name) in REQUIRED_HEADER_FIELDS {
        if message.field(HEADER_SEGMENT, field).is_none() {
            outcome.error(ValidationIssue::at(
                IssueCode::MissingField,
                HEADER_SEGMENT,
                field,
                format!("Required field {name} (MSH-{field}) is missing or empty"),
            ));
        }
    }
}

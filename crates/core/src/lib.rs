//! # Bridge Core
//!
//! Core logic of the HL7 v2 to FHIR bridge.
//!
//! This crate turns raw HL7 v2 text into FHIR R4 resources:
//! - [`MessageParser`]: raw text to the typed intermediate model ([`ParsedMessage`])
//! - [`Validator`]: structural and business-rule checks, reported as data
//! - [`Transformer`]: intermediate model to [`fhir::TargetResource`]s
//! - [`TransformCache`]: single-flight memoization of transformations
//! - [`Pipeline`]: all of the above under one [`BridgeConfig`]
//!
//! **No transport concerns**: reading files, MLLP listeners and output sinks belong in
//! the binaries. Decoding the wire format lives in `hl7`; FHIR JSON lives in `fhir`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod transform;
pub mod validation;

pub use cache::{CacheKey, CachePolicyListener, TransformCache};
pub use config::{BridgeConfig, EnvValues, ValidationPolicy};
pub use error::{BridgeError, BridgeResult};
pub use model::{
    AddressRecord, Header, Location, MessageStatus, NoticeKind, ObservationRecord, OrderRecord,
    ParseNotice, ParsedMessage, PatientRecord, Provider, RawMessage, VisitRecord,
};
pub use parser::{supports_message_type, MessageParser};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use transform::{MappingSkip, ResourceOutcome, TransformReport, Transformer};
pub use validation::{IssueCode, ValidationIssue, ValidationOutcome, Validator};

//! End-to-end processing of one message: parse, validate, apply the validation
//! policy, transform.
//!
//! Status transitions are logged as the message moves through
//! [`MessageStatus`]. A message that fails to decode is an `Err`; everything else,
//! including quarantined messages, is an `Ok` outcome that reports its final status.

use crate::cache::{CacheKey, TransformCache};
use crate::transform::{MappingSkip, TransformReport, Transformer};
use crate::validation::{ValidationIssue, ValidationOutcome, Validator};
use crate::{BridgeConfig, BridgeError, BridgeResult, MessageParser, MessageStatus, RawMessage};
use crate::ValidationPolicy;
use fhir::TargetResource;
use hl7::Message;
use serde::Serialize;
use std::sync::Arc;

/// What processing one message produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PipelineOutcome {
    pub status: MessageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_id: Option<String>,
    /// Validation findings plus parser notices (as warnings).
    pub validation: ValidationOutcome,
    pub resources: Vec<TargetResource>,
    pub skips: Vec<MappingSkip>,
}

/// Parser, validator and transformer wired together under one configuration.
#[derive(Clone, Debug)]
pub struct Pipeline {
    parser: MessageParser,
    validator: Validator,
    transformer: Transformer,
    policy: ValidationPolicy,
    cache: Option<Arc<TransformCache>>,
}

impl Pipeline {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            parser: MessageParser::new(config),
            validator: Validator::new(config),
            transformer: Transformer::new(config),
            policy: config.validation_policy(),
            cache: None,
        }
    }

    /// Route transformations through `cache`.
    pub fn with_cache(mut self, cache: Arc<TransformCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn parser(&self) -> &MessageParser {
        &self.parser
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    /// Process one message.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Hl7`] if the text cannot be decoded, and
    /// [`BridgeError::Rejected`] if validation reports errors under
    /// [`ValidationPolicy::Reject`].
    pub fn process(&self, raw: &RawMessage) -> BridgeResult<PipelineOutcome> {
        let control_id = raw.message_id().map(str::to_string);
        let label = control_id.as_deref().unwrap_or("<none>");
        transition(label, MessageStatus::Received);

        let message = match Message::parse(raw.text()) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(control_id = label, error = %err, "message could not be parsed");
                transition(label, MessageStatus::Error);
                return Err(BridgeError::Hl7(err));
            }
        };
        let (parsed, notices) = self.parser.parse_decoded(&message);

        transition(label, MessageStatus::Validating);
        let validation = self
            .validator
            .validate_message(&message)
            .with_warnings(notices.into_iter().map(ValidationIssue::from));

        if !validation.is_valid() {
            transition(label, MessageStatus::Invalid);
            match self.policy {
                ValidationPolicy::Reject => {
                    tracing::warn!(
                        control_id = label,
                        errors = validation.errors().len(),
                        "message rejected"
                    );
                    return Err(BridgeError::Rejected {
                        control_id: label.to_string(),
                        errors: validation.into_errors(),
                    });
                }
                ValidationPolicy::Quarantine => {
                    tracing::info!(control_id = label, "message quarantined");
                    return Ok(PipelineOutcome {
                        status: MessageStatus::Invalid,
                        control_id,
                        validation,
                        resources: Vec::new(),
                        skips: Vec::new(),
                    });
                }
                ValidationPolicy::Proceed => {
                    tracing::info!(control_id = label, "transforming despite validation errors");
                }
            }
        } else {
            transition(label, MessageStatus::Valid);
        }

        transition(label, MessageStatus::Transforming);
        let report = match (&self.cache, CacheKey::for_message(&parsed)) {
            (Some(cache), Some(key)) => {
                cache.get_or_transform(key, || self.transformer.transform(&parsed))
            }
            _ => Arc::new(self.transformer.transform(&parsed)),
        };
        let TransformReport { resources, skips } = report.as_ref().clone();
        transition(label, MessageStatus::Transformed);

        Ok(PipelineOutcome {
            status: MessageStatus::Transformed,
            control_id,
            validation,
            resources,
            skips,
        })
    }
}

fn transition(control_id: &str, status: MessageStatus) {
    tracing::debug!(control_id, status = %status, "message status");
}

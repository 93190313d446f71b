//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Environment variables are read by the binaries (see
//! [`EnvValues::from_process_env`]) and handed over as plain values; nothing in the pipeline
//! reads process-wide state while handling a message.
//!
//! Precedence, lowest first: built-in defaults, the optional YAML file, environment values.

use crate::constants::{
    CONFIG_ENV, DEFAULT_IDENTIFIER_SYSTEM_BASE, DEFAULT_MAX_CONTROL_ID_LEN,
    DEFAULT_MAX_RESULT_SEGMENTS, IDENTIFIER_SYSTEM_ENV, MAX_CONTROL_ID_LEN_ENV,
    MAX_RESULT_SEGMENTS_ENV, VALIDATION_POLICY_ENV,
};
use crate::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// What the pipeline does with a message whose validation reported errors.
///
/// Warnings never block a message, whatever the policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Fail the message with [`BridgeError::Rejected`].
    #[default]
    Reject,
    /// Return the validation outcome without transforming.
    Quarantine,
    /// Transform anyway and report the errors alongside the resources.
    Proceed,
}

impl ValidationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationPolicy::Reject => "reject",
            ValidationPolicy::Quarantine => "quarantine",
            ValidationPolicy::Proceed => "proceed",
        }
    }
}

impl fmt::Display for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationPolicy {
    type Err = BridgeError;

    fn from_str(s: &str) -> BridgeResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(ValidationPolicy::Reject),
            "quarantine" => Ok(ValidationPolicy::Quarantine),
            "proceed" => Ok(ValidationPolicy::Proceed),
            other => Err(BridgeError::InvalidConfig(format!(
                "unknown validation policy '{other}' (expected reject, quarantine or proceed)"
            ))),
        }
    }
}

/// Bridge configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    max_result_segments: usize,
    max_control_id_len: usize,
    identifier_system_base: String,
    validation_policy: ValidationPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_result_segments: DEFAULT_MAX_RESULT_SEGMENTS,
            max_control_id_len: DEFAULT_MAX_CONTROL_ID_LEN,
            identifier_system_base: DEFAULT_IDENTIFIER_SYSTEM_BASE.to_string(),
            validation_policy: ValidationPolicy::default(),
        }
    }
}

impl BridgeConfig {
    /// Create a new `BridgeConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidConfig`] if either bound is zero or the identifier
    /// system base is not an `http(s)` URI.
    pub fn new(
        max_result_segments: usize,
        max_control_id_len: usize,
        identifier_system_base: String,
        validation_policy: ValidationPolicy,
    ) -> BridgeResult<Self> {
        if max_result_segments == 0 {
            return Err(BridgeError::InvalidConfig(
                "max_result_segments must be at least 1".into(),
            ));
        }
        if max_control_id_len == 0 {
            return Err(BridgeError::InvalidConfig(
                "max_control_id_len must be at least 1".into(),
            ));
        }

        let identifier_system_base = identifier_system_base.trim().trim_end_matches('/');
        if !(identifier_system_base.starts_with("http://")
            || identifier_system_base.starts_with("https://"))
            || identifier_system_base.contains(char::is_whitespace)
        {
            return Err(BridgeError::InvalidConfig(format!(
                "identifier_system_base '{identifier_system_base}' is not an http(s) URI"
            )));
        }

        Ok(Self {
            max_result_segments,
            max_control_id_len,
            identifier_system_base: identifier_system_base.to_string(),
            validation_policy,
        })
    }

    pub fn max_result_segments(&self) -> usize {
        self.max_result_segments
    }

    pub fn max_control_id_len(&self) -> usize {
        self.max_control_id_len
    }

    pub fn identifier_system_base(&self) -> &str {
        &self.identifier_system_base
    }

    /// Full identifier system URI for a suffix such as `mrn`.
    pub fn identifier_system(&self, suffix: &str) -> String {
        format!("{}/{suffix}", self.identifier_system_base)
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        self.validation_policy
    }

    /// Parse configuration from YAML text, layered over the defaults.
    ///
    /// Unknown keys are rejected; schema mismatches report the failing key path.
    pub fn from_yaml_str(yaml_text: &str) -> BridgeResult<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(yaml_text).map_err(BridgeError::ConfigYaml)?;
        if value.is_null() {
            return Ok(Self::default());
        }

        let file = match serde_path_to_error::deserialize::<_, ConfigFile>(value) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(BridgeError::InvalidConfig(format!(
                    "configuration schema mismatch at {path}: {source}"
                )));
            }
        };

        file.apply(Self::default())
    }

    /// Read and parse a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> BridgeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(BridgeError::ConfigRead)?;
        Self::from_yaml_str(&text)
    }

    /// Resolve configuration from values taken from the environment at startup.
    ///
    /// If `values.config_file` is set the file is loaded first; every other value that
    /// is present and non-blank overrides the corresponding setting.
    pub fn from_env_values(values: EnvValues) -> BridgeResult<Self> {
        let base = match non_blank(values.config_file) {
            Some(path) => Self::from_yaml_file(&PathBuf::from(path))?,
            None => Self::default(),
        };

        let max_result_segments = non_blank(values.max_result_segments)
            .map(|v| parse_count(&v, MAX_RESULT_SEGMENTS_ENV))
            .transpose()?
            .unwrap_or(base.max_result_segments);
        let max_control_id_len = non_blank(values.max_control_id_len)
            .map(|v| parse_count(&v, MAX_CONTROL_ID_LEN_ENV))
            .transpose()?
            .unwrap_or(base.max_control_id_len);
        let identifier_system_base =
            non_blank(values.identifier_system).unwrap_or(base.identifier_system_base);
        let validation_policy = non_blank(values.validation_policy)
            .map(|v| v.parse::<ValidationPolicy>())
            .transpose()?
            .unwrap_or(base.validation_policy);

        Self::new(
            max_result_segments,
            max_control_id_len,
            identifier_system_base,
            validation_policy,
        )
    }
}

/// Raw configuration values as read from the environment.
#[derive(Clone, Debug, Default)]
pub struct EnvValues {
    pub config_file: Option<String>,
    pub max_result_segments: Option<String>,
    pub max_control_id_len: Option<String>,
    pub identifier_system: Option<String>,
    pub validation_policy: Option<String>,
}

impl EnvValues {
    /// Snapshot the `BRIDGE_*` variables. Call once, at startup.
    pub fn from_process_env() -> Self {
        let read = |name: &str| std::env::var(name).ok();
        Self {
            config_file: read(CONFIG_ENV),
            max_result_segments: read(MAX_RESULT_SEGMENTS_ENV),
            max_control_id_len: read(MAX_CONTROL_ID_LEN_ENV),
            identifier_system: read(IDENTIFIER_SYSTEM_ENV),
            validation_policy: read(VALIDATION_POLICY_ENV),
        }
    }
}

/// Configuration file wire format; every key is optional.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    max_result_segments: Option<usize>,
    #[serde(default)]
    max_control_id_len: Option<usize>,
    #[serde(default)]
    identifier_system_base: Option<String>,
    #[serde(default)]
    validation_policy: Option<ValidationPolicy>,
}

impl ConfigFile {
    fn apply(self, base: BridgeConfig) -> BridgeResult<BridgeConfig> {
        BridgeConfig::new(
            self.max_result_segments.unwrap_or(base.max_result_segments),
            self.max_control_id_len.unwrap_or(base.max_control_id_len),
            self.identifier_system_base
                .unwrap_or(base.identifier_system_base),
            self.validation_policy.unwrap_or(base.validation_policy),
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_count(value: &str, name: &str) -> BridgeResult<usize> {
    value
        .parse::<usize>()
        .map_err(|_| BridgeError::InvalidConfig(format!("{name} must be a positive integer, got '{value}'")))
}

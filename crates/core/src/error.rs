use crate::validation::ValidationIssue;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("HL7 parse error: {0}")]
    Hl7(#[from] hl7::Hl7Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read configuration file: {0}")]
    ConfigRead(std::io::Error),
    #[error("failed to parse configuration YAML: {0}")]
    ConfigYaml(serde_yaml::Error),

    #[error("message {control_id} rejected with {} validation error(s)", errors.len())]
    Rejected {
        control_id: String,
        errors: Vec<ValidationIssue>,
    },
}

impl BridgeError {
    /// Lifecycle status of a message whose processing failed with this error.
    pub fn message_status(&self) -> crate::MessageStatus {
        match self {
            BridgeError::Rejected { .. } => crate::MessageStatus::Invalid,
            _ => crate::MessageStatus::Error,
        }
    }
}

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

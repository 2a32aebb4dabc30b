// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid interface name: {0:?}")]
    InvalidInterfaceName(String),

    #[error("Invalid {kind} value: {raw:?}")]
    InvalidValue { kind: String, raw: String },

    #[error("Value kind mismatch for {target}: expected {expected}, found {found}")]
    ValueKindMismatch {
        target: String,
        expected: String,
        found: String,
    },

    #[error("Duplicate order {order} in profile {profile}")]
    DuplicateOrder { profile: String, order: u32 },

    #[error("Duplicate descriptor {id} in profile {profile}")]
    DuplicateDescriptor { profile: String, id: String },

    #[error("Duplicate profile name: {0}")]
    DuplicateProfile(String),

    #[error("Invalid host: {0:?}")]
    InvalidHost(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

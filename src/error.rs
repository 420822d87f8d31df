// src/error.rs
//! Run-level failures. Per-source and per-article faults never reach this type;
//! they are absorbed with fallback values inside the pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RunError>;

#[derive(Debug, Error)]
pub enum RunError {
    /// Required environment variables are absent. Raised before any fetch.
    #[error("missing required configuration: {}", .0.join(", "))]
    ConfigurationMissing(Vec<String>),

    /// A config file or value exists but cannot be used.
    #[error("invalid configuration: {0:#}")]
    ConfigInvalid(anyhow::Error),

    /// The rendered digest could not be sent. No retry.
    #[error("digest delivery failed: {0:#}")]
    DeliveryFailure(anyhow::Error),
}

impl RunError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::ConfigurationMissing(_) | RunError::ConfigInvalid(_) => 2,
            RunError::DeliveryFailure(_) => 1,
        }
    }
}

//! Error taxonomy.
//!
//! Every failure in this crate is a deterministic validation failure, so
//! there is no retryable category:
//!
//! | Variant | Raised by | Scope |
//! |---------|-----------|-------|
//! | [`KnapsackError::Configuration`] | [`GaConfig::validate`](crate::ga::GaConfig::validate), subset sampling | the run that raised it |
//! | [`KnapsackError::Data`] | [`Instance::new`](crate::model::Instance::new) | every run of that instance |
//!
//! The orchestrator records either variant as a failure marker and keeps
//! processing the remaining (instance, seed) pairs.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, KnapsackError>;

/// Errors produced while validating instances and configurations.
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KnapsackError {
    /// An invalid parameter or parameter combination.
    #[error("invalid configuration `{parameter}`: {message}")]
    Configuration {
        /// Name of the offending parameter (e.g. `selection.k`).
        parameter: String,
        /// Human-readable description.
        message: String,
    },

    /// An instance that cannot be optimized.
    #[error("invalid instance: {message}")]
    Data {
        /// Human-readable description.
        message: String,
    },
}

impl KnapsackError {
    pub(crate) fn config(parameter: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn data(message: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Returns `true` for [`KnapsackError::Configuration`].
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns `true` for [`KnapsackError::Data`].
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    /// The offending parameter name, for configuration errors.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::Configuration { parameter, .. } => Some(parameter),
            Self::Data { .. } => None,
        }
    }
}

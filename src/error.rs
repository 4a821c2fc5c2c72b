//! Custom error types for the driver.
//!
//! This module defines the primary error type, `DriverError`, for the whole crate.
//! Using the `thiserror` crate, it provides one consistent place for every failure
//! a driver call can surface.
//!
//! ## Error Hierarchy
//!
//! - **Value-domain errors** (`ValueNotSupported`, `TypeMismatch`,
//!   `CapabilityNotSupported`): raised before any I/O is attempted, so a rejected
//!   write never reaches the instrument.
//! - **`IdentityMismatch`**: the instrument reported a model that does not start
//!   with the expected ID prefix during initialization.
//! - **`NotImplemented`**: operations the driver exposes but cannot perform, such as
//!   reading a file back from instrument mass storage.
//! - **`Transport`**: failures of the underlying instrument session. These are
//!   passed through transparently, never translated or retried.
//!
//! Malformed instrument responses are deliberately *not* part of this taxonomy:
//! a read that cannot be parsed degrades to the attribute's documented fallback
//! value and is only reported through a `tracing` warning.

use thiserror::Error;

/// Convenience alias for results using the driver error type.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Errors surfaced by [`SmDriver`](crate::driver::SmDriver) operations.
#[derive(Error, Debug)]
pub enum DriverError {
    /// A value outside the attribute's domain, rejected before any I/O.
    #[error("Value '{value}' is not supported for attribute '{attribute}'")]
    ValueNotSupported { attribute: String, value: String },

    /// A value of the wrong kind for the attribute.
    #[error("Attribute '{attribute}' expects a {expected} value")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
    },

    /// The model lacks the capability the attribute or operation belongs to.
    #[error("Model {model} does not support the {capability} capability")]
    CapabilityNotSupported { model: String, capability: String },

    /// `*IDN?` reported a model not matching the expected prefix.
    #[error("Instrument ID mismatch, expecting {expected}, got {actual}")]
    IdentityMismatch { expected: String, actual: String },

    /// Operation the driver does not provide.
    #[error("Operation '{0}' is not implemented by this driver")]
    NotImplemented(String),

    /// No open session.
    #[error("Driver is not initialized; call initialize() first")]
    NotInitialized,

    /// A cache-only attribute was read before it was ever written.
    #[error("Attribute '{0}' has no cached value; it must be written before it can be read")]
    NotCached(String),

    /// No attribute with this key.
    #[error("Unknown attribute '{0}'")]
    UnknownAttribute(String),

    /// Model name not in the supported list.
    #[error("Unsupported instrument model '{0}'")]
    UnknownModel(String),

    /// A write template could not be expanded.
    #[error("Failed to expand command template: {0}")]
    CommandTemplate(String),

    /// Local file access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation needs a cargo feature that was not compiled in.
    #[error("Feature '{0}' is not enabled. Please build with --features {0}")]
    FeatureNotEnabled(String),

    /// Error reported by the session transport, passed through unchanged.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl From<strfmt::FmtError> for DriverError {
    fn from(err: strfmt::FmtError) -> Self {
        DriverError::CommandTemplate(err.to_string())
    }
}

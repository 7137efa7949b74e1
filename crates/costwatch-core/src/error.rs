//! Error types for costwatch-core
//!
//! Splits fatal pipeline errors (CoreError) from isolated per-channel
//! delivery failures (DeliveryError), which are collected into dispatch
//! reports instead of propagating.

use thiserror::Error;

use crate::models::alert::Channel;

/// Core error type for pipeline operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Insufficient history for analysis. Recoverable: the caller may retry
    /// later or widen the time window.
    #[error("no cost data available: {context}")]
    NoData { context: String },

    /// Malformed input or configuration. Caller's bug, surfaced immediately.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Store write failure. Fatal to the run; flips an alert to `failed`
    /// when it occurs during dispatch finalization.
    #[error("persistence failed during {operation}: {message}")]
    Persistence { operation: String, message: String },
}

impl CoreError {
    pub fn no_data(context: impl Into<String>) -> Self {
        Self::NoData {
            context: context.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn persistence(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Single-channel delivery failure
///
/// Never fatal: dispatch catches these per channel and records them in the
/// DispatchReport while the remaining channels proceed.
#[derive(Error, Debug, Clone)]
#[error("delivery via {channel} failed: {message}")]
pub struct DeliveryError {
    pub channel: Channel,
    pub message: String,
}

impl DeliveryError {
    pub fn new(channel: Channel, message: impl Into<String>) -> Self {
        Self {
            channel,
            message: message.into(),
        }
    }
}

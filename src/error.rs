// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `ezhi_lib` library.
//!
//! Errors are split by how the coordinator reacts to them:
//!
//! - [`ConnectivityError`]: the inverter could not be reached (timeout,
//!   refused or reset connection). Expected and frequent on Wi-Fi devices.
//! - [`ProtocolError`]: the inverter answered, but with something we could
//!   not use (bad status, malformed JSON, missing or garbled fields).
//! - [`ConfigError`]: invalid settings detected while setting things up.
//!   Only this class is ever returned from coordinator setup.
//! - [`ValueError`]: a constrained value was built from an invalid input.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The device could not be reached.
    #[error("connectivity error: {0}")]
    Connectivity(#[from] ConnectivityError),

    /// The device answered with an unusable payload.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),
}

impl Error {
    /// Returns `true` if this error means the device is unreachable.
    ///
    /// The refresh controller treats these as "device unavailable" and logs
    /// them quietly; every other error is logged with full detail.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

/// Errors raised while trying to reach the device.
#[derive(Debug, Error)]
pub enum ConnectivityError {
    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Connection refused, reset or otherwise failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Other transport failure reported by the HTTP client.
    #[cfg(feature = "http")]
    #[error("HTTP transport error: {0}")]
    Http(#[source] reqwest::Error),
}

/// Errors raised when the device response cannot be used.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The device answered with a non-success HTTP status.
    #[error("HTTP {status} - {reason}")]
    HttpStatus {
        /// Numeric status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// A field was present but could not be interpreted.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },

    /// The device reported a non-success message.
    #[error("request rejected by device: {0}")]
    Rejected(String),
}

/// Errors related to coordinator and client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A polling interval is zero.
    #[error("{name} must be a positive number of seconds, got {value}")]
    InvalidInterval {
        /// Name of the offending setting.
        name: &'static str,
        /// The value that was provided.
        value: u64,
    },

    /// Invalid device address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i32,
        /// Maximum allowed value.
        max: i32,
        /// The actual value that was provided.
        actual: i32,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

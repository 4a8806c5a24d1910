// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! On-grid power setting responses (`getPower`, `setPower`).

use serde::Deserialize;

use super::{Envelope, de};
use crate::error::ProtocolError;
use crate::types::PowerLimit;

/// Current on-grid power setting as returned by `getPower`.
///
/// # Examples
///
/// ```
/// use ezhi_lib::response::PowerSetting;
///
/// let body = r#"{"data": {"power": "-600"}, "message": "SUCCESS"}"#;
/// let setting = PowerSetting::from_response(body).unwrap();
/// assert_eq!(setting.limit().unwrap().watts(), -600);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PowerSetting {
    #[serde(default, deserialize_with = "de::integer")]
    power: i64,
}

impl PowerSetting {
    /// Parses a full `getPower` response body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the body is malformed.
    pub fn from_response(body: &str) -> Result<Self, ProtocolError> {
        Envelope::<Self>::parse(body)?.into_data()
    }

    /// Returns the raw value in Watts.
    #[must_use]
    pub fn raw_watts(&self) -> i64 {
        self.power
    }

    /// Returns the setting as a [`PowerLimit`].
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidValue` if the device reports a value
    /// outside the range it accepts.
    pub fn limit(&self) -> Result<PowerLimit, ProtocolError> {
        i32::try_from(self.power)
            .ok()
            .and_then(|watts| PowerLimit::new(watts).ok())
            .ok_or_else(|| ProtocolError::InvalidValue {
                field: "power".to_string(),
                message: format!(
                    "{} is outside [{}, {}]",
                    self.power,
                    PowerLimit::MIN_WATTS,
                    PowerLimit::MAX_WATTS
                ),
            })
    }
}

/// Acknowledgement of a `setPower` request.
///
/// The device echoes a `message` field; anything other than `SUCCESS`
/// means the write was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetPowerAck {
    accepted: bool,
    message: Option<String>,
}

impl SetPowerAck {
    /// Parses a full `setPower` response body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Json` if the body is not valid JSON.
    pub fn from_response(body: &str) -> Result<Self, ProtocolError> {
        let envelope = Envelope::<serde_json::Value>::parse(body)?;
        Ok(Self {
            accepted: envelope.is_success(),
            message: envelope.message().map(str::to_string),
        })
    }

    /// Returns `true` if the device accepted the new setting.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Returns the raw message sent by the device.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Converts a refusal into an error.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Rejected` carrying the device's message if the
    /// setting was not accepted.
    pub fn ensure_accepted(&self) -> Result<(), ProtocolError> {
        if self.accepted {
            Ok(())
        } else {
            Err(ProtocolError::Rejected(
                self.message.clone().unwrap_or_else(|| "no message".to_string()),
            ))
        }
    }
}

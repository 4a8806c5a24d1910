// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response parsing for the EZHI local API.
//!
//! Every endpoint answers with the same envelope:
//!
//! ```json
//! {"data": { ... }, "message": "SUCCESS", "deviceId": "E1700000000"}
//! ```
//!
//! The snapshot types in this module are produced wholesale from the `data`
//! object of one response and never modified afterwards.

mod alarm;
pub(crate) mod de;
mod device_info;
mod output;
mod power;

pub use alarm::{AlarmKind, AlarmSnapshot};
pub use device_info::DeviceInfoSnapshot;
pub use output::OutputSnapshot;
pub use power::{PowerSetting, SetPowerAck};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ProtocolError;

/// Message the firmware sends when a request was accepted.
pub const SUCCESS_MESSAGE: &str = "SUCCESS";

/// Common response envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope<T> {
    data: Option<T>,
    message: Option<String>,
    #[serde(rename = "deviceId")]
    device_id: Option<String>,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Parses a raw response body.
    pub(crate) fn parse(body: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(body).map_err(Into::into)
    }
}

impl<T> Envelope<T> {
    /// Returns `true` if the device acknowledged the request.
    pub(crate) fn is_success(&self) -> bool {
        self.message.as_deref() == Some(SUCCESS_MESSAGE)
    }

    pub(crate) fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub(crate) fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    /// Extracts the `data` object.
    pub(crate) fn into_data(self) -> Result<T, ProtocolError> {
        self.data
            .ok_or_else(|| ProtocolError::MissingField("data".to_string()))
    }
}

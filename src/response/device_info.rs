// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identity (`getDeviceInfo`).

use serde::Deserialize;

use super::{Envelope, de};
use crate::error::ProtocolError;

/// Identity fields of the inverter.
///
/// Every field is optional: older firmware omits some of them.
///
/// # Examples
///
/// ```
/// use ezhi_lib::response::DeviceInfoSnapshot;
///
/// let body = r#"{
///     "data": {"devVer": "EZHI_1.0.5", "ipAddr": "192.168.1.40", "batteryCapacity": "2.4"},
///     "message": "SUCCESS",
///     "deviceId": "E17000000001"
/// }"#;
/// let info = DeviceInfoSnapshot::from_response(body).unwrap();
/// assert_eq!(info.device_id.as_deref(), Some("E17000000001"));
/// assert_eq!(info.battery_capacity, Some(2.4));
/// assert_eq!(
///     info.configuration_url().as_deref(),
///     Some("http://192.168.1.40/getDeviceInfo")
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeviceInfoSnapshot {
    /// Serial number.
    #[serde(rename = "deviceId", default, deserialize_with = "de::opt_string")]
    pub device_id: Option<String>,
    /// Firmware version.
    #[serde(rename = "devVer", default, deserialize_with = "de::opt_string")]
    pub firmware_version: Option<String>,
    /// IP address reported by the device.
    #[serde(
        rename = "ip",
        alias = "ipAddr",
        default,
        deserialize_with = "de::opt_string"
    )]
    pub ip_address: Option<String>,
    /// Battery capacity in kWh.
    #[serde(rename = "batteryCapacity", default, deserialize_with = "de::opt_number")]
    pub battery_capacity: Option<f64>,
}

impl DeviceInfoSnapshot {
    /// Parses a full `getDeviceInfo` response body.
    ///
    /// The serial number falls back to the envelope's `deviceId` when the
    /// `data` object does not carry one.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the body is not valid JSON or has no `data`
    /// object.
    pub fn from_response(body: &str) -> Result<Self, ProtocolError> {
        let envelope = Envelope::<Self>::parse(body)?;
        let fallback_id = envelope.device_id().map(str::to_string);
        let mut info = envelope.into_data()?;
        if info.device_id.is_none() {
            info.device_id = fallback_id;
        }
        Ok(info)
    }

    /// Returns the local API URL of the device, if its IP is known.
    #[must_use]
    pub fn configuration_url(&self) -> Option<String> {
        self.ip_address
            .as_ref()
            .map(|ip| format!("http://{ip}/getDeviceInfo"))
    }
}

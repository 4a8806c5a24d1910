// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output telemetry (`getOutputData`).

use serde::Deserialize;

use super::{Envelope, de};
use crate::error::ProtocolError;
use crate::types::BatteryStatus;

/// Instantaneous telemetry of the inverter.
///
/// Powers are in Watts, energies in kWh, temperatures in °C and battery
/// percentages in `%`. Counters the firmware omits decode to zero.
///
/// # Examples
///
/// ```
/// use ezhi_lib::response::OutputSnapshot;
/// use ezhi_lib::types::BatteryStatus;
///
/// let body = r#"{
///     "data": {"batS": "2", "batSoc": "87", "pvP": "412", "ogP": "-150"},
///     "message": "SUCCESS"
/// }"#;
/// let output = OutputSnapshot::from_response(body).unwrap();
/// assert_eq!(output.battery_status, BatteryStatus::Charging);
/// assert_eq!(output.pv_power, 412.0);
/// assert_eq!(output.on_grid_power, -150.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OutputSnapshot {
    /// Battery operating state (`batS`).
    #[serde(rename = "batS", default, deserialize_with = "de::battery_status")]
    pub battery_status: BatteryStatus,
    /// Battery state of charge (`batSoc`).
    #[serde(rename = "batSoc", default, deserialize_with = "de::number")]
    pub battery_soc: f64,
    /// Battery state of health (`batSoh`).
    #[serde(rename = "batSoh", default, deserialize_with = "de::number")]
    pub battery_soh: f64,
    /// Battery temperature (`batTemp`).
    #[serde(rename = "batTemp", default, deserialize_with = "de::number")]
    pub battery_temperature: f64,
    /// Inverter temperature (`devTemp`).
    #[serde(rename = "devTemp", default, deserialize_with = "de::number")]
    pub device_temperature: f64,
    /// Photovoltaic input power (`pvP`).
    #[serde(rename = "pvP", default, deserialize_with = "de::number")]
    pub pv_power: f64,
    /// Total photovoltaic input energy (`pvTE`).
    #[serde(rename = "pvTE", default, deserialize_with = "de::number")]
    pub pv_total_energy: f64,
    /// Battery power (`batP`).
    #[serde(rename = "batP", default, deserialize_with = "de::number")]
    pub battery_power: f64,
    /// Total battery charge energy (`batCTE`).
    #[serde(rename = "batCTE", default, deserialize_with = "de::number")]
    pub battery_charge_energy: f64,
    /// Total battery discharge energy (`batDTE`).
    #[serde(rename = "batDTE", default, deserialize_with = "de::number")]
    pub battery_discharge_energy: f64,
    /// On-grid power (`ogP`).
    #[serde(rename = "ogP", default, deserialize_with = "de::number")]
    pub on_grid_power: f64,
    /// Total on-grid output energy (`ogOTE`).
    #[serde(rename = "ogOTE", default, deserialize_with = "de::number")]
    pub on_grid_output_energy: f64,
    /// Total on-grid input energy (`ogITE`).
    #[serde(rename = "ogITE", default, deserialize_with = "de::number")]
    pub on_grid_input_energy: f64,
    /// Off-grid power (`ofgP`).
    #[serde(rename = "ofgP", default, deserialize_with = "de::number")]
    pub off_grid_power: f64,
    /// Total off-grid output energy (`ofgOTE`).
    #[serde(rename = "ofgOTE", default, deserialize_with = "de::number")]
    pub off_grid_output_energy: f64,
    /// Total off-grid input energy (`ofgITE`).
    #[serde(rename = "ofgITE", default, deserialize_with = "de::number")]
    pub off_grid_input_energy: f64,
}

impl OutputSnapshot {
    /// Parses a full `getOutputData` response body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the body is not valid JSON, has no `data`
    /// object, or contains a value that is not a number.
    pub fn from_response(body: &str) -> Result<Self, ProtocolError> {
        Envelope::<Self>::parse(body)?.into_data()
    }
}

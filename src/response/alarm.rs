// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alarm flags (`getAlarm`).

use std::fmt;

use serde::Deserialize;

use super::{Envelope, de};
use crate::error::ProtocolError;

/// Fault conditions reported by `getAlarm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmKind {
    /// Battery high temperature protection (`BatHTP`).
    BatteryOverTemperature,
    /// Battery low temperature protection (`BatLTP`).
    BatteryUnderTemperature,
    /// Battery communication error (`BatCE`).
    BatteryCommunicationError,
    /// Battery overvoltage (`BatHV`).
    BatteryOvervoltage,
    /// Battery undervoltage (`BatLV`).
    BatteryUndervoltage,
    /// Battery overcurrent (`BatHI`).
    BatteryOvercurrent,
    /// Battery error (`BatE`).
    BatteryError,
    /// Device temperature protection (`DTP`).
    DeviceOverTemperature,
    /// Device error (`EE`).
    DeviceError,
    /// Battery shutdown (`SBS`).
    BatteryShutdown,
    /// AC abnormal (`ACA`).
    AcAbnormal,
    /// Off-grid overcurrent (`OfOI`).
    OffGridOvercurrent,
    /// PV high voltage (`PvHV`).
    PvOvervoltage,
    /// PV overcurrent (`PvOC`).
    PvOvercurrent,
    /// IRD error (`IRDE`).
    IrdError,
    /// PV wiring error (`PVWE`).
    PvWiringError,
    /// Off-grid short circuit (`OfGS`).
    OffGridShortCircuit,
}

impl AlarmKind {
    /// All alarm kinds, in the order the firmware lists them.
    pub const ALL: [Self; 17] = [
        Self::BatteryOverTemperature,
        Self::BatteryUnderTemperature,
        Self::BatteryCommunicationError,
        Self::BatteryOvervoltage,
        Self::BatteryUndervoltage,
        Self::BatteryOvercurrent,
        Self::BatteryError,
        Self::DeviceOverTemperature,
        Self::DeviceError,
        Self::BatteryShutdown,
        Self::AcAbnormal,
        Self::OffGridOvercurrent,
        Self::PvOvervoltage,
        Self::PvOvercurrent,
        Self::IrdError,
        Self::PvWiringError,
        Self::OffGridShortCircuit,
    ];

    /// Returns the key used in the JSON payload.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::BatteryOverTemperature => "BatHTP",
            Self::BatteryUnderTemperature => "BatLTP",
            Self::BatteryCommunicationError => "BatCE",
            Self::BatteryOvervoltage => "BatHV",
            Self::BatteryUndervoltage => "BatLV",
            Self::BatteryOvercurrent => "BatHI",
            Self::BatteryError => "BatE",
            Self::DeviceOverTemperature => "DTP",
            Self::DeviceError => "EE",
            Self::BatteryShutdown => "SBS",
            Self::AcAbnormal => "ACA",
            Self::OffGridOvercurrent => "OfOI",
            Self::PvOvervoltage => "PvHV",
            Self::PvOvercurrent => "PvOC",
            Self::IrdError => "IRDE",
            Self::PvWiringError => "PVWE",
            Self::OffGridShortCircuit => "OfGS",
        }
    }

    /// Returns a human readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::BatteryOverTemperature => "Battery Overtemperature",
            Self::BatteryUnderTemperature => "Battery Undertemperature",
            Self::BatteryCommunicationError => "Battery Communication Error",
            Self::BatteryOvervoltage => "Battery Overvoltage",
            Self::BatteryUndervoltage => "Battery Undervoltage",
            Self::BatteryOvercurrent => "Battery Overcurrent",
            Self::BatteryError => "Battery Error",
            Self::DeviceOverTemperature => "Device Overtemperature",
            Self::DeviceError => "Device Error",
            Self::BatteryShutdown => "Battery Shutdown",
            Self::AcAbnormal => "AC Abnormal",
            Self::OffGridOvercurrent => "Off-Grid Overcurrent",
            Self::PvOvervoltage => "PV Overvoltage",
            Self::PvOvercurrent => "PV Overcurrent",
            Self::IrdError => "IRD Error",
            Self::PvWiringError => "PV Wiring Error",
            Self::OffGridShortCircuit => "Off-Grid Short Circuit",
        }
    }
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fault flags reported by the inverter; `true` means the alarm is raised.
///
/// # Examples
///
/// ```
/// use ezhi_lib::response::{AlarmKind, AlarmSnapshot};
///
/// let body = r#"{"data": {"BatHTP": "1", "ACA": "0", "PVWE": "1"}, "message": "SUCCESS"}"#;
/// let alarms = AlarmSnapshot::from_response(body).unwrap();
/// assert!(alarms.is_active(AlarmKind::BatteryOverTemperature));
/// assert_eq!(
///     alarms.active(),
///     vec![AlarmKind::BatteryOverTemperature, AlarmKind::PvWiringError]
/// );
/// ```
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AlarmSnapshot {
    /// Battery high temperature protection.
    #[serde(rename = "BatHTP", default, deserialize_with = "de::flag")]
    pub battery_over_temperature: bool,
    /// Battery low temperature protection.
    #[serde(rename = "BatLTP", default, deserialize_with = "de::flag")]
    pub battery_under_temperature: bool,
    /// Battery communication error.
    #[serde(rename = "BatCE", default, deserialize_with = "de::flag")]
    pub battery_communication_error: bool,
    /// Battery overvoltage.
    #[serde(rename = "BatHV", default, deserialize_with = "de::flag")]
    pub battery_overvoltage: bool,
    /// Battery undervoltage.
    #[serde(rename = "BatLV", default, deserialize_with = "de::flag")]
    pub battery_undervoltage: bool,
    /// Battery overcurrent.
    #[serde(rename = "BatHI", default, deserialize_with = "de::flag")]
    pub battery_overcurrent: bool,
    /// Battery error.
    #[serde(rename = "BatE", default, deserialize_with = "de::flag")]
    pub battery_error: bool,
    /// Device temperature protection.
    #[serde(rename = "DTP", default, deserialize_with = "de::flag")]
    pub device_over_temperature: bool,
    /// Device error.
    #[serde(rename = "EE", default, deserialize_with = "de::flag")]
    pub device_error: bool,
    /// Battery shutdown.
    #[serde(rename = "SBS", default, deserialize_with = "de::flag")]
    pub battery_shutdown: bool,
    /// AC abnormal.
    #[serde(rename = "ACA", default, deserialize_with = "de::flag")]
    pub ac_abnormal: bool,
    /// Off-grid overcurrent.
    #[serde(rename = "OfOI", default, deserialize_with = "de::flag")]
    pub off_grid_overcurrent: bool,
    /// PV high voltage.
    #[serde(rename = "PvHV", default, deserialize_with = "de::flag")]
    pub pv_overvoltage: bool,
    /// PV overcurrent.
    #[serde(rename = "PvOC", default, deserialize_with = "de::flag")]
    pub pv_overcurrent: bool,
    /// IRD error.
    #[serde(rename = "IRDE", default, deserialize_with = "de::flag")]
    pub ird_error: bool,
    /// PV wiring error.
    #[serde(rename = "PVWE", default, deserialize_with = "de::flag")]
    pub pv_wiring_error: bool,
    /// Off-grid short circuit.
    #[serde(rename = "OfGS", default, deserialize_with = "de::flag")]
    pub off_grid_short_circuit: bool,
}

impl AlarmSnapshot {
    /// Parses a full `getAlarm` response body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the body is not valid JSON, has no `data`
    /// object, or contains a flag other than `0`/`1`.
    pub fn from_response(body: &str) -> Result<Self, ProtocolError> {
        Envelope::<Self>::parse(body)?.into_data()
    }

    /// Returns whether the given alarm is raised.
    #[must_use]
    pub fn is_active(&self, kind: AlarmKind) -> bool {
        match kind {
            AlarmKind::BatteryOverTemperature => self.battery_over_temperature,
            AlarmKind::BatteryUnderTemperature => self.battery_under_temperature,
            AlarmKind::BatteryCommunicationError => self.battery_communication_error,
            AlarmKind::BatteryOvervoltage => self.battery_overvoltage,
            AlarmKind::BatteryUndervoltage => self.battery_undervoltage,
            AlarmKind::BatteryOvercurrent => self.battery_overcurrent,
            AlarmKind::BatteryError => self.battery_error,
            AlarmKind::DeviceOverTemperature => self.device_over_temperature,
            AlarmKind::DeviceError => self.device_error,
            AlarmKind::BatteryShutdown => self.battery_shutdown,
            AlarmKind::AcAbnormal => self.ac_abnormal,
            AlarmKind::OffGridOvercurrent => self.off_grid_overcurrent,
            AlarmKind::PvOvervoltage => self.pv_overvoltage,
            AlarmKind::PvOvercurrent => self.pv_overcurrent,
            AlarmKind::IrdError => self.ird_error,
            AlarmKind::PvWiringError => self.pv_wiring_error,
            AlarmKind::OffGridShortCircuit => self.off_grid_short_circuit,
        }
    }

    /// Returns the raised alarms.
    #[must_use]
    pub fn active(&self) -> Vec<AlarmKind> {
        AlarmKind::ALL
            .into_iter()
            .filter(|kind| self.is_active(*kind))
            .collect()
    }

    /// Returns `true` if any alarm is raised.
    #[must_use]
    pub fn any_active(&self) -> bool {
        AlarmKind::ALL.iter().any(|kind| self.is_active(*kind))
    }
}

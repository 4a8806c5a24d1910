// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Battery status codes reported in the `batS` output field.

use std::fmt;

/// Battery operating state.
///
/// # Examples
///
/// ```
/// use ezhi_lib::types::BatteryStatus;
///
/// assert_eq!(BatteryStatus::from_code(2), BatteryStatus::Charging);
/// assert_eq!(BatteryStatus::from_code(42), BatteryStatus::Unknown(42));
/// assert_eq!(BatteryStatus::Discharging.as_str(), "Discharging");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatteryStatus {
    /// Battery is idle.
    Idle,
    /// Battery is charging.
    Charging,
    /// Battery is discharging.
    Discharging,
    /// Battery reported a fault.
    Fault,
    /// Battery is shut down.
    Shutdown,
    /// The inverter cannot talk to the battery.
    NoCommunication,
    /// Code not documented by the vendor (includes `0`, sent before the
    /// battery is detected).
    Unknown(u32),
}

impl BatteryStatus {
    /// Decodes a raw `batS` code.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Idle,
            2 => Self::Charging,
            3 => Self::Discharging,
            4 => Self::Fault,
            5 => Self::Shutdown,
            6 => Self::NoCommunication,
            other => Self::Unknown(other),
        }
    }

    /// Returns the raw code.
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::Idle => 1,
            Self::Charging => 2,
            Self::Discharging => 3,
            Self::Fault => 4,
            Self::Shutdown => 5,
            Self::NoCommunication => 6,
            Self::Unknown(code) => *code,
        }
    }

    /// Returns a human readable label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Charging => "Charging",
            Self::Discharging => "Discharging",
            Self::Fault => "Fault",
            Self::Shutdown => "Shutdown",
            Self::NoCommunication => "No Communication",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl Default for BatteryStatus {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "Unknown ({code})"),
            known => f.write_str(known.as_str()),
        }
    }
}

impl From<u32> for BatteryStatus {
    fn from(code: u32) -> Self {
        Self::from_code(code)
    }
}

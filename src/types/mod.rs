// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for EZHI inverters.
//!
//! Constrained types validate their input on construction so that an
//! out-of-range value can never reach the device.

mod battery_status;
mod power_limit;

pub use battery_status::BatteryStatus;
pub use power_limit::PowerLimit;

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Protocol implementations for communicating with EZHI inverters.
//!
//! The coordinator talks to the inverter through the [`DeviceApi`] trait.
//! [`HttpClient`] implements it against the local HTTP API; tests and
//! alternative transports provide their own implementations.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpClient, HttpConfig};

use std::future::Future;

use crate::error::Error;
use crate::response::{AlarmSnapshot, DeviceInfoSnapshot, OutputSnapshot};
use crate::types::PowerLimit;

/// Operations the inverter exposes.
///
/// Every call is bound by the implementation's own timeout; exceeding it
/// must surface as [`ConnectivityError`](crate::error::ConnectivityError).
/// The returned futures are `Send` so the coordinator can run them on
/// spawned tasks.
pub trait DeviceApi: Send + Sync + 'static {
    /// Fetches the instantaneous telemetry.
    ///
    /// # Errors
    ///
    /// Returns a connectivity error if the device is unreachable, or a
    /// protocol error if the payload is unusable.
    fn fetch_output(&self) -> impl Future<Output = Result<OutputSnapshot, Error>> + Send;

    /// Fetches the alarm flags.
    ///
    /// # Errors
    ///
    /// Returns a connectivity error if the device is unreachable, or a
    /// protocol error if the payload is unusable.
    fn fetch_alarms(&self) -> impl Future<Output = Result<AlarmSnapshot, Error>> + Send;

    /// Fetches the identity fields.
    ///
    /// # Errors
    ///
    /// Returns a connectivity error if the device is unreachable, or a
    /// protocol error if the payload is unusable.
    fn fetch_device_info(&self) -> impl Future<Output = Result<DeviceInfoSnapshot, Error>> + Send;

    /// Reads the current on-grid power setting.
    ///
    /// # Errors
    ///
    /// Returns a connectivity error if the device is unreachable, or a
    /// protocol error if the payload is unusable.
    fn fetch_power_limit(&self) -> impl Future<Output = Result<PowerLimit, Error>> + Send;

    /// Writes the on-grid power setting.
    ///
    /// Returns `Ok(true)` when the device acknowledged the write.
    ///
    /// # Errors
    ///
    /// Returns a connectivity error if the device is unreachable.
    fn set_power(&self, limit: PowerLimit) -> impl Future<Output = Result<bool, Error>> + Send;
}

impl<T: DeviceApi> DeviceApi for std::sync::Arc<T> {
    fn fetch_output(&self) -> impl Future<Output = Result<OutputSnapshot, Error>> + Send {
        (**self).fetch_output()
    }

    fn fetch_alarms(&self) -> impl Future<Output = Result<AlarmSnapshot, Error>> + Send {
        (**self).fetch_alarms()
    }

    fn fetch_device_info(&self) -> impl Future<Output = Result<DeviceInfoSnapshot, Error>> + Send {
        (**self).fetch_device_info()
    }

    fn fetch_power_limit(&self) -> impl Future<Output = Result<PowerLimit, Error>> + Send {
        (**self).fetch_power_limit()
    }

    fn set_power(&self, limit: PowerLimit) -> impl Future<Output = Result<bool, Error>> + Send {
        (**self).set_power(limit)
    }
}

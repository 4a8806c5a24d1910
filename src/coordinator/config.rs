// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration types for the coordinator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
#[cfg(feature = "http")]
use crate::protocol::HttpConfig;

/// Polling periods of the two cadences.
///
/// # Examples
///
/// ```
/// use ezhi_lib::PollIntervals;
/// use std::time::Duration;
///
/// let intervals = PollIntervals::new(10, 120).unwrap();
/// assert_eq!(intervals.fast(), Duration::from_secs(10));
/// assert_eq!(intervals.slow(), Duration::from_secs(120));
///
/// assert!(PollIntervals::new(0, 60).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    fast: Duration,
    slow: Duration,
}

impl PollIntervals {
    /// Default output refresh period in seconds.
    pub const DEFAULT_FAST_SECS: u64 = 5;

    /// Default alarm and device-info refresh period in seconds.
    pub const DEFAULT_SLOW_SECS: u64 = 60;

    /// Creates intervals from periods in seconds.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidInterval` if either period is zero.
    pub fn new(fast_secs: u64, slow_secs: u64) -> Result<Self, ConfigError> {
        if fast_secs == 0 {
            return Err(ConfigError::InvalidInterval {
                name: "scan_interval_output",
                value: fast_secs,
            });
        }
        if slow_secs == 0 {
            return Err(ConfigError::InvalidInterval {
                name: "scan_interval_alarm",
                value: slow_secs,
            });
        }
        Ok(Self {
            fast: Duration::from_secs(fast_secs),
            slow: Duration::from_secs(slow_secs),
        })
    }

    /// Returns the output refresh period.
    #[must_use]
    pub fn fast(&self) -> Duration {
        self.fast
    }

    /// Returns the alarm and device-info refresh period.
    #[must_use]
    pub fn slow(&self) -> Duration {
        self.slow
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            fast: Duration::from_secs(Self::DEFAULT_FAST_SECS),
            slow: Duration::from_secs(Self::DEFAULT_SLOW_SECS),
        }
    }
}

/// Interval options as stored in a configuration entry.
///
/// Older entries carry a single `update_interval`; it is used for the output
/// cadence when `scan_interval_output` is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSettings {
    /// Output refresh period in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_interval_output: Option<u64>,
    /// Alarm and device-info refresh period in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_interval_alarm: Option<u64>,
    /// Legacy single interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_interval: Option<u64>,
}

impl IntervalSettings {
    /// Resolves the effective polling intervals.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidInterval` if a resolved period is zero.
    pub fn resolve(&self) -> Result<PollIntervals, ConfigError> {
        let fast = self
            .scan_interval_output
            .or(self.update_interval)
            .unwrap_or(PollIntervals::DEFAULT_FAST_SECS);
        let slow = self
            .scan_interval_alarm
            .unwrap_or(PollIntervals::DEFAULT_SLOW_SECS);
        PollIntervals::new(fast, slow)
    }
}

/// Configuration for a [`Coordinator`](crate::Coordinator).
///
/// # Examples
///
/// ```
/// use ezhi_lib::{CoordinatorConfig, PollIntervals};
///
/// let config = CoordinatorConfig::default()
///     .with_name("garage")
///     .with_intervals(PollIntervals::new(10, 300).unwrap());
///
/// assert_eq!(config.name(), "garage");
/// assert!(config.always_notify());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    name: String,
    intervals: PollIntervals,
    always_notify: bool,
}

impl CoordinatorConfig {
    /// Name used when none is configured.
    pub const DEFAULT_NAME: &'static str = "ezhi";

    /// Sets the name used in log output.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the polling intervals used by [`Coordinator::start_default`](crate::Coordinator::start_default).
    #[must_use]
    pub fn with_intervals(mut self, intervals: PollIntervals) -> Self {
        self.intervals = intervals;
        self
    }

    /// Sets whether every completed output refresh notifies listeners.
    ///
    /// When disabled, listeners are only notified when the snapshot changed
    /// or the refresh outcome flipped between success and failure.
    #[must_use]
    pub fn with_always_notify(mut self, always_notify: bool) -> Self {
        self.always_notify = always_notify;
        self
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configured polling intervals.
    #[must_use]
    pub fn intervals(&self) -> PollIntervals {
        self.intervals
    }

    /// Returns whether every completed output refresh notifies listeners.
    #[must_use]
    pub fn always_notify(&self) -> bool {
        self.always_notify
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            intervals: PollIntervals::default(),
            always_notify: true,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DeviceSettings::DEFAULT_TIMEOUT_SECS
}

/// Stored settings for one inverter.
///
/// # Examples
///
/// ```
/// use ezhi_lib::DeviceSettings;
/// use std::time::Duration;
///
/// let settings: DeviceSettings = serde_json::from_str(
///     r#"{"ip_address": "192.168.1.40", "update_interval": 15}"#,
/// ).unwrap();
///
/// let config = settings.coordinator_config().unwrap();
/// assert_eq!(config.intervals().fast(), Duration::from_secs(15));
/// assert_eq!(config.intervals().slow(), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Address of the inverter.
    pub ip_address: String,
    /// HTTP port, if not the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Polling intervals.
    #[serde(flatten)]
    pub intervals: IntervalSettings,
}

impl DeviceSettings {
    /// Request timeout used when none is stored.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 8;

    /// Creates settings for the given address with default options.
    #[must_use]
    pub fn new(ip_address: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            port: None,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            intervals: IntervalSettings::default(),
        }
    }

    /// Builds the HTTP client configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the address is unusable or the timeout is
    /// zero.
    #[cfg(feature = "http")]
    pub fn http_config(&self) -> Result<HttpConfig, ConfigError> {
        let mut config = HttpConfig::new(self.ip_address.trim())
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        config.validate()?;
        Ok(config)
    }

    /// Builds the coordinator configuration, named after the address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidInterval` if a resolved interval is zero.
    pub fn coordinator_config(&self) -> Result<CoordinatorConfig, ConfigError> {
        let intervals = self.intervals.resolve()?;
        Ok(CoordinatorConfig::default()
            .with_name(self.ip_address.trim())
            .with_intervals(intervals))
    }
}

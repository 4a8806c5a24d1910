// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP implementation of the EZHI local API.

use std::time::Duration;

use reqwest::Client;

use crate::error::{ConfigError, ConnectivityError, Error, ProtocolError};
use crate::protocol::DeviceApi;
use crate::response::{
    AlarmSnapshot, DeviceInfoSnapshot, OutputSnapshot, PowerSetting, SetPowerAck,
};
use crate::types::PowerLimit;

// ============================================================================
// HttpConfig - Connection parameters for one inverter
// ============================================================================

/// Configuration for an HTTP connection to an EZHI inverter.
///
/// The local API listens on plain HTTP; there is no authentication.
///
/// # Examples
///
/// ```
/// use ezhi_lib::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("192.168.1.40")
///     .with_port(8050)
///     .with_timeout(Duration::from_secs(8));
///
/// assert_eq!(config.base_url(), "http://192.168.1.40:8050");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    timeout: Duration,
}

impl HttpConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new HTTP configuration for the specified host.
    ///
    /// `host` may also be a full base URL (`http://host:port`), in which case
    /// the configured port is ignored.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            return host.to_string();
        }
        if self.port == Self::DEFAULT_PORT {
            format!("http://{host}")
        } else {
            format!("http://{host}:{}", self.port)
        }
    }

    /// Checks that the host is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidAddress` if the host is empty or contains
    /// whitespace, or `ConfigError::InvalidInterval` for a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConfigError::InvalidAddress("host is required".to_string()));
        }
        if host.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidAddress(format!(
                "{host:?} contains whitespace"
            )));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidInterval {
                name: "timeout",
                value: 0,
            });
        }
        Ok(())
    }

    /// Creates an `HttpClient` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn into_client(self) -> Result<HttpClient, ConfigError> {
        self.validate()?;

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ConfigError::ClientBuild(e.to_string()))?;

        Ok(HttpClient {
            base_url: self.base_url(),
            client,
            timeout: self.timeout,
        })
    }
}

// ============================================================================
// HttpClient - DeviceApi over HTTP
// ============================================================================

/// HTTP client for one EZHI inverter.
///
/// Each operation is a single GET request against the local API
/// (`/getOutputData`, `/getAlarm`, `/getDeviceInfo`, `/getPower`,
/// `/setPower?p=<watts>`).
///
/// # Examples
///
/// ```no_run
/// use ezhi_lib::protocol::{DeviceApi, HttpClient};
///
/// # async fn example() -> ezhi_lib::Result<()> {
/// let client = HttpClient::new("192.168.1.40")?;
/// let output = client.fetch_output().await?;
/// println!("PV power: {} W", output.pv_power);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client for the specified host with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if the host is invalid or the HTTP client cannot be
    /// created.
    pub fn new(host: impl Into<String>) -> Result<Self, ConfigError> {
        HttpConfig::new(host).into_client()
    }

    /// Returns the base URL of the device.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL for an endpoint.
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    /// Builds the URL of a `setPower` request.
    fn set_power_url(&self, limit: PowerLimit) -> String {
        let value = limit.watts().to_string();
        format!(
            "{}?p={}",
            self.build_url("setPower"),
            urlencoding::encode(&value)
        )
    }

    /// Classifies a transport failure.
    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            let ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
            ConnectivityError::Timeout(ms).into()
        } else if err.is_connect() {
            ConnectivityError::ConnectionFailed(err.to_string()).into()
        } else {
            ConnectivityError::Http(err).into()
        }
    }

    async fn get(&self, url: &str) -> Result<String, Error> {
        tracing::debug!(url = %url, "Sending HTTP request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProtocolError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            }
            .into());
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        tracing::trace!(body = %body, "Received HTTP response");

        Ok(body)
    }
}

impl DeviceApi for HttpClient {
    async fn fetch_output(&self) -> Result<OutputSnapshot, Error> {
        let body = self.get(&self.build_url("getOutputData")).await?;
        Ok(OutputSnapshot::from_response(&body)?)
    }

    async fn fetch_alarms(&self) -> Result<AlarmSnapshot, Error> {
        let body = self.get(&self.build_url("getAlarm")).await?;
        Ok(AlarmSnapshot::from_response(&body)?)
    }

    async fn fetch_device_info(&self) -> Result<DeviceInfoSnapshot, Error> {
        let body = self.get(&self.build_url("getDeviceInfo")).await?;
        Ok(DeviceInfoSnapshot::from_response(&body)?)
    }

    async fn fetch_power_limit(&self) -> Result<PowerLimit, Error> {
        let body = self.get(&self.build_url("getPower")).await?;
        Ok(PowerSetting::from_response(&body)?.limit()?)
    }

    async fn set_power(&self, limit: PowerLimit) -> Result<bool, Error> {
        let body = self.get(&self.set_power_url(limit)).await?;
        if let Err(e) = SetPowerAck::from_response(&body)?.ensure_accepted() {
            tracing::debug!(error = %e, %limit, "Device did not accept power setting");
            return Ok(false);
        }
        Ok(true)
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ezhi_lib` - A Rust library to poll APsystems EZHI hybrid inverters.
//!
//! This library talks to the inverter's local HTTP API and keeps the latest
//! readings available to observers through a polling coordinator.
//!
//! # Supported Features
//!
//! - **Telemetry**: Battery state, PV/battery/grid power and energy counters
//! - **Alarms**: The 17 fault flags reported by the device
//! - **Device info**: Serial number, firmware version, battery capacity
//! - **Power control**: Read and write the on-grid power setting
//!
//! # Quick Start
//!
//! ## One-off Requests
//!
//! ```no_run
//! use ezhi_lib::protocol::{DeviceApi, HttpClient};
//!
//! #[tokio::main]
//! async fn main() -> ezhi_lib::Result<()> {
//!     let client = HttpClient::new("192.168.1.40")?;
//!
//!     let output = client.fetch_output().await?;
//!     println!("PV: {} W, battery: {}%", output.pv_power, output.battery_soc);
//!
//!     let alarms = client.fetch_alarms().await?;
//!     for alarm in alarms.active() {
//!         println!("Alarm: {alarm}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Polling Coordinator
//!
//! ```no_run
//! use ezhi_lib::{Coordinator, CoordinatorConfig, PollIntervals};
//! use ezhi_lib::protocol::HttpClient;
//!
//! #[tokio::main]
//! async fn main() -> ezhi_lib::Result<()> {
//!     let client = HttpClient::new("192.168.1.40")?;
//!     let coordinator = Coordinator::new(client, CoordinatorConfig::default());
//!
//!     let handle = coordinator.handle();
//!     coordinator.subscribe(move || {
//!         if let Some(output) = handle.current_output() {
//!             println!("On-grid power: {} W", output.on_grid_power);
//!         }
//!     });
//!
//!     coordinator.start(PollIntervals::new(5, 60)?).await;
//!
//!     // Values outside the accepted range are clamped
//!     let accepted = coordinator.set_power(600).await;
//!     println!("Power setting accepted: {accepted}");
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(600)).await;
//!     coordinator.stop();
//!     Ok(())
//! }
//! ```

pub mod coordinator;
pub mod error;
pub mod protocol;
pub mod response;
pub mod subscription;
pub mod types;

pub use coordinator::{
    Coordinator, CoordinatorConfig, CoordinatorHandle, DeviceSettings, IntervalSettings,
    PollIntervals,
};
pub use error::{ConfigError, ConnectivityError, Error, ProtocolError, Result, ValueError};
pub use protocol::DeviceApi;
#[cfg(feature = "http")]
pub use protocol::{HttpClient, HttpConfig};
pub use response::{
    AlarmKind, AlarmSnapshot, DeviceInfoSnapshot, OutputSnapshot, PowerSetting, SetPowerAck,
};
pub use subscription::{ListenerRegistry, SubscriptionId};
pub use types::{BatteryStatus, PowerLimit};

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling coordinator for one EZHI inverter.
//!
//! The [`Coordinator`] runs two independent cadences against a
//! [`DeviceApi`]:
//!
//! - **fast**: refreshes the output telemetry through a single-flight
//!   controller and notifies listeners according to the change rules below
//! - **slow**: refreshes alarms and device info, then always notifies
//!
//! # Notification rules
//!
//! After an output refresh, listeners are notified unless both this refresh
//! and the previous one failed. Otherwise they are notified when
//! [`CoordinatorConfig::always_notify`] is set (the default), when the
//! outcome flipped between success and failure, or when the snapshot
//! changed.
//!
//! # Examples
//!
//! ```no_run
//! use ezhi_lib::{Coordinator, DeviceSettings};
//!
//! #[tokio::main]
//! async fn main() -> ezhi_lib::Result<()> {
//!     let settings = DeviceSettings::new("192.168.1.40");
//!     let client = settings.http_config()?.into_client()?;
//!     let config = settings.coordinator_config()?;
//!     let intervals = config.intervals();
//!
//!     let coordinator = Coordinator::new(client, config);
//!     coordinator.start(intervals).await;
//!
//!     if let Some(output) = coordinator.current_output() {
//!         println!("Battery: {}% ({})", output.battery_soc, output.battery_status);
//!     }
//!
//!     coordinator.stop();
//!     Ok(())
//! }
//! ```

mod config;
mod refresh;
mod scheduler;
mod store;

pub use config::{CoordinatorConfig, DeviceSettings, IntervalSettings, PollIntervals};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::protocol::DeviceApi;
use crate::response::{AlarmSnapshot, DeviceInfoSnapshot, OutputSnapshot};
use crate::subscription::SubscriptionId;
use crate::types::PowerLimit;

use refresh::Shared;
use scheduler::Schedule;
use store::SnapshotStore;

/// Polling coordinator for one inverter.
///
/// Owns the device client, the latest snapshots and the listener registry.
/// Dropping the coordinator stops its schedules.
pub struct Coordinator<C: DeviceApi> {
    shared: Arc<Shared<C>>,
    schedule: Mutex<Option<Schedule>>,
    initialized: OnceCell<()>,
}

impl<C: DeviceApi> Coordinator<C> {
    /// Creates a coordinator. Nothing is fetched until
    /// [`fetch_initial`](Self::fetch_initial) or [`start`](Self::start).
    #[must_use]
    pub fn new(client: C, config: CoordinatorConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(client, config)),
            schedule: Mutex::new(None),
            initialized: OnceCell::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.shared.config
    }

    /// Returns a read-only handle on the published state.
    ///
    /// The handle does not keep the coordinator alive, so it can be captured
    /// by listeners.
    #[must_use]
    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle {
            store: Arc::clone(&self.shared.store),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Performs the one-time startup fetch.
    ///
    /// Fetches device info, then alarms, then output. A failure in one step
    /// is logged and does not prevent the next. The output result is
    /// recorded as the previous refresh for the first scheduled tick.
    /// Listeners are not notified.
    ///
    /// Only the first call fetches; later calls return immediately, and
    /// concurrent callers wait for the first to finish.
    pub async fn fetch_initial(&self) {
        self.initialized
            .get_or_init(|| async {
                let token = CancellationToken::new();
                tracing::debug!(device = self.shared.config.name(), "Fetching initial data");
                refresh::fetch_device_info(&self.shared, &token).await;
                refresh::fetch_alarms(&self.shared, &token).await;
                refresh::refresh_output(&self.shared, &token, false).await;
            })
            .await;
    }

    /// Starts polling with the given intervals.
    ///
    /// Runs [`fetch_initial`](Self::fetch_initial) if it has not run yet, then
    /// arms both schedules. The first output tick happens one fast interval
    /// after this returns. If already running, this behaves like
    /// [`reconfigure`](Self::reconfigure).
    pub async fn start(&self, intervals: PollIntervals) {
        self.fetch_initial().await;
        self.arm(intervals);
    }

    /// Starts polling with the intervals from the configuration.
    pub async fn start_default(&self) {
        self.start(self.shared.config.intervals()).await;
    }

    /// Replaces the running schedules with ones using new intervals.
    ///
    /// The previous schedules are cancelled before the new ones are armed.
    /// No initial fetch is performed.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn reconfigure(&self, intervals: PollIntervals) {
        self.arm(intervals);
    }

    /// Stops both schedules.
    ///
    /// Once this returns, no timer fires again and no refresh started under
    /// the stopped schedules changes the published state. A notification
    /// that was already being delivered may still finish. Calling it when
    /// not running is a no-op.
    pub fn stop(&self) {
        let Some(schedule) = self.schedule.lock().take() else {
            return;
        };
        schedule.cancel();
        self.shared.store.barrier();
        tracing::info!(device = self.shared.config.name(), "Coordinator stopped");
    }

    /// Returns `true` if the schedules are armed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.schedule.lock().is_some()
    }

    /// Returns the intervals of the running schedules.
    #[must_use]
    pub fn intervals(&self) -> Option<PollIntervals> {
        self.schedule.lock().as_ref().map(Schedule::intervals)
    }

    fn arm(&self, intervals: PollIntervals) {
        let mut slot = self.schedule.lock();
        let restarted = if let Some(previous) = slot.take() {
            previous.cancel();
            self.shared.store.barrier();
            true
        } else {
            false
        };

        let token = CancellationToken::new();
        let mut schedule = Schedule::new(intervals, token.clone());

        let shared = Arc::clone(&self.shared);
        let output_token = token.clone();
        schedule.push(scheduler::spawn_repeating(
            "output",
            intervals.fast(),
            token.clone(),
            move || {
                let shared = Arc::clone(&shared);
                let token = output_token.clone();
                async move {
                    refresh::refresh_output(&shared, &token, true).await;
                }
            },
        ));

        let shared = Arc::clone(&self.shared);
        let slow_token = token.clone();
        schedule.push(scheduler::spawn_repeating(
            "alarm",
            intervals.slow(),
            token,
            move || {
                let shared = Arc::clone(&shared);
                let token = slow_token.clone();
                async move {
                    refresh::refresh_slow(&shared, &token, true).await;
                }
            },
        ));

        *slot = Some(schedule);

        tracing::info!(
            device = self.shared.config.name(),
            fast_secs = intervals.fast().as_secs(),
            slow_secs = intervals.slow().as_secs(),
            restarted,
            "Coordinator polling armed"
        );
    }

    /// Token for on-demand refreshes: the running generation's, so that
    /// `stop()` discards their result too.
    fn current_token(&self) -> CancellationToken {
        self.schedule
            .lock()
            .as_ref()
            .map_or_else(CancellationToken::new, |s| s.token().clone())
    }

    // =========================================================================
    // On-demand refresh
    // =========================================================================

    /// Refreshes output now, through the same single-flight controller as the
    /// fast schedule.
    ///
    /// Returns `false` if an output refresh was already in flight (the call
    /// is coalesced into it) or the coordinator was stopped meanwhile.
    pub async fn refresh_output(&self) -> bool {
        let token = self.current_token();
        refresh::refresh_output(&self.shared, &token, true).await
    }

    /// Refreshes alarms and device info now, then notifies listeners.
    ///
    /// Returns `false` if a slow refresh was already in flight or the
    /// coordinator was stopped meanwhile.
    pub async fn refresh_alarms_and_device_info(&self) -> bool {
        let token = self.current_token();
        refresh::refresh_slow(&self.shared, &token, true).await
    }

    // =========================================================================
    // Published state
    // =========================================================================

    /// Returns the latest output snapshot.
    #[must_use]
    pub fn current_output(&self) -> Option<Arc<OutputSnapshot>> {
        self.shared.store.output()
    }

    /// Returns the latest alarm snapshot.
    #[must_use]
    pub fn current_alarms(&self) -> Option<Arc<AlarmSnapshot>> {
        self.shared.store.alarms()
    }

    /// Returns the latest device-info snapshot.
    #[must_use]
    pub fn current_device_info(&self) -> Option<Arc<DeviceInfoSnapshot>> {
        self.shared.store.device_info()
    }

    /// Returns whether the most recent output refresh succeeded.
    ///
    /// `true` before any refresh has run.
    #[must_use]
    pub fn last_refresh_succeeded(&self) -> bool {
        self.shared.store.last_refresh_succeeded()
    }

    /// Returns the error of the most recent output refresh, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<Arc<Error>> {
        self.shared.store.last_error()
    }

    /// Returns when an output refresh last succeeded.
    #[must_use]
    pub fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.shared.store.last_success_at()
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Registers a listener called after qualifying refreshes.
    ///
    /// Listeners run synchronously on the refreshing task and should return
    /// quickly.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.listeners.subscribe(listener)
    }

    /// Removes a listener. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.listeners.unsubscribe(id)
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Reads the on-grid power setting from the device.
    ///
    /// # Errors
    ///
    /// Returns the device client's error.
    pub async fn power_limit(&self) -> Result<PowerLimit> {
        self.shared.client.fetch_power_limit().await
    }

    /// Writes the on-grid power setting.
    ///
    /// Values outside `[-1200, 1200]` W are clamped. Returns `true` if the
    /// device acknowledged the write; failures are logged and reported as
    /// `false`.
    pub async fn set_power(&self, watts: i32) -> bool {
        let name = self.shared.config.name();
        let limit = PowerLimit::clamped(watts);
        if limit.watts() != watts {
            tracing::warn!(
                device = name,
                requested = watts,
                applied = limit.watts(),
                "Power setting out of range, clamping"
            );
        }

        match self.shared.client.set_power(limit).await {
            Ok(true) => {
                tracing::debug!(device = name, %limit, "Power setting applied");
                true
            }
            Ok(false) => {
                tracing::warn!(device = name, %limit, "Device rejected power setting");
                false
            }
            Err(e) => {
                tracing::warn!(device = name, %limit, error = %e, "Failed to set power");
                false
            }
        }
    }
}

impl<C: DeviceApi> Drop for Coordinator<C> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<C: DeviceApi> std::fmt::Debug for Coordinator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.shared.config.name())
            .field("running", &self.is_running())
            .field("last_refresh_succeeded", &self.last_refresh_succeeded())
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

/// Read-only view of a coordinator's published state.
///
/// Cheap to clone. Keeps the state readable after the coordinator is
/// dropped, but nothing updates it any more.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    store: Arc<SnapshotStore>,
}

impl CoordinatorHandle {
    /// Returns the latest output snapshot.
    #[must_use]
    pub fn current_output(&self) -> Option<Arc<OutputSnapshot>> {
        self.store.output()
    }

    /// Returns the latest alarm snapshot.
    #[must_use]
    pub fn current_alarms(&self) -> Option<Arc<AlarmSnapshot>> {
        self.store.alarms()
    }

    /// Returns the latest device-info snapshot.
    #[must_use]
    pub fn current_device_info(&self) -> Option<Arc<DeviceInfoSnapshot>> {
        self.store.device_info()
    }

    /// Returns whether the most recent output refresh succeeded.
    #[must_use]
    pub fn last_refresh_succeeded(&self) -> bool {
        self.store.last_refresh_succeeded()
    }

    /// Returns the error of the most recent output refresh, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<Arc<Error>> {
        self.store.last_error()
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Refresh cycles for both cadences.
//!
//! Errors from the device never leave this module: they are recorded in the
//! snapshot store and logged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::protocol::DeviceApi;
use crate::subscription::ListenerRegistry;

use super::config::CoordinatorConfig;
use super::store::{OutputTransition, SnapshotStore};

/// State shared by the coordinator and the tasks it spawns.
pub(crate) struct Shared<C> {
    pub(crate) client: C,
    pub(crate) config: CoordinatorConfig,
    pub(crate) store: Arc<SnapshotStore>,
    pub(crate) listeners: ListenerRegistry,
    output_in_flight: AtomicBool,
    slow_in_flight: AtomicBool,
}

impl<C: DeviceApi> Shared<C> {
    pub(crate) fn new(client: C, config: CoordinatorConfig) -> Self {
        Self {
            client,
            config,
            store: Arc::new(SnapshotStore::new()),
            listeners: ListenerRegistry::new(),
            output_in_flight: AtomicBool::new(false),
            slow_in_flight: AtomicBool::new(false),
        }
    }

    fn name(&self) -> &str {
        self.config.name()
    }
}

/// Claim on a single-flight slot, released on drop.
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    /// Claims the slot, or returns `None` if it is already taken.
    pub(crate) fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Decides whether a committed output refresh notifies listeners.
///
/// Two failures in a row stay silent. Otherwise listeners are notified when
/// `always_notify` is set, when the outcome flipped, or when the snapshot
/// changed.
pub(crate) fn should_notify(transition: &OutputTransition, always_notify: bool) -> bool {
    if !transition.succeeded && !transition.previous_succeeded {
        return false;
    }
    always_notify || transition.succeeded != transition.previous_succeeded || transition.changed
}

/// Runs one output refresh.
///
/// Returns `true` if a fetch ran and its result was committed, `false` if
/// another output refresh was in flight or `token` was cancelled.
pub(crate) async fn refresh_output<C: DeviceApi>(
    shared: &Shared<C>,
    token: &CancellationToken,
    notify: bool,
) -> bool {
    let Some(_guard) = InFlight::try_acquire(&shared.output_in_flight) else {
        tracing::trace!(device = shared.name(), "Output refresh already in flight, skipping");
        return false;
    };
    if token.is_cancelled() {
        return false;
    }

    let started = Instant::now();
    let result = shared.client.fetch_output().await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let Some(transition) = shared.store.commit_output(result, token) else {
        tracing::debug!(
            device = shared.name(),
            elapsed_ms,
            "Coordinator stopped, discarding output refresh"
        );
        return false;
    };

    log_output_transition(shared.name(), &transition, elapsed_ms);

    if notify && should_notify(&transition, shared.config.always_notify()) && !token.is_cancelled()
    {
        shared.listeners.notify();
    }
    true
}

fn log_output_transition(name: &str, transition: &OutputTransition, elapsed_ms: u64) {
    match transition.error.as_deref() {
        None if transition.recovered() => {
            tracing::info!(device = name, elapsed_ms, "Device recovered");
        }
        None => {
            tracing::debug!(
                device = name,
                elapsed_ms,
                changed = transition.changed,
                "Fetched output data"
            );
        }
        Some(e) if e.is_connectivity() => {
            if transition.became_unavailable() {
                tracing::warn!(device = name, error = %e, "Device unavailable");
            } else {
                tracing::debug!(device = name, error = %e, "Device still unavailable");
            }
        }
        Some(e) => {
            tracing::error!(device = name, error = ?e, "Unexpected error fetching output data");
        }
    }
}

/// Runs one alarm and device-info refresh.
///
/// Both fetches are attempted regardless of the other's outcome, and
/// listeners are notified afterwards either way. Alarms are not fetched once
/// `token` is cancelled. Returns `false` if another
/// slow refresh was in flight or `token` was cancelled.
pub(crate) async fn refresh_slow<C: DeviceApi>(
    shared: &Shared<C>,
    token: &CancellationToken,
    notify: bool,
) -> bool {
    let Some(_guard) = InFlight::try_acquire(&shared.slow_in_flight) else {
        tracing::trace!(device = shared.name(), "Slow refresh already in flight, skipping");
        return false;
    };
    if token.is_cancelled() {
        return false;
    }

    if !fetch_device_info(shared, token).await || !fetch_alarms(shared, token).await {
        tracing::debug!(device = shared.name(), "Coordinator stopped, discarding slow refresh");
        return false;
    }

    if notify {
        shared.listeners.notify();
    }
    true
}

/// Fetches and stores device info. Returns `false` only if the result was
/// discarded because `token` was cancelled.
pub(crate) async fn fetch_device_info<C: DeviceApi>(
    shared: &Shared<C>,
    token: &CancellationToken,
) -> bool {
    match shared.client.fetch_device_info().await {
        Ok(info) => shared.store.commit_device_info(info, token),
        Err(e) => {
            tracing::warn!(device = shared.name(), error = %e, "Failed to fetch device info");
            !token.is_cancelled()
        }
    }
}

/// Fetches and stores alarms. Returns `false` only if the result was
/// discarded because `token` was cancelled.
pub(crate) async fn fetch_alarms<C: DeviceApi>(
    shared: &Shared<C>,
    token: &CancellationToken,
) -> bool {
    match shared.client.fetch_alarms().await {
        Ok(alarms) => {
            if alarms.any_active() {
                tracing::debug!(device = shared.name(), active = ?alarms.active(), "Alarms active");
            }
            shared.store.commit_alarms(alarms, token)
        }
        Err(e) => {
            tracing::warn!(device = shared.name(), error = %e, "Failed to fetch alarms");
            !token.is_cancelled()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(previous_succeeded: bool, succeeded: bool, changed: bool) -> OutputTransition {
        OutputTransition {
            previous_succeeded,
            succeeded,
            changed,
            error: None,
        }
    }

    #[test]
    fn repeated_failure_is_silent() {
        assert!(!should_notify(&transition(false, false, false), true));
        assert!(!should_notify(&transition(false, false, false), false));
    }

    #[test]
    fn always_notify_covers_unchanged_success() {
        assert!(should_notify(&transition(true, true, false), true));
        assert!(!should_notify(&transition(true, true, false), false));
    }

    #[test]
    fn flip_notifies() {
        assert!(should_notify(&transition(true, false, false), false));
        assert!(should_notify(&transition(false, true, false), false));
    }

    #[test]
    fn change_notifies() {
        assert!(should_notify(&transition(true, true, true), false));
    }

    #[test]
    fn in_flight_guard_is_exclusive() {
        let flag = AtomicBool::new(false);

        let guard = InFlight::try_acquire(&flag).unwrap();
        assert!(InFlight::try_acquire(&flag).is_none());

        drop(guard);
        assert!(InFlight::try_acquire(&flag).is_some());
    }
}

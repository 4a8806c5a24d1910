// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator scheduling and notification tests against a scripted device.
//!
//! Every test runs with tokio's clock paused, so timer ticks and device
//! delays advance deterministically.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use ezhi_lib::protocol::DeviceApi;
use ezhi_lib::types::PowerLimit;
use ezhi_lib::{
    AlarmSnapshot, ConnectivityError, Coordinator, CoordinatorConfig, DeviceInfoSnapshot, Error,
    OutputSnapshot, PollIntervals, ProtocolError,
};
use parking_lot::Mutex;
use tokio::time::sleep;

// ============================================================================
// Scripted device
// ============================================================================

/// Device whose responses are queued by the test.
///
/// An empty output queue answers with a timeout; empty alarm and device-info
/// queues answer with an empty snapshot.
#[derive(Default)]
struct FakeDevice {
    outputs: Mutex<VecDeque<Result<OutputSnapshot, Error>>>,
    alarms: Mutex<VecDeque<Result<AlarmSnapshot, Error>>>,
    device_infos: Mutex<VecDeque<Result<DeviceInfoSnapshot, Error>>>,
    output_delay: Mutex<Duration>,
    output_calls: AtomicU32,
    outputs_in_flight: AtomicU32,
    max_outputs_in_flight: AtomicU32,
    device_info_delay: Mutex<Duration>,
    device_info_calls: AtomicU32,
    device_infos_in_flight: AtomicU32,
    max_device_infos_in_flight: AtomicU32,
    alarm_calls: AtomicU32,
    set_power_values: Mutex<Vec<i32>>,
    set_power_error: Mutex<Option<Error>>,
}

impl FakeDevice {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push_output(&self, result: Result<OutputSnapshot, Error>) {
        self.outputs.lock().push_back(result);
    }

    fn push_alarms(&self, result: Result<AlarmSnapshot, Error>) {
        self.alarms.lock().push_back(result);
    }

    fn push_device_info(&self, result: Result<DeviceInfoSnapshot, Error>) {
        self.device_infos.lock().push_back(result);
    }

    fn set_output_delay(&self, delay: Duration) {
        *self.output_delay.lock() = delay;
    }

    fn set_device_info_delay(&self, delay: Duration) {
        *self.device_info_delay.lock() = delay;
    }

    fn output_calls(&self) -> u32 {
        self.output_calls.load(Ordering::SeqCst)
    }

    fn device_info_calls(&self) -> u32 {
        self.device_info_calls.load(Ordering::SeqCst)
    }

    fn alarm_calls(&self) -> u32 {
        self.alarm_calls.load(Ordering::SeqCst)
    }
}

impl DeviceApi for FakeDevice {
    async fn fetch_output(&self) -> Result<OutputSnapshot, Error> {
        self.output_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.outputs_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_outputs_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.output_delay.lock();
        if !delay.is_zero() {
            sleep(delay).await;
        }

        self.outputs_in_flight.fetch_sub(1, Ordering::SeqCst);
        let next = self.outputs.lock().pop_front();
        next.unwrap_or_else(|| Err(timeout()))
    }

    async fn fetch_alarms(&self) -> Result<AlarmSnapshot, Error> {
        self.alarm_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.alarms.lock().pop_front();
        next.unwrap_or_else(|| Ok(AlarmSnapshot::default()))
    }

    async fn fetch_device_info(&self) -> Result<DeviceInfoSnapshot, Error> {
        self.device_info_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.device_infos_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_device_infos_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.device_info_delay.lock();
        if !delay.is_zero() {
            sleep(delay).await;
        }

        self.device_infos_in_flight.fetch_sub(1, Ordering::SeqCst);
        let next = self.device_infos.lock().pop_front();
        next.unwrap_or_else(|| Ok(DeviceInfoSnapshot::default()))
    }

    async fn fetch_power_limit(&self) -> Result<PowerLimit, Error> {
        let last = self.set_power_values.lock().last().copied().unwrap_or(0);
        Ok(PowerLimit::clamped(last))
    }

    async fn set_power(&self, limit: PowerLimit) -> Result<bool, Error> {
        self.set_power_values.lock().push(limit.watts());
        match self.set_power_error.lock().take() {
            Some(e) => Err(e),
            None => Ok(true),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

type TestCoordinator = Coordinator<Arc<FakeDevice>>;

fn timeout() -> Error {
    ConnectivityError::Timeout(8000).into()
}

fn output(pv_power: f64) -> OutputSnapshot {
    OutputSnapshot {
        pv_power,
        ..OutputSnapshot::default()
    }
}

fn coordinator(device: &Arc<FakeDevice>) -> TestCoordinator {
    Coordinator::new(Arc::clone(device), CoordinatorConfig::default().with_name("test"))
}

fn intervals(fast: u64, slow: u64) -> PollIntervals {
    PollIntervals::new(fast, slow).unwrap()
}

fn count_notifications(coordinator: &TestCoordinator) -> Arc<AtomicU32> {
    let count = Arc::new(AtomicU32::new(0));
    let count_clone = Arc::clone(&count);
    coordinator.subscribe(move || {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });
    count
}

fn pv_power(coordinator: &TestCoordinator) -> Option<f64> {
    coordinator.current_output().map(|o| o.pv_power)
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

mod scenarios {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn two_successful_ticks_notify_twice() {
        let device = FakeDevice::new();
        device.push_output(Ok(output(50.0)));
        device.push_output(Ok(output(100.0)));
        device.push_output(Ok(output(150.0)));

        let coordinator = coordinator(&device);
        let handle = coordinator.handle();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        coordinator.subscribe(move || {
            if let Some(output) = handle.current_output() {
                seen_clone.lock().push(output.pv_power);
            }
        });

        coordinator.start(intervals(5, 3600)).await;
        assert_eq!(pv_power(&coordinator), Some(50.0));
        assert!(seen.lock().is_empty());

        sleep(Duration::from_millis(10_100)).await;

        assert_eq!(*seen.lock(), vec![100.0, 150.0]);
        assert_eq!(pv_power(&coordinator), Some(150.0));
    }

    #[tokio::test(start_paused = true)]
    async fn startup_tolerates_partial_failure() {
        let device = FakeDevice::new();
        device.push_device_info(Err(timeout()));
        device.push_alarms(Err(ProtocolError::MissingField("data".to_string()).into()));
        device.push_output(Ok(output(100.0)));

        let coordinator = coordinator(&device);
        coordinator.start(intervals(3600, 60)).await;

        assert!(coordinator.current_device_info().is_none());
        assert!(coordinator.current_alarms().is_none());
        assert_eq!(pv_power(&coordinator), Some(100.0));
        assert!(coordinator.last_refresh_succeeded());
        assert!(coordinator.is_running());

        let notifications = count_notifications(&coordinator);
        sleep(Duration::from_millis(60_100)).await;

        assert!(coordinator.current_device_info().is_some());
        assert!(coordinator.current_alarms().is_some());
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_then_recovery_notifies_once() {
        let device = FakeDevice::new();
        device.push_output(Err(timeout()));
        device.push_output(Err(timeout()));
        device.push_output(Ok(output(120.0)));

        let coordinator = coordinator(&device);
        let notifications = count_notifications(&coordinator);
        coordinator.start(intervals(5, 3600)).await;
        assert!(!coordinator.last_refresh_succeeded());

        sleep(Duration::from_millis(5_100)).await;
        assert!(!coordinator.last_refresh_succeeded());
        assert_eq!(notifications.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(5)).await;
        assert!(coordinator.last_refresh_succeeded());
        assert!(coordinator.last_error().is_none());
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
        assert_eq!(pv_power(&coordinator), Some(120.0));
    }

    #[tokio::test(start_paused = true)]
    async fn set_power_clamps_to_range() {
        let device = FakeDevice::new();
        let coordinator = coordinator(&device);

        assert!(coordinator.set_power(5000).await);
        assert!(coordinator.set_power(-5000).await);
        assert!(coordinator.set_power(300).await);

        assert_eq!(*device.set_power_values.lock(), vec![1200, -1200, 300]);
    }
}

// ============================================================================
// Refresh controller properties
// ============================================================================

mod refresh_controller {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn overrunning_fetch_coalesces_ticks() {
        let device = FakeDevice::new();
        device.set_output_delay(Duration::from_secs(12));

        let coordinator = coordinator(&device);
        coordinator.start(intervals(5, 3600)).await;
        assert_eq!(device.output_calls(), 1);

        // Ticks 5, 10, 15, 20 and 25 s after start; only 5 and 20 find the
        // controller idle.
        sleep(Duration::from_secs(29)).await;

        assert_eq!(device.output_calls(), 3);
        assert_eq!(device.max_outputs_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_manual_refresh_is_coalesced() {
        let device = FakeDevice::new();
        device.set_output_delay(Duration::from_secs(2));
        device.push_output(Ok(output(10.0)));

        let coordinator = coordinator(&device);
        let (first, second) = tokio::join!(coordinator.refresh_output(), coordinator.refresh_output());

        assert!(first);
        assert!(!second);
        assert_eq!(device.output_calls(), 1);
        assert_eq!(pv_power(&coordinator), Some(10.0));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_previous_snapshot() {
        let device = FakeDevice::new();
        device.push_output(Ok(output(100.0)));
        device.push_output(Err(timeout()));

        let coordinator = coordinator(&device);
        coordinator.fetch_initial().await;
        let before = coordinator.last_success_at();

        assert!(coordinator.refresh_output().await);

        assert!(!coordinator.last_refresh_succeeded());
        assert_eq!(pv_power(&coordinator), Some(100.0));
        assert!(coordinator.last_error().unwrap().is_connectivity());
        assert_eq!(coordinator.last_success_at(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_failures_notify_only_on_transitions() {
        let device = FakeDevice::new();
        device.push_output(Ok(output(1.0)));
        device.push_output(Err(timeout()));
        device.push_output(Err(timeout()));
        device.push_output(Err(ProtocolError::MissingField("data".to_string()).into()));
        device.push_output(Ok(output(2.0)));

        let coordinator = coordinator(&device);
        let notifications = count_notifications(&coordinator);
        coordinator.fetch_initial().await;

        coordinator.refresh_output().await;
        assert_eq!(notifications.load(Ordering::SeqCst), 1);

        coordinator.refresh_output().await;
        coordinator.refresh_output().await;
        assert_eq!(notifications.load(Ordering::SeqCst), 1);

        coordinator.refresh_output().await;
        assert_eq!(notifications.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_data_is_silent_without_always_notify() {
        let device = FakeDevice::new();
        device.push_output(Ok(output(100.0)));
        device.push_output(Ok(output(100.0)));
        device.push_output(Ok(output(200.0)));

        let coordinator = Coordinator::new(
            Arc::clone(&device),
            CoordinatorConfig::default().with_always_notify(false),
        );
        let notifications = count_notifications(&coordinator);
        coordinator.fetch_initial().await;

        coordinator.refresh_output().await;
        assert_eq!(notifications.load(Ordering::SeqCst), 0);

        coordinator.refresh_output().await;
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn listeners_observe_whole_snapshots() {
        let device = FakeDevice::new();
        for i in 1..=5 {
            let value = f64::from(i);
            device.push_output(Ok(OutputSnapshot {
                pv_power: value,
                battery_power: value,
                on_grid_power: value,
                ..OutputSnapshot::default()
            }));
        }

        let coordinator = coordinator(&device);
        let handle = coordinator.handle();
        let torn = Arc::new(AtomicU32::new(0));
        let torn_clone = Arc::clone(&torn);
        coordinator.subscribe(move || {
            if let Some(o) = handle.current_output()
                && (o.pv_power != o.battery_power || o.pv_power != o.on_grid_power)
            {
                torn_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        coordinator.start(intervals(1, 3600)).await;
        sleep(Duration::from_millis(4_100)).await;

        assert_eq!(pv_power(&coordinator), Some(5.0));
        assert_eq!(torn.load(Ordering::SeqCst), 0);
    }
}

// ============================================================================
// Slow cadence
// ============================================================================

mod slow_cadence {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn notifies_even_when_both_fetches_fail() {
        let device = FakeDevice::new();
        device.push_device_info(Ok(DeviceInfoSnapshot {
            device_id: Some("E17010000123".to_string()),
            ..DeviceInfoSnapshot::default()
        }));
        device.push_alarms(Ok(AlarmSnapshot::default()));
        device.push_device_info(Err(timeout()));
        device.push_alarms(Err(timeout()));
        device.push_output(Ok(output(1.0)));

        let coordinator = coordinator(&device);
        let notifications = count_notifications(&coordinator);
        coordinator.start(intervals(3600, 60)).await;

        sleep(Duration::from_millis(60_100)).await;

        assert_eq!(notifications.load(Ordering::SeqCst), 1);
        assert_eq!(
            coordinator.current_device_info().unwrap().device_id.as_deref(),
            Some("E17010000123")
        );
        assert!(coordinator.current_alarms().is_some());
        assert!(coordinator.last_refresh_succeeded());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_updates_and_notifies() {
        let device = FakeDevice::new();
        device.push_alarms(Ok(AlarmSnapshot {
            battery_over_temperature: true,
            ..AlarmSnapshot::default()
        }));

        let coordinator = coordinator(&device);
        let notifications = count_notifications(&coordinator);

        assert!(coordinator.refresh_alarms_and_device_info().await);

        assert!(coordinator.current_alarms().unwrap().any_active());
        assert!(coordinator.current_device_info().is_some());
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overrunning_slow_fetch_does_not_delay_output() {
        let device = FakeDevice::new();
        let coordinator = coordinator(&device);
        coordinator.start(intervals(5, 10)).await;
        device.set_device_info_delay(Duration::from_secs(25));

        sleep(Duration::from_millis(60_100)).await;

        // Startup plus one fetch per fast tick at 5, 10, ..., 60 s
        assert_eq!(device.output_calls(), 13);
        // Startup plus the slow ticks at 10 and 40 s; the rest were skipped
        assert_eq!(device.device_info_calls(), 3);
        assert_eq!(device.max_device_infos_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_device_info_skips_alarms() {
        let device = FakeDevice::new();
        device.push_device_info(Ok(DeviceInfoSnapshot {
            device_id: Some("E17010000123".to_string()),
            ..DeviceInfoSnapshot::default()
        }));
        device.push_device_info(Ok(DeviceInfoSnapshot {
            device_id: Some("E17010000999".to_string()),
            ..DeviceInfoSnapshot::default()
        }));

        let coordinator = coordinator(&device);
        let notifications = count_notifications(&coordinator);
        coordinator.start(intervals(3600, 10)).await;
        device.set_device_info_delay(Duration::from_secs(5));
        assert_eq!(device.alarm_calls(), 1);

        // The slow tick at 10 s is waiting on device info
        sleep(Duration::from_secs(12)).await;
        assert_eq!(device.device_info_calls(), 2);

        coordinator.stop();
        sleep(Duration::from_secs(10)).await;

        assert_eq!(device.alarm_calls(), 1);
        assert_eq!(
            coordinator.current_device_info().unwrap().device_id.as_deref(),
            Some("E17010000123")
        );
        assert_eq!(notifications.load(Ordering::SeqCst), 0);
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let device = FakeDevice::new();
        let coordinator = coordinator(&device);

        coordinator.stop();
        assert!(!coordinator.is_running());

        coordinator.start(intervals(5, 60)).await;
        assert!(coordinator.is_running());

        coordinator.stop();
        coordinator.stop();
        assert!(!coordinator.is_running());
        assert!(coordinator.intervals().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_polling() {
        let device = FakeDevice::new();
        let coordinator = coordinator(&device);
        let notifications = count_notifications(&coordinator);

        coordinator.start(intervals(5, 60)).await;
        sleep(Duration::from_millis(5_100)).await;
        let calls = device.output_calls();
        let notified = notifications.load(Ordering::SeqCst);

        coordinator.stop();
        sleep(Duration::from_secs(300)).await;

        assert_eq!(device.output_calls(), calls);
        assert_eq!(notifications.load(Ordering::SeqCst), notified);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_in_flight_result() {
        let device = FakeDevice::new();
        device.set_output_delay(Duration::from_secs(3));
        device.push_output(Ok(output(1.0)));
        device.push_output(Ok(output(999.0)));

        let coordinator = coordinator(&device);
        let notifications = count_notifications(&coordinator);
        coordinator.start(intervals(5, 3600)).await;

        // The first tick's fetch is still running
        sleep(Duration::from_secs(6)).await;
        assert_eq!(device.output_calls(), 2);

        coordinator.stop();
        sleep(Duration::from_secs(10)).await;

        assert_eq!(pv_power(&coordinator), Some(1.0));
        assert_eq!(notifications.load(Ordering::SeqCst), 0);
        assert!(coordinator.last_refresh_succeeded());
    }

    #[tokio::test(start_paused = true)]
    async fn reconfigure_replaces_schedule() {
        let device = FakeDevice::new();
        let coordinator = coordinator(&device);

        coordinator.start(intervals(5, 3600)).await;
        coordinator.reconfigure(intervals(20, 3600));
        assert_eq!(coordinator.intervals(), Some(intervals(20, 3600)));

        sleep(Duration::from_millis(19_900)).await;
        assert_eq!(device.output_calls(), 1);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(device.output_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_fetches_initial_once() {
        let device = FakeDevice::new();
        let coordinator = coordinator(&device);

        coordinator.start(intervals(5, 3600)).await;
        coordinator.start(intervals(10, 3600)).await;
        coordinator.fetch_initial().await;

        assert_eq!(device.output_calls(), 1);
        assert_eq!(coordinator.intervals(), Some(intervals(10, 3600)));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_polling() {
        let device = FakeDevice::new();
        let coordinator = coordinator(&device);
        let handle = coordinator.handle();

        coordinator.start(intervals(5, 60)).await;
        drop(coordinator);
        sleep(Duration::from_secs(300)).await;

        assert_eq!(device.output_calls(), 1);
        assert!(!handle.last_refresh_succeeded());
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribed_listener_is_not_called() {
        let device = FakeDevice::new();
        device.push_output(Ok(output(1.0)));
        device.push_output(Ok(output(2.0)));

        let coordinator = coordinator(&device);
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = Arc::clone(&count);
        let id = coordinator.subscribe(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        coordinator.refresh_output().await;
        assert!(coordinator.unsubscribe(id));
        coordinator.refresh_output().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.listener_count(), 0);
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test]
    async fn set_power_failure_returns_false() {
        let device = FakeDevice::new();
        *device.set_power_error.lock() = Some(timeout());

        let coordinator = coordinator(&device);
        assert!(!coordinator.set_power(600).await);
        assert_eq!(*device.set_power_values.lock(), vec![600]);
    }

    #[tokio::test]
    async fn power_limit_reads_device() {
        let device = FakeDevice::new();
        let coordinator = coordinator(&device);

        coordinator.set_power(-750).await;
        assert_eq!(coordinator.power_limit().await.unwrap().watts(), -750);
    }
}

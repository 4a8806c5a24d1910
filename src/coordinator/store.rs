// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshot storage shared between the coordinator, its tasks and readers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::response::{AlarmSnapshot, DeviceInfoSnapshot, OutputSnapshot};

#[derive(Debug)]
struct StoreState {
    output: Option<Arc<OutputSnapshot>>,
    alarms: Option<Arc<AlarmSnapshot>>,
    device_info: Option<Arc<DeviceInfoSnapshot>>,
    last_refresh_succeeded: bool,
    last_error: Option<Arc<Error>>,
    last_success_at: Option<DateTime<Utc>>,
}

/// Outcome of committing one output fetch.
#[derive(Debug, Clone)]
pub(crate) struct OutputTransition {
    pub(crate) previous_succeeded: bool,
    pub(crate) succeeded: bool,
    /// The stored snapshot differs from the one it replaced.
    pub(crate) changed: bool,
    pub(crate) error: Option<Arc<Error>>,
}

impl OutputTransition {
    pub(crate) fn recovered(&self) -> bool {
        self.succeeded && !self.previous_succeeded
    }

    pub(crate) fn became_unavailable(&self) -> bool {
        !self.succeeded && self.previous_succeeded
    }
}

/// Latest published snapshots plus refresh bookkeeping.
///
/// Every snapshot is replaced wholesale under the write lock, so readers never
/// see fields from two different fetches. Commits carry the cancellation token
/// of the task that produced them and are dropped once it is cancelled.
#[derive(Debug)]
pub(crate) struct SnapshotStore {
    state: RwLock<StoreState>,
}

impl SnapshotStore {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                output: None,
                alarms: None,
                device_info: None,
                last_refresh_succeeded: true,
                last_error: None,
                last_success_at: None,
            }),
        }
    }

    pub(crate) fn output(&self) -> Option<Arc<OutputSnapshot>> {
        self.state.read().output.clone()
    }

    pub(crate) fn alarms(&self) -> Option<Arc<AlarmSnapshot>> {
        self.state.read().alarms.clone()
    }

    pub(crate) fn device_info(&self) -> Option<Arc<DeviceInfoSnapshot>> {
        self.state.read().device_info.clone()
    }

    pub(crate) fn last_refresh_succeeded(&self) -> bool {
        self.state.read().last_refresh_succeeded
    }

    pub(crate) fn last_error(&self) -> Option<Arc<Error>> {
        self.state.read().last_error.clone()
    }

    pub(crate) fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().last_success_at
    }

    /// Records the result of an output fetch.
    ///
    /// Returns `None` without touching state if `token` is cancelled.
    pub(crate) fn commit_output(
        &self,
        result: Result<OutputSnapshot, Error>,
        token: &CancellationToken,
    ) -> Option<OutputTransition> {
        let mut state = self.state.write();
        if token.is_cancelled() {
            return None;
        }

        let previous_succeeded = state.last_refresh_succeeded;
        match result {
            Ok(snapshot) => {
                let changed = state.output.as_deref() != Some(&snapshot);
                state.output = Some(Arc::new(snapshot));
                state.last_refresh_succeeded = true;
                state.last_error = None;
                state.last_success_at = Some(Utc::now());
                Some(OutputTransition {
                    previous_succeeded,
                    succeeded: true,
                    changed,
                    error: None,
                })
            }
            Err(e) => {
                let error = Arc::new(e);
                state.last_refresh_succeeded = false;
                state.last_error = Some(Arc::clone(&error));
                Some(OutputTransition {
                    previous_succeeded,
                    succeeded: false,
                    changed: false,
                    error: Some(error),
                })
            }
        }
    }

    /// Stores a fetched alarm snapshot.
    ///
    /// Returns `false` if `token` is cancelled.
    pub(crate) fn commit_alarms(&self, snapshot: AlarmSnapshot, token: &CancellationToken) -> bool {
        let mut state = self.state.write();
        if token.is_cancelled() {
            return false;
        }
        state.alarms = Some(Arc::new(snapshot));
        true
    }

    /// Stores a fetched device-info snapshot.
    ///
    /// Returns `false` if `token` is cancelled.
    pub(crate) fn commit_device_info(
        &self,
        snapshot: DeviceInfoSnapshot,
        token: &CancellationToken,
    ) -> bool {
        let mut state = self.state.write();
        if token.is_cancelled() {
            return false;
        }
        state.device_info = Some(Arc::new(snapshot));
        true
    }

    /// Waits for any commit currently holding the write lock.
    ///
    /// Called after cancelling a token: once this returns, no commit made
    /// under that token can still land.
    pub(crate) fn barrier(&self) {
        drop(self.state.write());
    }
}

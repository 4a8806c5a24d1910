// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Repeating schedules driving the two cadences.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::config::PollIntervals;

/// Spawns a task that calls `tick` every `period` until `token` is cancelled.
///
/// The first call happens one `period` after spawning. Ticks are measured
/// from the previous tick, not from completion of the work, because each
/// tick's future runs on its own task.
pub(crate) fn spawn_repeating<F, Fut>(
    name: &'static str,
    period: Duration,
    token: CancellationToken,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let start = Instant::now() + period;
    tokio::spawn(async move {
        let mut interval = time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                _ = interval.tick() => {
                    if token.is_cancelled() {
                        break;
                    }
                    tokio::spawn(tick());
                }
            }
        }

        tracing::trace!(schedule = name, "Schedule stopped");
    })
}

/// One armed generation of the two schedules.
#[derive(Debug)]
pub(crate) struct Schedule {
    intervals: PollIntervals,
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Schedule {
    pub(crate) fn new(intervals: PollIntervals, token: CancellationToken) -> Self {
        Self {
            intervals,
            token,
            tasks: Vec::with_capacity(2),
        }
    }

    pub(crate) fn push(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    pub(crate) fn intervals(&self) -> PollIntervals {
        self.intervals
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels the generation and its timer tasks.
    ///
    /// Refreshes already spawned keep running until their fetch completes;
    /// they observe the cancelled token and discard the result.
    pub(crate) fn cancel(self) {
        self.token.cancel();
        for task in self.tasks {
            task.abort();
        }
    }
}

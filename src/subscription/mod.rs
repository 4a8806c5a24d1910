// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for coordinator notifications.
//!
//! Observers register a zero-argument callback and read whatever they need
//! from the coordinator when it fires:
//!
//! ```no_run
//! use ezhi_lib::{Coordinator, CoordinatorConfig};
//! use ezhi_lib::protocol::HttpClient;
//!
//! # fn example() -> ezhi_lib::Result<()> {
//! let coordinator = Coordinator::new(HttpClient::new("192.168.1.40")?, CoordinatorConfig::default());
//!
//! let handle = coordinator.handle();
//! let sub_id = coordinator.subscribe(move || {
//!     if let Some(output) = handle.current_output() {
//!         println!("PV power: {} W", output.pv_power);
//!     }
//! });
//!
//! // Later, unsubscribe
//! coordinator.unsubscribe(sub_id);
//! # Ok(())
//! # }
//! ```

mod callback;

pub use callback::{ListenerRegistry, SubscriptionId};

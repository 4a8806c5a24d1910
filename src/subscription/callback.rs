// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener management for coordinator notifications.
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`ListenerRegistry`] - Registry storing listeners and dispatching notifications

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Unique identifier for a subscription.
///
/// Returned by [`ListenerRegistry::subscribe`] and used to unsubscribe later.
/// IDs are never reused within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// A zero-argument notification callback.
type Listener = Arc<dyn Fn() + Send + Sync>;

/// Registry of listeners notified when coordinator data changes.
///
/// Listeners are invoked synchronously, in subscription order. The registry
/// lock is released before any listener runs, so a listener may subscribe,
/// unsubscribe or read coordinator state without deadlocking. A listener
/// removed while a notification is in progress may still receive that
/// notification.
pub struct ListenerRegistry {
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
    listeners: RwLock<BTreeMap<SubscriptionId, Listener>>,
}

impl ListenerRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(BTreeMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a listener.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.listeners.write().insert(id, Arc::new(listener));
        id
    }

    /// Unregisters a listener by its subscription ID.
    ///
    /// Returns `true` if a listener was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.write().remove(&id).is_some()
    }

    /// Calls every registered listener.
    ///
    /// Returns the number of listeners notified.
    pub fn notify(&self) -> usize {
        let listeners: Vec<Listener> = self.listeners.read().values().cloned().collect();
        for listener in &listeners {
            listener();
        }
        listeners.len()
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns `true` if there are no registered listeners.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listener_count", &self.len())
            .finish()
    }
}

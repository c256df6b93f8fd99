// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The resource accounting store.
//!
//! The [`AllocationStore`] tracks free amounts per [`ResourceTag`] across
//! all devices and grants reservations atomically: a request either fits
//! in full (every tag), or it is rejected with the per-tag shortfall and
//! nothing is committed. Granted reservations are represented by
//! [`ResourceContext`]s, which return their usage on drop.
//!
//! # Thread Safety
//! `AllocationStore` is `Send + Sync`; the free map and statistics live
//! behind mutexes inside an `Arc`-shared inner state so contexts can
//! release from any thread.

use crate::stats::LedgerStats;
use crate::{DeviceSpec, LedgerError, ResourceContext, Resources, Ticket};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// Internal store state, shared between the store and the contexts it
/// mints via `Arc`.
pub(crate) struct StoreInner {
    capacity: Resources,
    free: Mutex<Resources>,
    next_ticket: AtomicU64,
    stats: Mutex<LedgerStats>,
}

impl StoreInner {
    /// Called by `ResourceContext::drop` to return a reservation.
    pub(crate) fn release_usage(&self, ticket: Ticket, usage: &Resources) {
        if let Ok(mut free) = self.free.lock() {
            free.add_assign(usage);
        }
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_release();
        }
        trace!(%ticket, %usage, "reservation released");
    }
}

/// The free/used tracker the scheduler pre-allocates against.
///
/// # Example
/// ```
/// use resource_ledger::{AllocationStore, DeviceSpec, Resources};
///
/// let store = AllocationStore::new(Resources::memory(DeviceSpec::gpu(0), 1000));
/// let ctx = store
///     .try_reserve("sess0", 1, DeviceSpec::gpu(0), &Resources::memory(DeviceSpec::gpu(0), 300))
///     .unwrap();
///
/// // Reservation is returned when the context is dropped.
/// drop(ctx);
/// assert!(store.available().covers(&Resources::memory(DeviceSpec::gpu(0), 1000)));
/// ```
pub struct AllocationStore {
    inner: Arc<StoreInner>,
}

impl AllocationStore {
    /// Creates a store with the given total capacity.
    pub fn new(capacity: Resources) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                free: Mutex::new(capacity.clone()),
                capacity,
                next_ticket: AtomicU64::new(1),
                stats: Mutex::new(LedgerStats::default()),
            }),
        }
    }

    /// Atomically reserves `usage`, minting a [`ResourceContext`].
    ///
    /// The reservation is all-or-nothing: if any tag of `usage` exceeds the
    /// free amount, nothing is committed and the error carries the per-tag
    /// shortfall. `sess_handle` and `graph_id` identify the requester for
    /// tracing only.
    pub fn try_reserve(
        &self,
        sess_handle: &str,
        graph_id: u64,
        spec: DeviceSpec,
        usage: &Resources,
    ) -> Result<ResourceContext, LedgerError> {
        let mut free = self
            .inner
            .free
            .lock()
            .expect("allocation store mutex poisoned");

        if !free.covers(usage) {
            let missing = free.missing_for(usage);
            drop(free);
            if let Ok(mut stats) = self.inner.stats.lock() {
                stats.record_reject();
            }
            debug!(
                session = sess_handle,
                graph_id,
                %spec,
                %missing,
                "reservation rejected",
            );
            return Err(LedgerError::InsufficientResources { missing });
        }

        let shortfall = free.deduct_saturating(usage);
        debug_assert!(shortfall.is_empty());
        drop(free);

        let ticket = Ticket(self.inner.next_ticket.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut stats) = self.inner.stats.lock() {
            stats.record_grant();
        }
        trace!(
            session = sess_handle,
            graph_id,
            %spec,
            %ticket,
            %usage,
            "reservation granted",
        );

        Ok(ResourceContext::new(
            ticket,
            spec,
            usage.clone(),
            Arc::clone(&self.inner),
        ))
    }

    /// A snapshot of the currently free amounts.
    pub fn available(&self) -> Resources {
        self.inner
            .free
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    /// The total capacity the store was created with.
    pub fn capacity(&self) -> &Resources {
        &self.inner.capacity
    }

    /// Capacity minus free: the amounts currently reserved.
    pub fn in_use(&self) -> Resources {
        let mut in_use = self.inner.capacity.clone();
        in_use.deduct_saturating(&self.available());
        in_use
    }

    /// Distinct devices the store accounts for.
    pub fn devices(&self) -> Vec<DeviceSpec> {
        self.inner.capacity.devices()
    }

    /// A snapshot of accounting statistics.
    pub fn stats(&self) -> LedgerStats {
        self.inner
            .stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for AllocationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocationStore")
            .field("capacity", &self.inner.capacity)
            .field("available", &self.available())
            .finish()
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! RAII reservation contexts.
//!
//! A [`ResourceContext`] is the scoped handle for one granted reservation.
//! When the context is dropped, its usage is automatically returned to the
//! [`AllocationStore`](crate::AllocationStore) that minted it. Ownership
//! moves with the context: the scheduler hands it to an operation during
//! `prepare`, the operation carries it while running, and the executor
//! drops it on completion — the reservation is released exactly once on
//! every path, enforced by the borrow checker.

use crate::store::StoreInner;
use crate::{DeviceSpec, Resources};
use std::fmt;
use std::sync::Arc;

/// A unique id representing one live resource reservation.
///
/// Tickets are minted monotonically by the store and never reused within
/// a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub(crate) u64);

impl Ticket {
    /// Wraps a raw id. Intended for executors that mint their own tickets
    /// and for tests; store-minted tickets come from `try_reserve`.
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A scoped holder of one reservation.
///
/// # Example
/// ```ignore
/// let ctx = store.try_reserve("sess0", 1, spec, &usage)?;
/// op.prepare(ctx);           // ownership moves into the operation
/// // ... the executor drops the context when the operation completes,
/// // returning `usage` to the store.
/// ```
pub struct ResourceContext {
    ticket: Ticket,
    spec: DeviceSpec,
    /// Wrapped in `Option` so we can `take()` it in `drop()`.
    usage: Option<Resources>,
    store: Arc<StoreInner>,
}

impl ResourceContext {
    pub(crate) fn new(
        ticket: Ticket,
        spec: DeviceSpec,
        usage: Resources,
        store: Arc<StoreInner>,
    ) -> Self {
        Self {
            ticket,
            spec,
            usage: Some(usage),
            store,
        }
    }

    /// The unique ticket for this reservation.
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// The device this reservation was made for.
    pub fn spec(&self) -> DeviceSpec {
        self.spec
    }

    /// The reserved amounts.
    pub fn usage(&self) -> &Resources {
        self.usage.as_ref().expect("reservation already released")
    }
}

impl Drop for ResourceContext {
    fn drop(&mut self) {
        if let Some(usage) = self.usage.take() {
            self.store.release_usage(self.ticket, &usage);
        }
    }
}

impl fmt::Debug for ResourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceContext")
            .field("ticket", &self.ticket)
            .field("spec", &self.spec)
            .field("usage", &self.usage)
            .finish()
    }
}

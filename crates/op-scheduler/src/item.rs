// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pending operations and per-session scheduling state.
//!
//! An [`OperationItem`] wraps one pending [`OperationTask`] together with a
//! weak reference to its owning [`SessionItem`]. The weak link is what makes
//! session teardown safe: once the engine drops its `Arc`, every pending
//! item fails to promote and is silently discarded by the scheduler.
//!
//! A [`SessionItem`] owns the per-client FIFO queue plus the head-of-line
//! counters and the set of live reservation tickets. The queue is driven
//! only by the scheduler; parallel sweep workers touch local stages, never
//! the queue itself.

use crate::traits::OperationTask;
use resource_ledger::Ticket;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Shared handle to a pending operation.
pub type OpItemHandle = Arc<OperationItem>;

/// The engine's view of all live sessions, in arrival order.
pub type SessionList = Vec<Arc<SessionItem>>;

/// The per-iteration output of a policy: which sessions to visit, in order.
pub type CandidateList = Vec<Arc<SessionItem>>;

/// A pending task: one operation awaiting placement on a device.
pub struct OperationItem {
    sess: Weak<SessionItem>,
    pub op: Arc<dyn OperationTask>,
}

impl OperationItem {
    pub fn new(session: &Arc<SessionItem>, op: Arc<dyn OperationTask>) -> OpItemHandle {
        Arc::new(Self {
            sess: Arc::downgrade(session),
            op,
        })
    }

    /// Promotes the weak session reference for the duration of one
    /// scheduling decision. `None` means the session has been torn down.
    pub fn session(&self) -> Option<Arc<SessionItem>> {
        self.sess.upgrade()
    }
}

impl fmt::Debug for OperationItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationItem")
            .field("op", &self.op)
            .field("session_alive", &(self.sess.strong_count() > 0))
            .finish()
    }
}

/// A logical client workload: FIFO queue, HOL counters, and live tickets.
pub struct SessionItem {
    sess_handle: String,
    pub(crate) queue: Mutex<VecDeque<OpItemHandle>>,
    /// Hash of the queue head observed after the previous sweep; 0 if the
    /// queue was empty.
    pub(crate) queue_head_hash: AtomicU64,
    /// How many other operations have passed the current head while it
    /// stayed unschedulable.
    pub(crate) hol_waiting: AtomicU64,
    tickets: Mutex<HashSet<Ticket>>,
}

impl SessionItem {
    pub fn new(sess_handle: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            sess_handle: sess_handle.into(),
            queue: Mutex::new(VecDeque::new()),
            queue_head_hash: AtomicU64::new(0),
            hol_waiting: AtomicU64::new(0),
            tickets: Mutex::new(HashSet::new()),
        })
    }

    pub fn handle(&self) -> &str {
        &self.sess_handle
    }

    /// Wraps `op` in an [`OperationItem`] owned by this session and appends
    /// it to the queue. Returns the handle for observation in tests.
    pub fn enqueue(self: &Arc<Self>, op: Arc<dyn OperationTask>) -> OpItemHandle {
        let item = OperationItem::new(self, op);
        self.enqueue_item(Arc::clone(&item));
        item
    }

    /// Appends an already-wrapped item. The item's session reference need
    /// not point at this session; the scheduler drops items whose own
    /// session is gone.
    pub fn enqueue_item(&self, item: OpItemHandle) {
        self.queue
            .lock()
            .expect("session queue mutex poisoned")
            .push_back(item);
    }

    pub fn queue_len(&self) -> usize {
        self.queue
            .lock()
            .expect("session queue mutex poisoned")
            .len()
    }

    pub fn hol_waiting(&self) -> u64 {
        self.hol_waiting.load(Ordering::Relaxed)
    }

    pub fn ticket_count(&self) -> usize {
        self.tickets
            .lock()
            .expect("session ticket mutex poisoned")
            .len()
    }

    pub fn insert_ticket(&self, ticket: Ticket) {
        self.tickets
            .lock()
            .expect("session ticket mutex poisoned")
            .insert(ticket);
    }

    /// Removes a ticket when its reservation completes. Returns whether the
    /// ticket was present.
    pub fn release_ticket(&self, ticket: Ticket) -> bool {
        self.tickets
            .lock()
            .expect("session ticket mutex poisoned")
            .remove(&ticket)
    }
}

impl fmt::Debug for SessionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionItem")
            .field("sess_handle", &self.sess_handle)
            .field("queue_len", &self.queue_len())
            .field("hol_waiting", &self.hol_waiting())
            .field("tickets", &self.ticket_count())
            .finish()
    }
}

/// Sessions added/removed since the previous scheduling iteration.
#[derive(Default)]
pub struct SessionChangeSet {
    pub added: Vec<Arc<SessionItem>>,
    pub removed: Vec<String>,
}

impl SessionChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

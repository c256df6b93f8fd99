// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A concrete [`TaskExecutor`] backed by an [`AllocationStore`] and the
//! ambient tokio runtime.
//!
//! Scheduled operations are spawned as tasks; on completion the executor
//! takes the operation's reservation context back, removes the ticket from
//! the owning session, and drops the context — returning the reservation
//! to the store. The scheduler's commit contract holds at both ends:
//! either a ticket is in the session's set AND the operation was handed
//! over, or neither.

use op_scheduler::{OpItemHandle, SchedulingParam, SessionItem, TaskExecutor};
use resource_ledger::{AllocationStore, DeviceSpec, LedgerError, ResourceContext, Resources};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Executes prepared operations on the tokio runtime and accounts their
/// resources in an [`AllocationStore`].
pub struct LocalExecutor {
    store: AllocationStore,
    param: SchedulingParam,
    handle: tokio::runtime::Handle,
    inflight: Mutex<Vec<JoinHandle<()>>>,
}

impl LocalExecutor {
    /// Creates an executor accounting against `capacity`.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime; the executor captures
    /// the ambient runtime handle to spawn completions.
    pub fn new(capacity: Resources, param: SchedulingParam) -> Self {
        Self {
            store: AllocationStore::new(capacity),
            param,
            handle: tokio::runtime::Handle::current(),
            inflight: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &AllocationStore {
        &self.store
    }

    /// Awaits every spawned operation. Drives the workload to quiescence
    /// between iterations and before reading final statistics.
    pub async fn join_all(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = {
                let mut inflight = self
                    .inflight
                    .lock()
                    .expect("executor inflight mutex poisoned");
                inflight.drain(..).collect()
            };
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(err) = handle.await {
                    warn!(%err, "operation task failed");
                }
            }
        }
    }
}

impl TaskExecutor for LocalExecutor {
    fn scheduling_param(&self) -> &SchedulingParam {
        &self.param
    }

    fn make_resource_context(
        &self,
        session: &Arc<SessionItem>,
        graph_id: u64,
        spec: DeviceSpec,
        usage: &Resources,
    ) -> Result<ResourceContext, LedgerError> {
        self.store
            .try_reserve(session.handle(), graph_id, spec, usage)
    }

    fn run_task(&self, op_item: OpItemHandle) -> Option<OpItemHandle> {
        let join = self.handle.spawn(async move {
            op_item.op.run();

            // Completion: surrender the context, release the ticket, and
            // let the context drop return the reservation.
            if let Some(ctx) = op_item.op.take_resource_context() {
                if let Some(session) = op_item.session() {
                    session.release_ticket(ctx.ticket());
                }
                trace!(ticket = %ctx.ticket(), op = ?op_item.op, "operation completed");
            }
        });

        self.inflight
            .lock()
            .expect("executor inflight mutex poisoned")
            .push(join);
        None
    }
}

impl std::fmt::Debug for LocalExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalExecutor")
            .field("store", &self.store)
            .field("param", &self.param)
            .finish()
    }
}

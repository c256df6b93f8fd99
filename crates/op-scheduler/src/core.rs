// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shared scheduling mechanics.
//!
//! [`SchedulerCore`] implements the machinery every policy reuses:
//! per-device pre-allocation with missing-resource bookkeeping, dispatch
//! through the executor facade, the per-queue sweep with head-of-line
//! (HOL) starvation mitigation, and the paging signal. Policies compose a
//! core and only decide the order in which sessions are visited.
//!
//! # Iteration protocol
//!
//! 1. The engine calls the policy's `notify_pre_scheduling_iteration`,
//!    which resets the core's missing-resource table.
//! 2. For each candidate session, the engine calls
//!    [`SchedulerCore::submit_all_from_queue`].
//! 3. After the pass, the engine asks
//!    [`SchedulerCore::insufficient_memory`] per device to decide whether
//!    to trigger paging.
//!
//! # Missing-table semantics across device fallback
//!
//! An entry recorded when the first candidate device rejects an operation
//! is NOT removed when a later device accepts it, so
//! `insufficient_memory(first_device)` can report true for an iteration in
//! which the operation was eventually scheduled. This pessimistic trigger
//! is intentional and kept: paging a little early costs one speculative
//! eviction, paging late stalls a session.

use crate::item::{OpItemHandle, SessionItem};
use crate::traits::TaskExecutor;
use resource_ledger::{DeviceSpec, DeviceType, LedgerError, ResourceKind, Resources};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace, warn};

/// Environment variable disabling GPU placement (`false`/`0`/`no`/`off`).
pub const USE_GPU_ENV: &str = "SALUS_SCHED_USE_GPU";

/// The base scheduler mechanics shared by all policies.
///
/// `SchedulerCore` is a cheap handle over `Arc`-shared inner state, so the
/// parallel sweep can hand clones to worker closures while policies and
/// the engine keep calling through `&self`.
#[derive(Clone)]
pub struct SchedulerCore {
    inner: Arc<CoreInner>,
}

struct CoreInner {
    executor: Arc<dyn TaskExecutor>,
    /// Per-iteration record of failed pre-allocations: op item address →
    /// missing amounts. The key is never dereferenced; it only keeps
    /// entries for distinct items apart within one iteration.
    missing: Mutex<HashMap<usize, Resources>>,
    use_gpu: bool,
}

impl SchedulerCore {
    /// Creates a core, reading GPU eligibility from [`USE_GPU_ENV`].
    pub fn new(executor: Arc<dyn TaskExecutor>) -> Self {
        Self::with_use_gpu(executor, env_flag(USE_GPU_ENV, true))
    }

    /// Creates a core with explicit GPU eligibility (tests, embedding).
    pub fn with_use_gpu(executor: Arc<dyn TaskExecutor>, use_gpu: bool) -> Self {
        debug!(
            "scheduling using: {}",
            if use_gpu { "GPU,CPU" } else { "CPU" }
        );
        Self {
            inner: Arc::new(CoreInner {
                executor,
                missing: Mutex::new(HashMap::new()),
                use_gpu,
            }),
        }
    }

    pub fn executor(&self) -> &Arc<dyn TaskExecutor> {
        &self.inner.executor
    }

    /// Clears per-iteration state. Every policy calls this from its
    /// `notify_pre_scheduling_iteration`.
    pub fn reset_iteration(&self) {
        self.inner
            .missing
            .lock()
            .expect("missing-resource table mutex poisoned")
            .clear();
    }

    /// True iff every operation that failed pre-allocation this iteration
    /// failed purely for memory on `spec`. An empty table yields false.
    ///
    /// See the module docs for the fallback semantics of the table.
    pub fn insufficient_memory(&self, spec: DeviceSpec) -> bool {
        let missing = self
            .inner
            .missing
            .lock()
            .expect("missing-resource table mutex poisoned");

        if missing.is_empty() {
            return false;
        }

        for shortfall in missing.values() {
            for (tag, _amount) in shortfall.iter() {
                if tag.kind != ResourceKind::Memory || tag.device != spec {
                    return false;
                }
            }
        }
        true
    }

    /// Number of operations with a recorded shortfall this iteration.
    pub fn missing_entries(&self) -> usize {
        self.inner
            .missing
            .lock()
            .expect("missing-resource table mutex poisoned")
            .len()
    }

    /// Attempts to reserve resources for `op_item` on `spec` and bind the
    /// reservation to the operation.
    ///
    /// Every early return leaves no live reservation behind: a rejected
    /// `try_reserve` never committed, and a rejected `prepare` consumed and
    /// dropped the context, releasing it. A `true` return means exactly one
    /// ticket entered the session's set.
    fn maybe_pre_allocate_for(&self, op_item: &OpItemHandle, spec: DeviceSpec) -> bool {
        let Some(session) = op_item.session() else {
            return false;
        };

        let usage = op_item.op.estimated_usage(&spec);
        let ctx = match self.inner.executor.make_resource_context(
            &session,
            op_item.op.graph_id(),
            spec,
            &usage,
        ) {
            Ok(ctx) => ctx,
            Err(LedgerError::InsufficientResources { missing }) => {
                self.inner
                    .missing
                    .lock()
                    .expect("missing-resource table mutex poisoned")
                    .insert(Arc::as_ptr(op_item) as usize, missing);
                return false;
            }
            Err(err) => {
                warn!(%err, %spec, "resource context creation failed");
                return false;
            }
        };

        let ticket = ctx.ticket();
        if !op_item.op.prepare(ctx) {
            // The operation logged its own failure cause and dropped the
            // context, releasing the reservation.
            return false;
        }

        session.insert_ticket(ticket);
        true
    }

    /// Attempts to schedule one operation.
    ///
    /// Devices are tried in the order the operation declares them; there is
    /// no cross-device load balancing here — that is a policy concern.
    /// Returns `None` when the item was consumed (dispatched, or dropped
    /// because its session died); returns the item unchanged when it could
    /// not be placed, so the caller re-queues it.
    pub fn submit_task(&self, op_item: OpItemHandle) -> Option<OpItemHandle> {
        let Some(session) = op_item.session() else {
            // Session already deleted, discard this task silently.
            return None;
        };

        trace!(session = session.handle(), op = ?op_item.op, "inspected");

        let mut scheduled = false;
        for &device_type in op_item.op.supported_device_types() {
            if device_type == DeviceType::Gpu && !self.inner.use_gpu {
                continue;
            }
            let spec = DeviceSpec::new(device_type, 0);
            if self.maybe_pre_allocate_for(&op_item, spec) {
                trace!(%spec, "task scheduled");
                scheduled = true;
                break;
            }
        }

        trace!(op = ?op_item.op, "prealloced");

        if scheduled {
            self.inner.executor.run_task(op_item)
        } else {
            debug!(
                session = session.handle(),
                op = ?op_item.op,
                "failed to schedule operation",
            );
            Some(op_item)
        }
    }

    /// Drains as much of `session`'s queue as resources permit. Returns the
    /// number of operations dispatched.
    ///
    /// When the queue head has been stuck behind more than
    /// `max_hol_waiting` passing operations, only the head is attempted:
    /// sweeping a stuck queue wastes fit checks and starves the head
    /// further behind operations that keep fitting. Otherwise the queue is
    /// swapped into a local stage and every item is attempted; survivors
    /// are re-queued ahead of any concurrently enqueued items, preserving
    /// their relative order.
    pub async fn submit_all_from_queue(&self, session: &Arc<SessionItem>) -> usize {
        if session
            .queue
            .lock()
            .expect("session queue mutex poisoned")
            .is_empty()
        {
            return 0;
        }

        let max_hol_waiting = self.inner.executor.scheduling_param().max_hol_waiting;
        let mut scheduled = 0usize;

        if session.hol_waiting.load(Ordering::Relaxed) > max_hol_waiting {
            debug!(
                session = session.handle(),
                hol_waiting = session.hol_waiting.load(Ordering::Relaxed),
                max = max_hol_waiting,
                "HOL waiting exceeds maximum, trying head only",
            );
            let head = session
                .queue
                .lock()
                .expect("session queue mutex poisoned")
                .front()
                .cloned();
            if let Some(head) = head {
                if self.submit_task(head).is_none() {
                    session
                        .queue
                        .lock()
                        .expect("session queue mutex poisoned")
                        .pop_front();
                    scheduled += 1;
                }
            }
        } else {
            let stage: Vec<OpItemHandle> = {
                let mut queue = session.queue.lock().expect("session queue mutex poisoned");
                queue.drain(..).collect()
            };
            let staged = stage.len();

            let survivors = self.sweep_stage(stage).await;
            scheduled = staged - survivors.len();

            // Survivors go back ahead of anything enqueued during the
            // sweep, in their original relative order.
            let mut queue = session.queue.lock().expect("session queue mutex poisoned");
            for item in survivors.into_iter().rev() {
                queue.push_front(item);
            }
            trace!(session = session.handle(), "all queued operations examined");
        }

        // Queue-head bookkeeping: `hol_waiting` counts how many OTHER
        // operations passed while the head stayed put.
        let queue = session.queue.lock().expect("session queue mutex poisoned");
        match queue.front() {
            None => {
                session.queue_head_hash.store(0, Ordering::Relaxed);
                session.hol_waiting.store(0, Ordering::Relaxed);
            }
            Some(head) => {
                let head_hash = head.op.stable_hash();
                if head_hash == session.queue_head_hash.load(Ordering::Relaxed) {
                    session
                        .hol_waiting
                        .fetch_add(scheduled as u64, Ordering::Relaxed);
                } else {
                    session.queue_head_hash.store(head_hash, Ordering::Relaxed);
                    session.hol_waiting.store(0, Ordering::Relaxed);
                }
            }
        }

        scheduled
    }

    /// Attempts every staged item, returning the unscheduled ones in stage
    /// order.
    #[cfg(not(feature = "parallel-sched"))]
    async fn sweep_stage(&self, stage: Vec<OpItemHandle>) -> Vec<OpItemHandle> {
        let mut survivors = Vec::new();
        for op_item in stage {
            if let Some(back) = self.submit_task(op_item) {
                survivors.push(back);
            }
        }
        survivors
    }

    /// Parallel sweep: every item is attempted on the runtime's blocking
    /// pool, and the futures are joined in stage order so the re-queue
    /// order never depends on completion order.
    #[cfg(feature = "parallel-sched")]
    async fn sweep_stage(&self, stage: Vec<OpItemHandle>) -> Vec<OpItemHandle> {
        let mut futures = Vec::with_capacity(stage.len());
        for op_item in stage {
            let core = self.clone();
            futures.push(tokio::task::spawn_blocking(move || core.submit_task(op_item)));
        }

        let mut survivors = Vec::new();
        for future in futures {
            match future.await {
                Ok(Some(back)) => survivors.push(back),
                Ok(None) => {}
                Err(err) => warn!(%err, "parallel submit worker failed"),
            }
        }
        survivors
    }

    pub fn debug_string(&self) -> String {
        format!(
            "SchedulerCore {{ use_gpu: {}, missing_entries: {} }}",
            self.inner.use_gpu,
            self.missing_entries(),
        )
    }
}

/// Reads a boolean flag from the environment, tolerating common spellings.
pub(crate) fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => parse_flag(&value, default),
        Err(_) => default,
    }
}

fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

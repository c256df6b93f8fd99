// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Contracts the scheduler consumes from its collaborators.
//!
//! The scheduler never executes anything itself: operations describe their
//! device support and demand through [`OperationTask`], and dispatch plus
//! resource accounting go through the [`TaskExecutor`] facade. Both are
//! traits so the engine, the tests, and the CLI can plug in different
//! executors without touching the scheduling mechanics.

use crate::item::{OpItemHandle, SessionItem};
use resource_ledger::{DeviceSpec, DeviceType, LedgerError, ResourceContext, Resources};
use std::sync::Arc;

/// A single ready-to-run computational node of a session's graph.
///
/// Implementations carry their own execution state. The scheduler calls
/// `prepare` at most once per item, moving the reservation context in; an
/// implementation that rejects the preparation must drop the context (which
/// releases the reservation) before returning `false`.
pub trait OperationTask: Send + Sync + std::fmt::Debug {
    /// Device types this operation can run on, in preference order
    /// (typically GPU first, then CPU).
    fn supported_device_types(&self) -> &[DeviceType];

    /// Estimated resource demand when placed on `spec`.
    fn estimated_usage(&self, spec: &DeviceSpec) -> Resources;

    /// Binds the operation to a granted reservation. Called at most once.
    ///
    /// Returns `false` to reject (e.g. kernel lookup failed); the
    /// implementation logs its own failure cause and drops `ctx`.
    fn prepare(&self, ctx: ResourceContext) -> bool;

    /// Executes the prepared operation. Called by the executor only after a
    /// successful `prepare`.
    fn run(&self);

    /// Surrenders the reservation context after the operation finished or
    /// aborted, so the executor can release the ticket.
    fn take_resource_context(&self) -> Option<ResourceContext>;

    /// The computation graph this operation belongs to.
    fn graph_id(&self) -> u64;

    /// Identity hash, stable for the lifetime of the operation. Used to
    /// detect whether a queue head has advanced between iterations.
    fn stable_hash(&self) -> u64;
}

/// Engine-level knobs the scheduler reads each iteration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SchedulingParam {
    /// Head-of-line threshold: once a queue head has been stuck behind more
    /// than this many passing operations, only the head is attempted.
    pub max_hol_waiting: u64,
}

impl Default for SchedulingParam {
    fn default() -> Self {
        Self { max_hol_waiting: 50 }
    }
}

/// The executor facade the scheduler dispatches through.
pub trait TaskExecutor: Send + Sync {
    fn scheduling_param(&self) -> &SchedulingParam;

    /// Atomically reserves `usage` on `spec` for `session`.
    ///
    /// On failure returns [`LedgerError::InsufficientResources`] carrying
    /// the per-tag shortfall, which the scheduler records for the paging
    /// signal.
    fn make_resource_context(
        &self,
        session: &Arc<SessionItem>,
        graph_id: u64,
        spec: DeviceSpec,
        usage: &Resources,
    ) -> Result<ResourceContext, LedgerError>;

    /// Takes ownership of a pre-allocated operation for execution.
    ///
    /// Returns `None` when the item was consumed; returns the item back on
    /// the rare executor-side reject so the caller can re-queue it.
    fn run_task(&self, op_item: OpItemHandle) -> Option<OpItemHandle>;
}

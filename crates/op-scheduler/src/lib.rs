// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # op-scheduler
//!
//! The resource-aware operation scheduler of a shared GPU/CPU execution
//! platform: each iteration it decides which pending per-session operations
//! may run, pre-reserves their device resources, dispatches them to an
//! executor, and raises a paging signal when device memory is exhausted.
//!
//! # Key Components
//!
//! - [`OperationItem`] / [`SessionItem`] — a pending operation with a weak
//!   link to its owning session; per-session FIFO queue, head-of-line
//!   counters, and live reservation tickets.
//! - [`SchedulerCore`] — the shared mechanics: per-device pre-allocation
//!   with missing-resource bookkeeping, queue sweep with HOL starvation
//!   mitigation, and the `insufficient_memory` paging signal.
//! - [`SchedulerPolicy`] — the extension seam: policies order and filter
//!   sessions per iteration; everything else is inherited from the core.
//! - [`SchedulerRegistry`] — name → factory map so policy selection stays
//!   a startup flag.
//! - [`OperationTask`] / [`TaskExecutor`] — the contracts consumed from
//!   the framework interop layer and the executor.
//!
//! # Iteration Flow
//!
//! ```text
//! notify_pre_scheduling_iteration(sessions, changeset, candidates)
//!     │                         (reset missing table, order sessions)
//!     ▼
//! submit_all_from_queue(session)      per candidate
//!     │   submit_task ──► maybe_pre_allocate_for ──► executor.run_task
//!     ▼
//! insufficient_memory(device)?        ──► external paging subsystem
//! ```
//!
//! # Feature Flags
//!
//! - `parallel-sched` — fan the per-queue sweep out onto the runtime's
//!   blocking pool; re-queue order is preserved by joining futures in
//!   stage order.
//!
//! # Configuration
//!
//! The environment variable `SALUS_SCHED_USE_GPU` (default true) disables
//! GPU placement entirely when set to a false-y value.

pub mod core;
pub mod item;
pub mod policy;
pub mod registry;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::core::{SchedulerCore, USE_GPU_ENV};
pub use item::{
    CandidateList, OpItemHandle, OperationItem, SessionChangeSet, SessionItem, SessionList,
};
pub use policy::{FairPolicy, FifoPolicy, PackPolicy, SchedulerPolicy};
pub use registry::{SchedulerFactory, SchedulerRegistry};
pub use traits::{OperationTask, SchedulingParam, TaskExecutor};

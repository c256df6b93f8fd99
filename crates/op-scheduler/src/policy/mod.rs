// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`SchedulerPolicy`] trait and policy implementations.
//!
//! A policy decides only the order in which sessions are visited each
//! iteration (and which sessions to admit at all); the pre-allocation,
//! dispatch, and HOL mechanics are shared through the composed
//! [`SchedulerCore`]. Policies must not touch another session's queue.

pub mod fair;
pub mod fifo;
pub mod pack;

pub use fair::FairPolicy;
pub use fifo::FifoPolicy;
pub use pack::PackPolicy;

use crate::core::SchedulerCore;
use crate::item::{CandidateList, SessionChangeSet, SessionItem};
use crate::registry::SchedulerRegistry;
use std::sync::Arc;

/// A scheduling policy: an iteration ordering over sessions, composed with
/// the shared scheduling mechanics.
pub trait SchedulerPolicy: Send + Sync {
    /// The name this policy is registered under.
    fn name(&self) -> &'static str;

    /// The shared mechanics this policy drives.
    fn core(&self) -> &SchedulerCore;

    /// Called once per iteration before any queue is drained.
    ///
    /// Resets the core's per-iteration state and fills `candidates` with
    /// the sessions to visit, in visit order. The default admits every
    /// session in arrival order. Overrides may reorder or filter, and may
    /// use `changeset` to refresh internal caches; they must still reset
    /// the core.
    fn notify_pre_scheduling_iteration(
        &mut self,
        sessions: &[Arc<SessionItem>],
        changeset: &SessionChangeSet,
        candidates: &mut CandidateList,
    ) {
        let _ = changeset;
        self.core().reset_iteration();
        candidates.clear();
        candidates.extend(sessions.iter().cloned());
    }

    fn debug_string(&self) -> String {
        self.name().to_string()
    }

    fn session_debug_string(&self, _session: &Arc<SessionItem>) -> String {
        String::new()
    }
}

/// Registers the built-in policies. Called once for the global registry;
/// embedders with their own registry call it explicitly.
pub fn register_builtins(registry: &SchedulerRegistry) {
    registry.register("fifo", Box::new(|executor| Box::new(FifoPolicy::new(executor))));
    registry.register("fair", Box::new(|executor| Box::new(FairPolicy::new(executor))));
    registry.register("pack", Box::new(|executor| Box::new(PackPolicy::new(executor))));
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Backlog packing.
//!
//! Orders sessions by descending queue depth each iteration: the deepest
//! backlog gets first pick, packing the device with work from sessions
//! that can keep it busy. Sessions with equal depth keep their relative
//! arrival order.
//!
//! # When to use
//! - Throughput-oriented batch workloads where keeping devices saturated
//!   matters more than even progress across sessions.

use crate::core::SchedulerCore;
use crate::item::{CandidateList, SessionChangeSet, SessionItem};
use crate::policy::SchedulerPolicy;
use crate::traits::TaskExecutor;
use std::sync::Arc;

/// Deepest-queue-first session iteration.
pub struct PackPolicy {
    core: SchedulerCore,
}

impl PackPolicy {
    pub fn new(executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            core: SchedulerCore::new(executor),
        }
    }
}

impl SchedulerPolicy for PackPolicy {
    fn name(&self) -> &'static str {
        "pack"
    }

    fn core(&self) -> &SchedulerCore {
        &self.core
    }

    fn notify_pre_scheduling_iteration(
        &mut self,
        sessions: &[Arc<SessionItem>],
        _changeset: &SessionChangeSet,
        candidates: &mut CandidateList,
    ) {
        self.core.reset_iteration();
        candidates.clear();
        candidates.extend(sessions.iter().cloned());
        // Stable sort: equal depths keep arrival order.
        candidates.sort_by(|a, b| b.queue_len().cmp(&a.queue_len()));
    }

    fn session_debug_string(&self, session: &Arc<SessionItem>) -> String {
        format!("{} queued", session.queue_len())
    }
}

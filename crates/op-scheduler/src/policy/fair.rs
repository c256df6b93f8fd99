// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reservation-count fairness.
//!
//! Orders sessions by ascending live-ticket count each iteration, so the
//! clients holding the fewest device reservations get first pick of the
//! freed resources. Ties break on the session handle for a stable order.
//!
//! This is fairness in admission order only; it does not rebalance
//! resources already held.
//!
//! # When to use
//! - Default for mixed workloads: keeps one heavy session from
//!   monopolising a device across iterations.

use crate::core::SchedulerCore;
use crate::item::{CandidateList, SessionChangeSet, SessionItem};
use crate::policy::SchedulerPolicy;
use crate::traits::TaskExecutor;
use std::sync::Arc;

/// Fewest-reservations-first session iteration.
pub struct FairPolicy {
    core: SchedulerCore,
}

impl FairPolicy {
    pub fn new(executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            core: SchedulerCore::new(executor),
        }
    }
}

impl SchedulerPolicy for FairPolicy {
    fn name(&self) -> &'static str {
        "fair"
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
        candidates.sort_by(|a, b| {
            a.ticket_count()
                .cmp(&b.ticket_count())
                .then_with(|| a.handle().cmp(b.handle()))
        });
    }

    fn session_debug_string(&self, session: &Arc<SessionItem>) -> String {
        format!("{} live tickets", session.ticket_count())
    }
}

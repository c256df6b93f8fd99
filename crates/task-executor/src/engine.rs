// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The scheduling engine: the iteration driver that owns the session
//! table and composes a policy with the executor.
//!
//! Each iteration:
//! 1. Hand the policy the session list plus the changeset since the last
//!    iteration; the policy resets per-iteration state and produces the
//!    candidate ordering.
//! 2. Drain each candidate's queue through the shared scheduler core.
//! 3. Consult `insufficient_memory` per device; the resulting
//!    [`IterationReport`] tells the external paging subsystem which
//!    devices need eviction.

use crate::{ExecutorError, LocalExecutor};
use op_scheduler::{
    CandidateList, SchedulerPolicy, SchedulerRegistry, SessionChangeSet, SessionItem,
    TaskExecutor,
};
use resource_ledger::DeviceSpec;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one scheduling iteration.
#[derive(Debug, Clone)]
pub struct IterationReport {
    /// Operations dispatched (or discarded for dead sessions) this pass.
    pub scheduled: usize,
    /// Devices whose every recorded shortfall was memory: the signal to
    /// start paging.
    pub paging_needed: Vec<DeviceSpec>,
}

/// Drives scheduling iterations over a table of sessions.
pub struct SchedulingEngine {
    executor: Arc<LocalExecutor>,
    scheduler: Box<dyn SchedulerPolicy>,
    sessions: Vec<Arc<SessionItem>>,
    pending_added: Vec<Arc<SessionItem>>,
    pending_removed: Vec<String>,
    devices: Vec<DeviceSpec>,
}

impl std::fmt::Debug for SchedulingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulingEngine")
            .field("sessions", &self.sessions.len())
            .field("pending_added", &self.pending_added.len())
            .field("pending_removed", &self.pending_removed)
            .field("devices", &self.devices)
            .finish()
    }
}

impl SchedulingEngine {
    /// Builds an engine with the policy registered under `policy_name`.
    pub fn new(executor: Arc<LocalExecutor>, policy_name: &str) -> Result<Self, ExecutorError> {
        let registry = SchedulerRegistry::global();
        let scheduler = registry
            .create(
                policy_name,
                Arc::clone(&executor) as Arc<dyn TaskExecutor>,
            )
            .ok_or_else(|| ExecutorError::UnknownPolicy {
                name: policy_name.to_string(),
                known: registry.names().join(", "),
            })?;

        let devices = executor.store().devices();
        info!(policy = scheduler.name(), ?devices, "scheduling engine ready");

        Ok(Self {
            executor,
            scheduler,
            sessions: Vec::new(),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            devices,
        })
    }

    pub fn executor(&self) -> &Arc<LocalExecutor> {
        &self.executor
    }

    pub fn policy_name(&self) -> &str {
        self.scheduler.name()
    }

    /// Registers a new session and reports it in the next changeset.
    pub fn add_session(&mut self, sess_handle: impl Into<String>) -> Arc<SessionItem> {
        let session = SessionItem::new(sess_handle);
        self.sessions.push(Arc::clone(&session));
        self.pending_added.push(Arc::clone(&session));
        debug!(session = session.handle(), "session added");
        session
    }

    /// Tears a session down. Dropping the engine's `Arc` makes pending
    /// items fail to promote, so anything still queued elsewhere is
    /// silently discarded by the scheduler.
    pub fn remove_session(&mut self, sess_handle: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.handle() != sess_handle);
        let removed = self.sessions.len() != before;
        if removed {
            self.pending_removed.push(sess_handle.to_string());
            debug!(session = sess_handle, "session removed");
        }
        removed
    }

    pub fn sessions(&self) -> &[Arc<SessionItem>] {
        &self.sessions
    }

    /// Operations still queued across all sessions.
    pub fn total_queued(&self) -> usize {
        self.sessions.iter().map(|s| s.queue_len()).sum()
    }

    /// Runs one scheduling iteration.
    pub async fn run_iteration(&mut self) -> IterationReport {
        let changeset = SessionChangeSet {
            added: std::mem::take(&mut self.pending_added),
            removed: std::mem::take(&mut self.pending_removed),
        };

        let mut candidates = CandidateList::new();
        self.scheduler
            .notify_pre_scheduling_iteration(&self.sessions, &changeset, &mut candidates);

        let core = self.scheduler.core().clone();
        let mut scheduled = 0;
        for session in &candidates {
            scheduled += core.submit_all_from_queue(session).await;
        }

        let paging_needed: Vec<DeviceSpec> = self
            .devices
            .iter()
            .copied()
            .filter(|device| core.insufficient_memory(*device))
            .collect();
        if !paging_needed.is_empty() {
            info!(?paging_needed, "device memory exhausted, paging required");
        }

        debug!(scheduled, queued = self.total_queued(), "iteration complete");
        IterationReport {
            scheduled,
            paging_needed,
        }
    }

    /// Iterates until every queue is empty or `max_iterations` is reached,
    /// quiescing the executor between iterations so completed operations
    /// free their reservations.
    pub async fn run_until_drained(&mut self, max_iterations: usize) -> Vec<IterationReport> {
        let mut reports = Vec::new();
        for _ in 0..max_iterations {
            if self.total_queued() == 0 {
                break;
            }
            let report = self.run_iteration().await;
            reports.push(report);
            self.executor.join_all().await;
        }
        reports
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! First-in-first-out session ordering.
//!
//! Visits sessions in the order the engine registered them, every
//! iteration. Within a session, dispatch order is the enqueue order for
//! whatever fits — that part is the core's contract, not the policy's.
//!
//! # When to use
//! - Baseline and debugging: the most predictable interleaving.

use crate::core::SchedulerCore;
use crate::policy::SchedulerPolicy;
use crate::traits::TaskExecutor;
use std::sync::Arc;

/// Arrival-order session iteration.
pub struct FifoPolicy {
    core: SchedulerCore,
}

impl FifoPolicy {
    pub fn new(executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            core: SchedulerCore::new(executor),
        }
    }
}

impl SchedulerPolicy for FifoPolicy {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn core(&self) -> &SchedulerCore {
        &self.core
    }
}

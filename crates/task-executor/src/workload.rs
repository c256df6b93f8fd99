// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Synthetic operations for exercising the scheduler without a real
//! framework interop layer.
//!
//! [`SyntheticOp`] is deterministic and observable: tests and the CLI can
//! read back where it was placed and how often it ran. It is the workload
//! generator for the simulator command and the integration tests.

use op_scheduler::OperationTask;
use resource_ledger::{DeviceSpec, DeviceType, ResourceContext, Resources};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// A deterministic operation with per-device memory demand.
#[derive(Debug)]
pub struct SyntheticOp {
    graph_id: u64,
    hash: u64,
    devices: Vec<DeviceType>,
    demand: HashMap<DeviceType, u64>,
    compute_slots: u64,
    reject_prepare: bool,
    runs: AtomicU64,
    placed: Mutex<Option<DeviceSpec>>,
    ctx: Mutex<Option<ResourceContext>>,
}

impl SyntheticOp {
    /// Creates an operation supporting `devices` in preference order.
    pub fn new(graph_id: u64, hash: u64, devices: &[DeviceType]) -> Self {
        Self {
            graph_id,
            hash,
            devices: devices.to_vec(),
            demand: HashMap::new(),
            compute_slots: 0,
            reject_prepare: false,
            runs: AtomicU64::new(0),
            placed: Mutex::new(None),
            ctx: Mutex::new(None),
        }
    }

    /// Sets the memory demand in bytes when placed on `device_type`.
    pub fn with_demand(mut self, device_type: DeviceType, bytes: u64) -> Self {
        self.demand.insert(device_type, bytes);
        self
    }

    /// Also demand `slots` compute slots on whatever device is chosen.
    pub fn with_compute_slots(mut self, slots: u64) -> Self {
        self.compute_slots = slots;
        self
    }

    /// Makes `prepare` reject after the reservation was granted.
    pub fn rejecting_prepare(mut self) -> Self {
        self.reject_prepare = true;
        self
    }

    /// The device this operation was prepared on, if any.
    pub fn placed_device(&self) -> Option<DeviceSpec> {
        *self.placed.lock().expect("placement mutex poisoned")
    }

    /// How many times the executor ran this operation.
    pub fn run_count(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }
}

impl OperationTask for SyntheticOp {
    fn supported_device_types(&self) -> &[DeviceType] {
        &self.devices
    }

    fn estimated_usage(&self, spec: &DeviceSpec) -> Resources {
        let mut usage = match self.demand.get(&spec.device_type) {
            Some(bytes) => Resources::memory(*spec, *bytes),
            None => Resources::new(),
        };
        if self.compute_slots > 0 {
            usage.add_assign(&Resources::compute(*spec, self.compute_slots));
        }
        usage
    }

    fn prepare(&self, ctx: ResourceContext) -> bool {
        if self.reject_prepare {
            debug!(hash = self.hash, "synthetic op rejecting prepare");
            return false;
        }
        *self.placed.lock().expect("placement mutex poisoned") = Some(ctx.spec());
        *self.ctx.lock().expect("context mutex poisoned") = Some(ctx);
        true
    }

    fn run(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }

    fn take_resource_context(&self) -> Option<ResourceContext> {
        self.ctx.lock().expect("context mutex poisoned").take()
    }

    fn graph_id(&self) -> u64 {
        self.graph_id
    }

    fn stable_hash(&self) -> u64 {
        self.hash
    }
}

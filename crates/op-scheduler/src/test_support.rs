// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shared fixtures for the crate's unit tests: a configurable operation
//! and an executor that records dispatches and defers completion so tests
//! can observe both halves of the ticket lifecycle.

use crate::item::OpItemHandle;
use crate::item::SessionItem;
use crate::traits::{OperationTask, SchedulingParam, TaskExecutor};
use resource_ledger::{
    AllocationStore, DeviceSpec, DeviceType, LedgerError, ResourceContext, Resources,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A test operation with per-device memory demand.
#[derive(Debug)]
pub(crate) struct TestOp {
    graph_id: u64,
    hash: u64,
    devices: Vec<DeviceType>,
    demand: HashMap<DeviceType, u64>,
    reject_prepare: bool,
    runs: AtomicU64,
    placed: Mutex<Option<DeviceSpec>>,
    ctx: Mutex<Option<ResourceContext>>,
}

impl TestOp {
    pub(crate) fn new(graph_id: u64, hash: u64, devices: &[DeviceType]) -> Self {
        Self {
            graph_id,
            hash,
            devices: devices.to_vec(),
            demand: HashMap::new(),
            reject_prepare: false,
            runs: AtomicU64::new(0),
            placed: Mutex::new(None),
            ctx: Mutex::new(None),
        }
    }

    /// Sets the memory demand in bytes when placed on `device_type`.
    pub(crate) fn with_demand(mut self, device_type: DeviceType, bytes: u64) -> Self {
        self.demand.insert(device_type, bytes);
        self
    }

    /// Makes `prepare` reject after the reservation was granted.
    pub(crate) fn rejecting_prepare(mut self) -> Self {
        self.reject_prepare = true;
        self
    }

    pub(crate) fn placed_device(&self) -> Option<DeviceSpec> {
        *self.placed.lock().unwrap()
    }

    pub(crate) fn run_count(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }
}

impl OperationTask for TestOp {
    fn supported_device_types(&self) -> &[DeviceType] {
        &self.devices
    }

    fn estimated_usage(&self, spec: &DeviceSpec) -> Resources {
        match self.demand.get(&spec.device_type) {
            Some(bytes) => Resources::memory(*spec, *bytes),
            None => Resources::new(),
        }
    }

    fn prepare(&self, ctx: ResourceContext) -> bool {
        if self.reject_prepare {
            // Dropping the context releases the reservation.
            return false;
        }
        *self.placed.lock().unwrap() = Some(ctx.spec());
        *self.ctx.lock().unwrap() = Some(ctx);
        true
    }

    fn run(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }

    fn take_resource_context(&self) -> Option<ResourceContext> {
        self.ctx.lock().unwrap().take()
    }

    fn graph_id(&self) -> u64 {
        self.graph_id
    }

    fn stable_hash(&self) -> u64 {
        self.hash
    }
}

/// A deterministic executor: reservations go straight to an
/// [`AllocationStore`], dispatched items are parked until the test calls
/// [`TestExecutor::complete_all`].
pub(crate) struct TestExecutor {
    store: AllocationStore,
    param: SchedulingParam,
    dispatched: Mutex<Vec<OpItemHandle>>,
    reject_run: AtomicBool,
}

impl TestExecutor {
    pub(crate) fn new(store: AllocationStore, param: SchedulingParam) -> Self {
        Self {
            store,
            param,
            dispatched: Mutex::new(Vec::new()),
            reject_run: AtomicBool::new(false),
        }
    }

    pub(crate) fn store(&self) -> &AllocationStore {
        &self.store
    }

    /// Makes the next `run_task` calls return the item (executor reject).
    pub(crate) fn set_reject_run(&self, reject: bool) {
        self.reject_run.store(reject, Ordering::Relaxed);
    }

    /// Hashes of dispatched operations, in dispatch order.
    pub(crate) fn dispatched(&self) -> Vec<u64> {
        self.dispatched
            .lock()
            .unwrap()
            .iter()
            .map(|item| item.op.stable_hash())
            .collect()
    }

    /// Finishes every parked operation: runs it, releases its ticket and
    /// reservation.
    pub(crate) fn complete_all(&self) {
        let items: Vec<OpItemHandle> = self.dispatched.lock().unwrap().drain(..).collect();
        for item in items {
            item.op.run();
            if let Some(ctx) = item.op.take_resource_context() {
                if let Some(session) = item.session() {
                    session.release_ticket(ctx.ticket());
                }
            }
        }
    }
}

impl TaskExecutor for TestExecutor {
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
        if self.reject_run.load(Ordering::Relaxed) {
            return Some(op_item);
        }
        self.dispatched.lock().unwrap().push(op_item);
        None
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: end-to-end scheduling iterations.
//!
//! These tests exercise the complete flow from session registration →
//! policy ordering → pre-allocation → dispatch → completion → paging
//! signal, proving that the three crates compose correctly and that no
//! reservation or ticket survives a quiesced workload.

use op_scheduler::SchedulingParam;
use resource_ledger::{DeviceSpec, DeviceType, ResourceTag, Resources};
use std::sync::Arc;
use task_executor::workload::SyntheticOp;
use task_executor::{EngineConfig, LocalExecutor, SchedulingEngine};

// ── Helpers ────────────────────────────────────────────────────

/// An engine over explicit GPU/CPU memory pools.
fn engine(policy: &str, gpu_bytes: u64, cpu_bytes: u64) -> SchedulingEngine {
    let capacity = Resources::new()
        .with(ResourceTag::memory(DeviceSpec::gpu(0)), gpu_bytes)
        .with(ResourceTag::memory(DeviceSpec::cpu(0)), cpu_bytes);
    let executor = Arc::new(LocalExecutor::new(capacity, SchedulingParam::default()));
    SchedulingEngine::new(executor, policy).unwrap()
}

fn gpu_cpu_op(graph_id: u64, hash: u64, gpu_bytes: u64, cpu_bytes: u64) -> Arc<SyntheticOp> {
    Arc::new(
        SyntheticOp::new(graph_id, hash, &[DeviceType::Gpu, DeviceType::Cpu])
            .with_demand(DeviceType::Gpu, gpu_bytes)
            .with_demand(DeviceType::Cpu, cpu_bytes),
    )
}

fn gpu_only_op(graph_id: u64, hash: u64, gpu_bytes: u64) -> Arc<SyntheticOp> {
    Arc::new(
        SyntheticOp::new(graph_id, hash, &[DeviceType::Gpu]).with_demand(DeviceType::Gpu, gpu_bytes),
    )
}

// ── Single Session ─────────────────────────────────────────────

#[tokio::test]
async fn test_single_op_fits_on_gpu() {
    let mut engine = engine("fifo", 1000, u64::MAX);
    let session = engine.add_session("s0");
    let op = gpu_cpu_op(1, 11, 100, 100);
    session.enqueue(op.clone());

    let report = engine.run_iteration().await;
    assert_eq!(report.scheduled, 1);
    assert!(report.paging_needed.is_empty());
    assert_eq!(session.queue_len(), 0);

    engine.executor().join_all().await;
    assert_eq!(op.run_count(), 1);
    assert_eq!(op.placed_device(), Some(DeviceSpec::gpu(0)));
    assert_eq!(session.ticket_count(), 0);
    assert!(engine.executor().store().in_use().is_empty());
}

#[tokio::test]
async fn test_gpu_exhausted_cpu_fallback_keeps_paging_signal() {
    // GPU pool too small, CPU pool unbounded: the op lands on CPU, but the
    // GPU shortfall recorded on the way stays in the iteration's table, so
    // the paging signal for the GPU fires pessimistically.
    let mut engine = engine("fifo", 50, u64::MAX);
    let session = engine.add_session("s0");
    let op = gpu_cpu_op(1, 11, 100, 100);
    session.enqueue(op.clone());

    let report = engine.run_iteration().await;
    assert_eq!(report.scheduled, 1);
    assert_eq!(report.paging_needed, vec![DeviceSpec::gpu(0)]);

    engine.executor().join_all().await;
    assert_eq!(op.placed_device(), Some(DeviceSpec::cpu(0)));
}

// ── Universal Memory Exhaustion ────────────────────────────────

#[tokio::test]
async fn test_universal_gpu_exhaustion_raises_paging() {
    let mut engine = engine("fifo", 100, u64::MAX);
    let mut ops = Vec::new();
    for (i, handle) in ["a", "b", "c"].iter().enumerate() {
        let session = engine.add_session(*handle);
        let op = gpu_only_op(i as u64, i as u64 + 1, 500);
        session.enqueue(op.clone());
        ops.push((session, op));
    }

    let report = engine.run_iteration().await;
    assert_eq!(report.scheduled, 0);
    assert_eq!(report.paging_needed, vec![DeviceSpec::gpu(0)]);

    // Nothing dispatched, nothing reserved, everything still queued.
    for (session, op) in &ops {
        assert_eq!(session.queue_len(), 1);
        assert_eq!(op.run_count(), 0);
    }
    assert!(engine.executor().store().in_use().is_empty());
}

#[tokio::test]
async fn test_mixed_shortfalls_do_not_raise_paging() {
    // One op starves on GPU memory, another on CPU memory: neither device
    // satisfies "every shortfall is memory on this device".
    let mut engine = engine("fifo", 100, 100);
    let session = engine.add_session("s0");
    session.enqueue(gpu_only_op(1, 1, 500));
    session.enqueue(Arc::new(
        SyntheticOp::new(1, 2, &[DeviceType::Cpu]).with_demand(DeviceType::Cpu, 500),
    ));

    let report = engine.run_iteration().await;
    assert_eq!(report.scheduled, 0);
    assert!(report.paging_needed.is_empty());
}

// ── Multi-Iteration Drain ──────────────────────────────────────

#[tokio::test]
async fn test_drain_respects_capacity_across_iterations() {
    // 10 ops of 40 bytes on a 100-byte GPU: at most 2 dispatch per
    // iteration, and completions free the pool between iterations.
    let mut engine = engine("fifo", 100, 0);
    let session = engine.add_session("s0");
    let ops: Vec<Arc<SyntheticOp>> = (1..=10u64)
        .map(|hash| {
            let op = gpu_only_op(1, hash, 40);
            session.enqueue(op.clone());
            op
        })
        .collect();

    let reports = engine.run_until_drained(20).await;
    assert_eq!(session.queue_len(), 0);
    // More than one iteration was needed: the pool forces batching.
    assert!(reports.len() >= 2);
    assert_eq!(reports.iter().map(|r| r.scheduled).sum::<usize>(), 10);

    engine.executor().join_all().await;
    for op in &ops {
        assert_eq!(op.run_count(), 1);
    }

    // Ticket-leak freedom: the quiesced workload left nothing behind.
    assert_eq!(session.ticket_count(), 0);
    assert!(engine.executor().store().in_use().is_empty());
    let stats = engine.executor().store().stats();
    assert_eq!(stats.live_contexts, 0);
    assert_eq!(stats.granted, 10);
}

#[tokio::test]
async fn test_dispatch_order_matches_enqueue_order_per_session() {
    let mut engine = engine("fifo", u64::MAX, 0);
    let session = engine.add_session("s0");
    let ops: Vec<Arc<SyntheticOp>> = (1..=5u64)
        .map(|hash| {
            let op = gpu_only_op(1, hash, 10);
            session.enqueue(op.clone());
            op
        })
        .collect();

    engine.run_until_drained(5).await;
    engine.executor().join_all().await;
    for op in &ops {
        assert_eq!(op.run_count(), 1);
    }
}

// ── Session Teardown ───────────────────────────────────────────

#[tokio::test]
async fn test_removed_session_is_not_scheduled() {
    let mut engine = engine("fifo", 1000, u64::MAX);
    let keep = engine.add_session("keep");
    let doomed = engine.add_session("doomed");

    let kept_op = gpu_only_op(1, 1, 10);
    keep.enqueue(kept_op.clone());
    let doomed_op = gpu_only_op(2, 2, 10);
    doomed.enqueue(doomed_op.clone());

    assert!(engine.remove_session("doomed"));
    // The test still holds an Arc; once it lets go, pending items cannot
    // promote their session reference any more.
    drop(doomed);

    let report = engine.run_iteration().await;
    assert_eq!(report.scheduled, 1);
    engine.executor().join_all().await;
    assert_eq!(kept_op.run_count(), 1);
    assert_eq!(doomed_op.run_count(), 0);
    assert!(engine.executor().store().in_use().is_empty());
}

// ── Policies End-to-End ────────────────────────────────────────

#[tokio::test]
async fn test_pack_policy_drains_deepest_backlog_first() {
    // One GPU slot's worth of memory: only one op fits per iteration, so
    // the first candidate wins it. Pack visits the deeper queue first.
    let mut engine = engine("pack", 100, 0);
    let shallow = engine.add_session("shallow");
    let deep = engine.add_session("deep");

    let shallow_op = gpu_only_op(1, 1, 80);
    shallow.enqueue(shallow_op.clone());
    let deep_ops: Vec<Arc<SyntheticOp>> = (2..=4u64)
        .map(|hash| {
            let op = gpu_only_op(2, hash, 80);
            deep.enqueue(op.clone());
            op
        })
        .collect();

    let report = engine.run_iteration().await;
    assert_eq!(report.scheduled, 1);
    engine.executor().join_all().await;
    assert_eq!(deep_ops[0].run_count(), 1);
    assert_eq!(shallow_op.run_count(), 0);
}

#[tokio::test]
async fn test_fair_policy_drains_everything() {
    let mut engine = engine("fair", 200, u64::MAX);
    for handle in ["a", "b", "c"] {
        let session = engine.add_session(handle);
        for i in 0..4u64 {
            let hash = handle.as_bytes()[0] as u64 * 100 + i;
            session.enqueue(gpu_cpu_op(1, hash, 50, 50));
        }
    }

    let reports = engine.run_until_drained(50).await;
    assert!(!reports.is_empty());
    assert_eq!(engine.total_queued(), 0);

    engine.executor().join_all().await;
    assert!(engine.executor().store().in_use().is_empty());
    for session in engine.sessions() {
        assert_eq!(session.ticket_count(), 0);
    }
}

// ── Config ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_config_creates_engine() {
    let config = EngineConfig {
        policy: "pack".into(),
        gpu_memory: "1M".into(),
        cpu_memory: "1M".into(),
        ..Default::default()
    };
    let engine = config.create_engine().unwrap();
    assert_eq!(engine.policy_name(), "pack");
    assert_eq!(
        engine.executor().store().devices(),
        vec![DeviceSpec::cpu(0), DeviceSpec::gpu(0)],
    );
}

#[tokio::test]
async fn test_config_unknown_policy_is_recoverable() {
    let config = EngineConfig {
        policy: "bogus".into(),
        ..Default::default()
    };
    let err = config.create_engine().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("bogus"));
    assert!(message.contains("fair"));
}

// ── Prepare Rejection ──────────────────────────────────────────

#[tokio::test]
async fn test_prepare_rejection_leaves_no_residue() {
    let mut engine = engine("fifo", 1000, 0);
    let session = engine.add_session("s0");
    let op = Arc::new(
        SyntheticOp::new(1, 1, &[DeviceType::Gpu])
            .with_demand(DeviceType::Gpu, 100)
            .rejecting_prepare(),
    );
    session.enqueue(op.clone());

    let report = engine.run_iteration().await;
    assert_eq!(report.scheduled, 0);
    // Reservation auto-released; item stays queued; no escalation.
    assert_eq!(session.queue_len(), 1);
    assert_eq!(session.ticket_count(), 0);
    assert!(engine.executor().store().in_use().is_empty());
    assert!(report.paging_needed.is_empty());
}

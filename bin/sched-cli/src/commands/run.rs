// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `sched run` command: drive a synthetic multi-session workload through
//! the scheduler and report placement, iteration, and ledger statistics.

use resource_ledger::{Capacity, DeviceType};
use std::path::PathBuf;
use std::sync::Arc;
use task_executor::workload::SyntheticOp;
use task_executor::EngineConfig;

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    config_path: Option<PathBuf>,
    policy: String,
    sessions: usize,
    ops_per_session: usize,
    gpu_demand: String,
    cpu_demand: String,
    gpu_memory: String,
    cpu_memory: String,
    max_iterations: usize,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             sched · Scheduling Simulator            ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Configuration ──────────────────────────────────────────
    let config = match &config_path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig {
            policy: policy.clone(),
            gpu_memory: gpu_memory.clone(),
            cpu_memory: cpu_memory.clone(),
            ..Default::default()
        },
    };

    let gpu_demand_bytes = Capacity::parse(&gpu_demand)
        .map_err(|e| anyhow::anyhow!("invalid --gpu-demand: {e}"))?
        .as_bytes();
    let cpu_demand_bytes = Capacity::parse(&cpu_demand)
        .map_err(|e| anyhow::anyhow!("invalid --cpu-demand: {e}"))?
        .as_bytes();

    println!("  Config:");
    println!("   Policy:       {}", config.policy);
    println!("   GPU pool:     {}", config.gpu_memory);
    println!("   CPU pool:     {}", config.cpu_memory);
    println!("   Sessions:     {sessions}");
    println!("   Ops/session:  {ops_per_session} ({gpu_demand} GPU / {cpu_demand} CPU each)");
    println!();

    // ── Engine and Workload ────────────────────────────────────
    let mut engine = config.create_engine()?;

    let mut ops = Vec::new();
    for s in 0..sessions {
        let session = engine.add_session(format!("session-{s}"));
        for o in 0..ops_per_session {
            let hash = (s as u64) * 10_000 + o as u64 + 1;
            let op = Arc::new(
                SyntheticOp::new(s as u64, hash, &[DeviceType::Gpu, DeviceType::Cpu])
                    .with_demand(DeviceType::Gpu, gpu_demand_bytes)
                    .with_demand(DeviceType::Cpu, cpu_demand_bytes),
            );
            session.enqueue(op.clone());
            ops.push(op);
        }
    }

    // ── Scheduling Iterations ──────────────────────────────────
    println!("  Running (max {max_iterations} iterations)...");
    let reports = engine.run_until_drained(max_iterations).await;

    for (i, report) in reports.iter().enumerate() {
        let paging = if report.paging_needed.is_empty() {
            String::new()
        } else {
            let devices: Vec<String> = report
                .paging_needed
                .iter()
                .map(|d| d.to_string())
                .collect();
            format!("  [paging needed: {}]", devices.join(", "))
        };
        println!(
            "   iter {:>3}: scheduled {:>4}{paging}",
            i + 1,
            report.scheduled,
        );
    }
    println!();

    engine.executor().join_all().await;

    // ── Summary ────────────────────────────────────────────────
    let total: usize = reports.iter().map(|r| r.scheduled).sum();
    let gpu_placed = ops
        .iter()
        .filter(|op| {
            op.placed_device()
                .is_some_and(|d| d.device_type == DeviceType::Gpu)
        })
        .count();
    let cpu_placed = ops
        .iter()
        .filter(|op| {
            op.placed_device()
                .is_some_and(|d| d.device_type == DeviceType::Cpu)
        })
        .count();
    let paging_iterations = reports
        .iter()
        .filter(|r| !r.paging_needed.is_empty())
        .count();

    println!("  Results:");
    println!("   Iterations:   {}", reports.len());
    println!("   Scheduled:    {total} ({gpu_placed} on GPU, {cpu_placed} on CPU)");
    println!("   Left queued:  {}", engine.total_queued());
    println!("   Paging iters: {paging_iterations}");
    println!();
    println!("  Ledger:");
    println!("   {}", engine.executor().store().stats().summary());

    if engine.total_queued() > 0 {
        anyhow::bail!(
            "workload did not drain within {max_iterations} iterations ({} ops left)",
            engine.total_queued(),
        );
    }
    Ok(())
}

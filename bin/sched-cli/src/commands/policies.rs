// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `sched policies` command: list registered scheduler policies.

use op_scheduler::SchedulerRegistry;

pub fn execute() -> anyhow::Result<()> {
    println!("Registered scheduler policies:");
    for name in SchedulerRegistry::global().names() {
        let blurb = match name.as_str() {
            "fifo" => "sessions in arrival order",
            "fair" => "fewest live reservations first",
            "pack" => "deepest backlog first",
            _ => "externally registered",
        };
        println!("  {name:<8} {blurb}");
    }
    Ok(())
}

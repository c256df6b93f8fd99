// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `sched config` command: print the default configuration as TOML.

use task_executor::EngineConfig;

pub fn execute() -> anyhow::Result<()> {
    let config = EngineConfig::default();
    print!("{}", config.to_toml()?);
    Ok(())
}

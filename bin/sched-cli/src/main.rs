// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # sched
//!
//! Command-line simulator for the GPU/CPU operation scheduler.
//!
//! ## Usage
//! ```bash
//! # Simulate a multi-session workload against bounded device pools
//! sched run --policy fair --sessions 4 --ops-per-session 16 --gpu-memory 1G
//!
//! # List registered scheduler policies
//! sched policies
//!
//! # Print the default configuration as TOML
//! sched config
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sched",
    about = "Resource-aware operation scheduler simulator",
    version
)]
struct Cli {
    /// Path to a TOML configuration file (overrides CLI arguments).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a synthetic multi-session workload through the scheduler.
    Run {
        /// Scheduler policy: fifo, fair, pack.
        #[arg(short, long, default_value = "fair")]
        policy: String,

        /// Number of concurrent sessions.
        #[arg(short, long, default_value_t = 4)]
        sessions: usize,

        /// Operations enqueued per session.
        #[arg(short, long, default_value_t = 16)]
        ops_per_session: usize,

        /// Per-operation GPU memory demand (e.g., "64M").
        #[arg(long, default_value = "64M")]
        gpu_demand: String,

        /// Per-operation CPU memory demand (e.g., "64M").
        #[arg(long, default_value = "64M")]
        cpu_demand: String,

        /// GPU memory pool (e.g., "1G").
        #[arg(long, default_value = "1G")]
        gpu_memory: String,

        /// CPU memory pool (e.g., "4G").
        #[arg(long, default_value = "4G")]
        cpu_memory: String,

        /// Maximum scheduling iterations before giving up.
        #[arg(long, default_value_t = 64)]
        max_iterations: usize,
    },

    /// List registered scheduler policies.
    Policies,

    /// Print the default configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            policy,
            sessions,
            ops_per_session,
            gpu_demand,
            cpu_demand,
            gpu_memory,
            cpu_memory,
            max_iterations,
        } => {
            commands::run::execute(
                cli.config,
                policy,
                sessions,
                ops_per_session,
                gpu_demand,
                cpu_demand,
                gpu_memory,
                cpu_memory,
                max_iterations,
            )
            .await
        }
        Commands::Policies => commands::policies::execute(),
        Commands::Config => commands::config::execute(),
    }
}

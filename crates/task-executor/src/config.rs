// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Engine configuration loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! policy = "fair"
//! max_hol_waiting = 50
//! gpu_memory = "8G"
//! gpu_compute_slots = 4
//! cpu_memory = "16G"
//! cpu_compute_slots = 16
//! ```

use crate::{ExecutorError, LocalExecutor, SchedulingEngine};
use op_scheduler::SchedulingParam;
use resource_ledger::{Capacity, DeviceSpec, ResourceTag, Resources};
use std::path::Path;
use std::sync::Arc;

/// Configuration for the scheduling engine and its device pools.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Scheduler policy name: `"fifo"`, `"fair"`, `"pack"`.
    #[serde(default = "default_policy")]
    pub policy: String,
    /// Head-of-line threshold before a stuck queue head is attempted alone.
    #[serde(default = "default_max_hol_waiting")]
    pub max_hol_waiting: u64,
    /// GPU memory pool (human-readable, e.g., `"8G"`).
    #[serde(default = "default_gpu_memory")]
    pub gpu_memory: String,
    /// GPU compute slots.
    #[serde(default = "default_gpu_compute_slots")]
    pub gpu_compute_slots: u64,
    /// CPU memory pool (human-readable, e.g., `"16G"`).
    #[serde(default = "default_cpu_memory")]
    pub cpu_memory: String,
    /// CPU compute slots.
    #[serde(default = "default_cpu_compute_slots")]
    pub cpu_compute_slots: u64,
}

fn default_policy() -> String {
    "fair".to_string()
}

fn default_max_hol_waiting() -> u64 {
    50
}

fn default_gpu_memory() -> String {
    "8G".to_string()
}

fn default_gpu_compute_slots() -> u64 {
    4
}

fn default_cpu_memory() -> String {
    "16G".to_string()
}

fn default_cpu_compute_slots() -> u64 {
    16
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ExecutorError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExecutorError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ExecutorError> {
        toml::from_str(toml_str)
            .map_err(|e| ExecutorError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ExecutorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExecutorError::Config(format!("TOML serialise error: {e}")))
    }

    /// Builds the store capacity for `GPU:0` and `CPU:0` from this config.
    pub fn capacity(&self) -> Result<Resources, ExecutorError> {
        let gpu_memory = Capacity::parse(&self.gpu_memory)?;
        let cpu_memory = Capacity::parse(&self.cpu_memory)?;

        Ok(Resources::new()
            .with(ResourceTag::memory(DeviceSpec::gpu(0)), gpu_memory.as_bytes())
            .with(ResourceTag::compute(DeviceSpec::gpu(0)), self.gpu_compute_slots)
            .with(ResourceTag::memory(DeviceSpec::cpu(0)), cpu_memory.as_bytes())
            .with(ResourceTag::compute(DeviceSpec::cpu(0)), self.cpu_compute_slots))
    }

    pub fn scheduling_param(&self) -> SchedulingParam {
        SchedulingParam {
            max_hol_waiting: self.max_hol_waiting,
        }
    }

    /// Builds the executor and engine this config describes.
    ///
    /// Must be called within a tokio runtime (the executor captures the
    /// ambient handle).
    pub fn create_engine(&self) -> Result<SchedulingEngine, ExecutorError> {
        let executor = Arc::new(LocalExecutor::new(self.capacity()?, self.scheduling_param()));
        SchedulingEngine::new(executor, &self.policy)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            max_hol_waiting: default_max_hol_waiting(),
            gpu_memory: default_gpu_memory(),
            gpu_compute_slots: default_gpu_compute_slots(),
            cpu_memory: default_cpu_memory(),
            cpu_compute_slots: default_cpu_compute_slots(),
        }
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Accelerator device identifiers.

use std::fmt;

/// The kind of compute device an operation can run on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum DeviceType {
    /// Host CPU.
    Cpu,
    /// CUDA-class accelerator.
    Gpu,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Cpu => write!(f, "CPU"),
            DeviceType::Gpu => write!(f, "GPU"),
        }
    }
}

/// A concrete device: a type plus an index within that type.
///
/// Equality is structural, so `DeviceSpec` works as a map key and can be
/// compared across subsystems.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct DeviceSpec {
    pub device_type: DeviceType,
    pub index: u32,
}

impl DeviceSpec {
    pub fn new(device_type: DeviceType, index: u32) -> Self {
        Self { device_type, index }
    }

    /// Shorthand for `GPU:index`.
    pub fn gpu(index: u32) -> Self {
        Self::new(DeviceType::Gpu, index)
    }

    /// Shorthand for `CPU:index`.
    pub fn cpu(index: u32) -> Self {
        Self::new(DeviceType::Cpu, index)
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device_type, self.index)
    }
}

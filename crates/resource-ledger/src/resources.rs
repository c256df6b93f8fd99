// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Typed resource usage maps.
//!
//! A [`Resources`] value maps [`ResourceTag`]s (a resource kind on a
//! concrete device, e.g. memory on `GPU:0`) to non-negative amounts.
//! An absent tag is equivalent to an amount of zero, and the map never
//! stores zero entries, so two maps describing the same demand compare
//! equal regardless of how they were built.
//!
//! Subtraction saturates at zero and reports the per-tag underflow as a
//! separate `missing` map. The scheduler records those missing maps to
//! decide whether a device has run out of memory.

use crate::DeviceSpec;
use std::collections::BTreeMap;
use std::fmt;

/// What is being accounted: bytes of device memory or compute slots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum ResourceKind {
    Memory,
    Compute,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Memory => write!(f, "MEMORY"),
            ResourceKind::Compute => write!(f, "COMPUTE"),
        }
    }
}

/// A resource kind pinned to a concrete device. Equality is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceTag {
    pub kind: ResourceKind,
    pub device: DeviceSpec,
}

impl ResourceTag {
    pub fn new(kind: ResourceKind, device: DeviceSpec) -> Self {
        Self { kind, device }
    }

    pub fn memory(device: DeviceSpec) -> Self {
        Self::new(ResourceKind::Memory, device)
    }

    pub fn compute(device: DeviceSpec) -> Self {
        Self::new(ResourceKind::Compute, device)
    }
}

impl fmt::Display for ResourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind, self.device)
    }
}

/// A map from [`ResourceTag`] to a non-negative amount.
///
/// # Example
/// ```
/// use resource_ledger::{DeviceSpec, Resources, ResourceTag};
///
/// let mut free = Resources::memory(DeviceSpec::gpu(0), 1000);
/// let demand = Resources::memory(DeviceSpec::gpu(0), 300);
///
/// assert!(free.covers(&demand));
/// let missing = free.deduct_saturating(&demand);
/// assert!(missing.is_empty());
/// assert_eq!(free.get(&ResourceTag::memory(DeviceSpec::gpu(0))), 700);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resources {
    entries: BTreeMap<ResourceTag, u64>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-entry map: `bytes` of memory on `device`.
    pub fn memory(device: DeviceSpec, bytes: u64) -> Self {
        Self::new().with(ResourceTag::memory(device), bytes)
    }

    /// Single-entry map: `slots` of compute on `device`.
    pub fn compute(device: DeviceSpec, slots: u64) -> Self {
        Self::new().with(ResourceTag::compute(device), slots)
    }

    /// Builder-style insert. Zero amounts are dropped.
    pub fn with(mut self, tag: ResourceTag, amount: u64) -> Self {
        self.set(tag, amount);
        self
    }

    /// Returns the amount for `tag`; absent tags read as zero.
    pub fn get(&self, tag: &ResourceTag) -> u64 {
        self.entries.get(tag).copied().unwrap_or(0)
    }

    /// Sets the amount for `tag`. Setting zero removes the entry.
    pub fn set(&mut self, tag: ResourceTag, amount: u64) {
        if amount == 0 {
            self.entries.remove(&tag);
        } else {
            self.entries.insert(tag, amount);
        }
    }

    /// Adds every entry of `other` into `self`.
    pub fn add_assign(&mut self, other: &Resources) {
        for (tag, amount) in &other.entries {
            let total = self.get(tag).saturating_add(*amount);
            self.set(*tag, total);
        }
    }

    /// Subtracts `other` from `self`, saturating each entry at zero.
    ///
    /// Returns the `missing` map: for every tag where `other` demanded more
    /// than `self` held, the shortfall amount.
    pub fn deduct_saturating(&mut self, other: &Resources) -> Resources {
        let mut missing = Resources::new();
        for (tag, demanded) in &other.entries {
            let held = self.get(tag);
            if *demanded > held {
                missing.set(*tag, demanded - held);
                self.set(*tag, 0);
            } else {
                self.set(*tag, held - demanded);
            }
        }
        missing
    }

    /// True if `self` holds at least `demand` for every tag.
    pub fn covers(&self, demand: &Resources) -> bool {
        demand
            .entries
            .iter()
            .all(|(tag, amount)| self.get(tag) >= *amount)
    }

    /// The per-tag shortfall of `self` against `demand`, without mutation.
    pub fn missing_for(&self, demand: &Resources) -> Resources {
        let mut missing = Resources::new();
        for (tag, amount) in &demand.entries {
            let held = self.get(tag);
            if *amount > held {
                missing.set(*tag, amount - held);
            }
        }
        missing
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceTag, &u64)> {
        self.entries.iter()
    }

    /// Distinct devices mentioned by any tag, in tag order.
    pub fn devices(&self) -> Vec<DeviceSpec> {
        let mut devices: Vec<DeviceSpec> = self.entries.keys().map(|t| t.device).collect();
        devices.sort();
        devices.dedup();
        devices
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (tag, amount)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{tag}: {amount}")?;
        }
        write!(f, "}}")
    }
}

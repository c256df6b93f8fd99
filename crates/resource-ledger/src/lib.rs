// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # resource-ledger
//!
//! Typed per-device resource accounting for a shared GPU/CPU execution
//! platform, with RAII reservation contexts.
//!
//! # Key Components
//!
//! - [`DeviceSpec`] / [`ResourceTag`] — a resource kind (memory, compute)
//!   pinned to a concrete device (`GPU:0`, `CPU:0`).
//! - [`Resources`] — a tag → amount map with saturating subtraction that
//!   reports per-tag shortfalls (`missing` maps).
//! - [`AllocationStore`] — the accounting store: atomic all-or-nothing
//!   reservations across heterogeneous tags, statistics, and monotonic
//!   [`Ticket`]s.
//! - [`ResourceContext`] — an RAII reservation handle. When a context is
//!   dropped its usage is automatically returned to the store; the borrow
//!   checker guarantees exactly-once release.
//! - [`Capacity`] — human-readable byte-size parsing (`"512M"`, `"8G"`)
//!   for configuring device pools.
//!
//! # Ownership Model
//!
//! ```text
//! AllocationStore::try_reserve(usage)
//!       │
//!       ▼
//!   ResourceContext  ◄─── owns the reserved amounts, holds Arc<StoreInner>
//!       │
//!       │  drop()
//!       ▼
//!   StoreInner::release_usage()  ──► free map
//! ```
//!
//! The store hands out contexts; each context holds an `Arc` back to the
//! store's inner state. On drop, the context adds its usage back to the
//! free map. A context granted to the scheduler is moved into the
//! operation during `prepare` and dropped by the executor on completion,
//! so every early-return path in the scheduler releases the reservation
//! without bookkeeping code.

mod capacity;
mod context;
mod device;
mod error;
mod resources;
pub mod store;
mod stats;

pub use capacity::Capacity;
pub use context::{ResourceContext, Ticket};
pub use device::{DeviceSpec, DeviceType};
pub use error::LedgerError;
pub use resources::{ResourceKind, ResourceTag, Resources};
pub use stats::LedgerStats;
pub use store::AllocationStore;

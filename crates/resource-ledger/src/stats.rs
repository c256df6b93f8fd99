// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Accounting statistics for profiling and diagnostics.
//!
//! [`LedgerStats`] tracks cumulative metrics about reservation traffic:
//! grant/reject counts and how many reservations are live at once. The
//! live-context count is the primary leak detector — after a workload
//! quiesces it must return to zero.

/// Cumulative statistics about reservation traffic through an
/// [`AllocationStore`](crate::AllocationStore).
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct LedgerStats {
    /// Total number of reservation requests.
    pub total_requests: u64,
    /// Requests that were granted.
    pub granted: u64,
    /// Requests rejected for insufficient free resources.
    pub rejected: u64,
    /// Reservations returned (context drops).
    pub released: u64,
    /// Reservations currently live (granted, not yet released).
    pub live_contexts: u64,
    /// High-water mark of simultaneously live reservations.
    pub peak_live_contexts: u64,
}

impl LedgerStats {
    /// Fraction of requests that were rejected, in `[0.0, 1.0]`.
    pub fn rejection_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.rejected as f64 / self.total_requests as f64
    }

    pub(crate) fn record_grant(&mut self) {
        self.total_requests += 1;
        self.granted += 1;
        self.live_contexts += 1;
        if self.live_contexts > self.peak_live_contexts {
            self.peak_live_contexts = self.live_contexts;
        }
    }

    pub(crate) fn record_reject(&mut self) {
        self.total_requests += 1;
        self.rejected += 1;
    }

    pub(crate) fn record_release(&mut self) {
        self.released += 1;
        self.live_contexts = self.live_contexts.saturating_sub(1);
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Reservations: {} requests ({} granted, {} rejected, {:.0}% reject rate), \
             {} live, peak {}, {} released",
            self.total_requests,
            self.granted,
            self.rejected,
            self.rejection_ratio() * 100.0,
            self.live_contexts,
            self.peak_live_contexts,
            self.released,
        )
    }
}

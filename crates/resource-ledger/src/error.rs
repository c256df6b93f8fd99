// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for resource accounting.

use crate::Resources;

/// Errors that can occur during resource accounting.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A reservation could not be granted. `missing` records, per tag, how
    /// much demand exceeded the free amount.
    #[error("insufficient resources: missing {missing}")]
    InsufficientResources { missing: Resources },

    /// A capacity string could not be parsed.
    #[error("invalid capacity '{input}': {reason}")]
    InvalidCapacity { input: String, reason: String },
}

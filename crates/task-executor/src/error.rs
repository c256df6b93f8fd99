// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the executor and engine.

/// Errors that can occur while building or driving the scheduling engine.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The configured policy name is not in the registry.
    #[error("unknown scheduler policy '{name}'; expected one of: {known}")]
    UnknownPolicy { name: String, known: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Resource accounting error.
    #[error("ledger error: {0}")]
    Ledger(#[from] resource_ledger::LedgerError),
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wandler — Core types, MIME table, and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod error_report;
pub mod mime;
pub mod types;

pub use config::{EngineConfig, PassthroughPolicy};
pub use error::{ErrorKind, Result, ValidationKind, WandlerError};
pub use mime::MimeRegistry;
pub use types::*;

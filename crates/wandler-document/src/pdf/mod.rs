// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page arena, page assembly, range grammar, overlays, metadata,
// and the editor operations built on top of them.

pub mod assemble;
pub mod document;
pub mod editor;
pub mod metadata;
pub mod overlay;
pub mod range;

#[cfg(test)]
pub(crate) mod fixture;

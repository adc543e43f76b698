// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Archive packer — the packing fallback for archive targets.
//
// None of these outputs is a real archive. `zip` uses a simple length-prefixed
// layout; every other archive target is the plain concatenation of the inputs.

use tracing::debug;
use wandler_core::InputFile;

/// Archive targets routed here by the dispatcher.
pub const ARCHIVE_TARGETS: [&str; 3] = ["zip", "tar", "7z"];

/// Pack `files` for `format`.
///
/// For `zip`, each file becomes: name length (u32 LE), content length
/// (u32 LE), UTF-8 name, content.
pub fn pack(files: &[&InputFile], format: &str) -> Vec<u8> {
    let total: usize = files.iter().map(|f| f.len() + f.name().len() + 8).sum();
    let mut out = Vec::with_capacity(total);

    if format.eq_ignore_ascii_case("zip") {
        for file in files {
            let name = file.name().as_bytes();
            out.extend_from_slice(&(name.len() as u32).to_le_bytes());
            out.extend_from_slice(&(file.len() as u32).to_le_bytes());
            out.extend_from_slice(name);
            out.extend_from_slice(file.bytes());
        }
    } else {
        for file in files {
            out.extend_from_slice(file.bytes());
        }
    }

    debug!(format, files = files.len(), packed_bytes = out.len(), "Files packed");
    out
}

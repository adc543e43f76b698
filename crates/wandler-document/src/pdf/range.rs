// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range grammar: comma-separated `N` or `A-B` tokens.

use std::collections::BTreeSet;

use wandler_core::error::{Result, WandlerError};

/// Parse a range string such as `1-5,7,9-12` against a document of `total`
/// pages.
///
/// A dash range runs from `A` to `min(B, total)`; every page is then
/// restricted to `[1, total]`, so out-of-range pages are dropped rather than
/// rejected. The result is ascending and free of duplicates. Blank tokens are
/// skipped; a token that is not a number or a dash range is an error.
pub fn parse_page_range(spec: &str, total: u32) -> Result<Vec<u32>> {
    let mut pages = BTreeSet::new();

    for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_bound(start, token)?;
                let end = parse_bound(end, token)?.min(total);
                pages.extend((start.max(1)..=end).filter(|&p| p <= total));
            }
            None => {
                let page = parse_bound(token, token)?;
                if (1..=total).contains(&page) {
                    pages.insert(page);
                }
            }
        }
    }

    Ok(pages.into_iter().collect())
}

fn parse_bound(value: &str, token: &str) -> Result<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| WandlerError::InvalidPageRange(format!("'{token}' is not a page or range")))
}

/// Derive the output name fragment for a range: `1-3,5` → `1_3_5`.
pub fn range_slug(spec: &str) -> String {
    spec.replace(['-', ','], "_")
}

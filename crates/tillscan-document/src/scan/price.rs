// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Priced-line filter — keeps recognised lines that contain a decimal number.

use regex::Regex;
use tillscan_core::config::DEFAULT_PRICE_PATTERN;
use tillscan_core::error::{Result, TillscanError};

/// Selects receipt lines that carry a price.
///
/// A line qualifies when the pattern matches anywhere in it; the match is an
/// existence test and the number itself is never parsed. With the default
/// pattern (`[0-9]+\.[0-9]+`) `"Milk 3.49"` and `"12.5.3"` qualify while
/// `"Qty: 3"` does not.
#[derive(Debug, Clone)]
pub struct PriceFilter {
    pattern: Regex,
}

impl PriceFilter {
    /// Build a filter from a custom regular expression.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|err| {
            TillscanError::InvalidConfig(format!("invalid price pattern {pattern:?}: {err}"))
        })?;
        Ok(Self { pattern })
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Whether `line` contains a price token.
    pub fn is_priced(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    /// Lazily yield the priced lines of `text` in their original order.
    ///
    /// `text` is split on `\n`; a trailing `\r` is trimmed from each line.
    /// Empty text yields nothing.
    pub fn filter<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        text.split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(move |line| self.is_priced(line))
    }
}

impl Default for PriceFilter {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_PRICE_PATTERN).expect("default price pattern is valid"),
        }
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rendering of scan results for stdout.

use std::fmt::Write;

/// The two labelled sections: raw recognised text, then the priced lines.
pub fn render_sections<'a>(raw_text: &str, priced: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    section(&mut out, "[INFO] raw output:");
    out.push_str(raw_text);
    // Two blank lines separate the raw text from the price section.
    out.push_str("\n\n\n");

    section(&mut out, "[INFO] price line items:");
    for line in priced {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{line}");
    }
    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.len()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_match_expected_layout() {
        let text = render_sections("SHOP\nMilk 3.49", ["Milk 3.49"]);
        assert_eq!(
            text,
            "[INFO] raw output:\n\
             ==================\n\
             SHOP\nMilk 3.49\n\
             \n\
             \n\
             [INFO] price line items:\n\
             ========================\n\
             Milk 3.49\n"
        );
    }

    #[test]
    fn empty_text_still_prints_headers() {
        let text = render_sections("", std::iter::empty());
        assert!(text.starts_with("[INFO] raw output:\n==================\n"));
        assert!(text.ends_with("[INFO] price line items:\n========================\n"));
    }
}

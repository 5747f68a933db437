//! Fixture builders and outline diffing shared by replay tests and benches.

pub mod fixtures;

pub use crate::fixtures::*;

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let max = expected.len().max(actual.len());
    let mut out = String::new();
    use std::fmt::Write;
    let missing = "<missing>";
    let line = |lines: &[String], i: usize| -> String {
        lines
            .get(i)
            .map(|l| escape_text(l))
            .unwrap_or_else(|| missing.to_string())
    };
    let mismatch = (0..max).find(|&i| expected.get(i) != actual.get(i));
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for line_idx in start..end {
            let marker = if line_idx == i { ">" } else { " " };
            let _ = writeln!(
                &mut out,
                "{marker} {:>4}  expected: {}",
                line_idx + 1,
                line(expected, line_idx)
            );
            let _ = writeln!(
                &mut out,
                "{marker} {:>4}    actual: {}",
                line_idx + 1,
                line(actual, line_idx)
            );
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

/// Panics with a line diff when two outlines differ.
#[track_caller]
pub fn assert_outline_eq(expected: &[String], actual: &[String]) {
    if expected != actual {
        panic!("outline mismatch\n{}", diff_lines(expected, actual));
    }
}

/// Owned lines from string literals.
pub fn lines(input: &[&str]) -> Vec<String> {
    input.iter().map(|l| l.to_string()).collect()
}

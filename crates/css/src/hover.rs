//! Hover emulation for replayed stylesheets.
//!
//! A replayed page never receives real pointer focus, so every `X:hover`
//! selector gets a twin `X.__hover_marker` that the sink can toggle with a
//! class. The rewrite is idempotent and leaves escaped `\:hover` alone.

use crate::syntax::{scan_preludes, split_selector_list};
use memchr::memmem;

pub const HOVER_MARKER_CLASS: &str = "__hover_marker";

const HOVER: &[u8] = b":hover";

pub fn rewrite_hover_selectors(css: &str) -> String {
    if memmem::find(css.as_bytes(), HOVER).is_none() {
        return css.to_string();
    }
    let mut out = String::with_capacity(css.len() + 32);
    let mut copied = 0usize;
    for prelude in scan_preludes(css) {
        if prelude.at_rule {
            continue;
        }
        let text = &css[prelude.range.clone()];
        let Some(rewritten) = rewrite_selector_list(text) else {
            continue;
        };
        out.push_str(&css[copied..prelude.range.start]);
        out.push_str(&rewritten);
        copied = prelude.range.end;
    }
    out.push_str(&css[copied..]);
    out
}

// Returns `None` when the list needs no new selectors.
fn rewrite_selector_list(list: &str) -> Option<String> {
    let selectors = split_selector_list(list);
    let mut extra: Vec<String> = Vec::new();
    for selector in &selectors {
        let Some(marker) = marker_selector(selector) else {
            continue;
        };
        if selectors.iter().any(|s| *s == marker) || extra.contains(&marker) {
            continue;
        }
        extra.push(marker);
    }
    if extra.is_empty() {
        return None;
    }
    let trimmed = list.trim_end();
    let trailing = &list[trimmed.len()..];
    let mut out = String::with_capacity(list.len() + extra.iter().map(|s| s.len() + 2).sum::<usize>());
    out.push_str(trimmed);
    for marker in extra {
        out.push_str(", ");
        out.push_str(&marker);
    }
    out.push_str(trailing);
    Some(out)
}

// "a:hover > b:hover" -> "a.__hover_marker > b.__hover_marker"
fn marker_selector(selector: &str) -> Option<String> {
    let bytes = selector.as_bytes();
    let mut out = String::with_capacity(selector.len() + 16);
    let mut copied = 0usize;
    let mut replaced = false;
    for pos in memmem::find_iter(bytes, HOVER) {
        let escaped = pos > 0 && bytes[pos - 1] == b'\\';
        let pseudo_element = pos > 0 && bytes[pos - 1] == b':';
        let continues = bytes
            .get(pos + HOVER.len())
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_');
        if escaped || pseudo_element || continues {
            continue;
        }
        out.push_str(&selector[copied..pos]);
        out.push('.');
        out.push_str(HOVER_MARKER_CLASS);
        copied = pos + HOVER.len();
        replaced = true;
    }
    if !replaced {
        return None;
    }
    out.push_str(&selector[copied..]);
    Some(out)
}

use std::ops::Range;

// The text in front of a `{`: a selector list, or an at-rule header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prelude {
    pub range: Range<usize>,
    pub at_rule: bool,
}

// input: "a:hover { color: red } @media print { p { margin: 0 } }"
// output: [" a:hover ", "@media print ", " p "] as byte ranges into the input
pub fn scan_preludes(input: &str) -> Vec<Prelude> {
    let bytes = input.as_bytes();
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                // comments never end a prelude, skip to the closing marker
                let leading = input[start..i].trim().is_empty();
                i = match memchr::memmem::find(&bytes[i + 2..], b"*/") {
                    Some(rel) => i + 2 + rel + 2,
                    None => bytes.len(),
                };
                if leading {
                    start = i;
                }
                continue;
            }
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'{' => {
                let text = input[start..i].trim_start();
                out.push(Prelude {
                    range: start..i,
                    at_rule: text.starts_with('@'),
                });
                start = i + 1;
            }
            b'}' | b';' => start = i + 1,
            _ => {}
        }
        i += 1;
    }
    out
}

// input: "a:hover, :is(b, c) > d"
// output: ["a:hover", ":is(b, c) > d"]
pub fn split_selector_list(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in list.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(list[start..].trim());
    parts.retain(|s| !s.is_empty());
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preludes_include_nested_rules() {
        let css = "a:hover { color: red } @media print { p { margin: 0; } }";
        let found: Vec<&str> = scan_preludes(css)
            .iter()
            .map(|p| css[p.range.clone()].trim())
            .collect();
        assert_eq!(found, vec!["a:hover", "@media print", "p"]);
        assert!(scan_preludes(css)[1].at_rule);
    }

    #[test]
    fn braces_inside_strings_and_comments_are_ignored() {
        let css = "/* x { */ a::after { content: \"{\" } b { }";
        let found: Vec<&str> = scan_preludes(css)
            .iter()
            .map(|p| css[p.range.clone()].trim())
            .collect();
        assert_eq!(found, vec!["a::after", "b"]);
    }

    #[test]
    fn selector_list_split_respects_parens() {
        assert_eq!(
            split_selector_list("a:hover, :is(b, c) > d ,"),
            vec!["a:hover", ":is(b, c) > d"]
        );
    }
}

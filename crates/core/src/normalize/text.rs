//! Text cleanup for upstream narrative fields.

/// Remove fenced code blocks (```...```). An unclosed fence drops the rest.
pub fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("```") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 3..];
        match after_open.find("```") {
            Some(end) => rest = &after_open[end + 3..],
            None => {
                rest = "";
                break;
            }
        }
        out.push(' ');
    }
    out.push_str(rest);
    out
}

/// Remove balanced `{...}` spans, and `[...]` spans that parse as JSON.
///
/// Brace matching ignores braces inside double-quoted strings.
pub fn strip_json_dumps(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut copied_to = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c == b'{' || c == b'[' {
            if let Some(end) = balanced_end(bytes, i) {
                let span = &text[i..=end];
                let drop = c == b'{' || serde_json::from_str::<serde_json::Value>(span).is_ok();
                if drop {
                    out.push_str(&text[copied_to..i]);
                    out.push(' ');
                    i = end + 1;
                    copied_to = i;
                    continue;
                }
            }
        }
        i += 1;
    }
    out.push_str(&text[copied_to..]);
    out
}

fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &c) in bytes[start..].iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split prose into sentences ending in `.`, `!` or `?` followed by
/// whitespace or end of text. A trailing fragment counts as a sentence.
pub fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_boundary {
                let end = idx + c.len_utf8();
                let s = text[start..end].trim();
                if !s.is_empty() {
                    out.push(s);
                }
                start = end;
            }
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

/// Strip code blocks and JSON dumps, then keep the first `max` sentences
/// longer than `min_chars` characters.
pub fn summarize_rationale(text: &str, max: usize, min_chars: usize) -> String {
    let cleaned = collapse_whitespace(&strip_json_dumps(&strip_code_fences(text)));
    sentences(&cleaned)
        .into_iter()
        .filter(|s| s.chars().count() > min_chars)
        .take(max)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trim and fold runs of blank lines; paragraph breaks survive.
pub fn light_cleanup(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let mut out = String::with_capacity(normalized.len());
    let mut blank_run = 0;
    for line in normalized.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        blank_run = 0;
        out.push_str(line);
    }
    out.trim().to_string()
}

/// Best-effort split of `"VTI (Total Market)"` into `("VTI", "Total Market")`.
///
/// The symbol is the leading token up to the first whitespace or `(`, with
/// trailing punctuation removed. The label is the parenthetical if present,
/// otherwise the remaining text. Multi-word symbols are not recognised.
pub fn parse_leading_ticker(entry: &str) -> (String, String) {
    let entry = entry.trim();
    let token_end = entry
        .find(|c: char| c.is_whitespace() || c == '(')
        .unwrap_or(entry.len());
    let symbol = entry[..token_end]
        .trim_end_matches(|c: char| matches!(c, ':' | '-' | ',' | '.' | ';'))
        .to_string();
    let rest = entry[token_end..].trim();

    let label = match (rest.find('('), rest.rfind(')')) {
        (Some(open), Some(close)) if close > open => rest[open + 1..close].trim().to_string(),
        _ => rest
            .trim_start_matches(|c: char| matches!(c, ':' | '-' | '–' | '—' | ','))
            .trim()
            .to_string(),
    };

    if symbol.is_empty() {
        return (entry.to_string(), label);
    }
    (symbol, label)
}

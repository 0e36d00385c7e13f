//! Character-level, single-pass scanners for the two small-but-hot JSON
//! columns on the per-record path (`miscProperties`, `qualityAssertions`).
//!
//! These deliberately do not build a `serde_json::Value` tree — a generic
//! parse-to-tree approach dominates a profile on a path this hot. Each
//! scanner walks the input exactly once, tracking JSON string escape
//! state, and invokes a caller-supplied callback per item.

/// Scans a flat JSON object literal (`{"name": value, ...}`) and invokes
/// `callback(name, raw_value)` for each top-level member. `raw_value` is
/// the member's value exactly as it appears in the source: unquoted and
/// unescaped for strings, the literal text for numbers/booleans/null.
/// Nested objects/arrays are passed through as their raw (still-encoded)
/// text. Malformed input simply yields fewer/no callbacks; it never
/// panics.
pub fn scan_object_shallow(json: &str, mut callback: impl FnMut(&str, &str)) {
    let bytes = json.as_bytes();
    let mut i = 0usize;
    let len = bytes.len();

    i = skip_ws(bytes, i);
    if i >= len || bytes[i] != b'{' {
        return;
    }
    i += 1;

    loop {
        i = skip_ws(bytes, i);
        if i >= len {
            return;
        }
        if bytes[i] == b'}' {
            return;
        }
        if bytes[i] == b',' {
            i += 1;
            continue;
        }
        if bytes[i] != b'"' {
            return;
        }

        let (key, next) = match scan_string(json, i) {
            Some(v) => v,
            None => return,
        };
        i = skip_ws(bytes, next);
        if i >= len || bytes[i] != b':' {
            return;
        }
        i += 1;
        i = skip_ws(bytes, i);
        if i >= len {
            return;
        }

        let (value, next) = match scan_value(json, i) {
            Some(v) => v,
            None => return,
        };
        callback(&key, &value);
        i = next;
    }
}

/// Scans a JSON array of objects (`[{"code":101,"name":"X","qaStatus":0}, ...]`)
/// and invokes `callback(code, qa_status)` for each element that carries
/// both a numeric `code` and a `qaStatus` of `0` or `1`. Other members of
/// each object (e.g. `name`) are skipped without allocation.
pub fn scan_quality_assertions(json: &str, mut callback: impl FnMut(i64, u8)) {
    let bytes = json.as_bytes();
    let mut i = 0usize;
    let len = bytes.len();

    i = skip_ws(bytes, i);
    if i >= len || bytes[i] != b'[' {
        return;
    }
    i += 1;

    loop {
        i = skip_ws(bytes, i);
        if i >= len {
            return;
        }
        if bytes[i] == b']' {
            return;
        }
        if bytes[i] == b',' {
            i += 1;
            continue;
        }
        if bytes[i] != b'{' {
            return;
        }

        let mut code: Option<i64> = None;
        let mut qa_status: Option<u8> = None;
        let next = scan_assertion_object(json, i, &mut code, &mut qa_status);
        i = match next {
            Some(next) => next,
            None => return,
        };

        if let (Some(code), Some(qa_status)) = (code, qa_status) {
            callback(code, qa_status);
        }
    }
}

fn scan_assertion_object(
    json: &str,
    start: usize,
    code: &mut Option<i64>,
    qa_status: &mut Option<u8>,
) -> Option<usize> {
    let bytes = json.as_bytes();
    let len = bytes.len();
    let mut i = start;
    debug_assert_eq!(bytes[i], b'{');
    i += 1;

    loop {
        i = skip_ws(bytes, i);
        if i >= len {
            return None;
        }
        if bytes[i] == b'}' {
            return Some(i + 1);
        }
        if bytes[i] == b',' {
            i += 1;
            continue;
        }
        if bytes[i] != b'"' {
            return None;
        }

        let (key, next) = scan_string(json, i)?;
        i = skip_ws(bytes, next);
        if i >= len || bytes[i] != b':' {
            return None;
        }
        i += 1;
        i = skip_ws(bytes, i);
        let (value, next) = scan_value(json, i)?;
        i = next;

        match key.as_str() {
            "code" => *code = value.parse().ok(),
            "qaStatus" => *qa_status = value.parse().ok(),
            _ => {}
        }
    }
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Scans one JSON value starting at `start` (which must not be whitespace).
/// Returns the value's text (unescaped, if it is a string) and the index
/// just past it.
fn scan_value(json: &str, start: usize) -> Option<(String, usize)> {
    let bytes = json.as_bytes();
    match bytes.get(start)? {
        b'"' => scan_string(json, start),
        b'{' => scan_balanced(json, start, b'{', b'}'),
        b'[' => scan_balanced(json, start, b'[', b']'),
        _ => scan_literal(json, start),
    }
}

/// Scans a JSON string literal starting at the opening quote, unescaping
/// it only if a backslash was actually seen in the span (the common case
/// for simple scalar values is no escape, which avoids an allocation-heavy
/// rebuild).
fn scan_string(json: &str, start: usize) -> Option<(String, usize)> {
    let bytes = json.as_bytes();
    debug_assert_eq!(bytes[start], b'"');
    let mut i = start + 1;
    let content_start = i;
    let mut saw_escape = false;

    loop {
        let b = *bytes.get(i)?;
        if b == b'\\' {
            saw_escape = true;
            i += 2;
            continue;
        }
        if b == b'"' {
            break;
        }
        i += 1;
    }

    let raw = &json[content_start..i];
    let value = if saw_escape {
        unescape(raw)
    } else {
        raw.to_string()
    };
    Some((value, i + 1))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if let Ok(code) = u32::from_str_radix(&hex, 16) {
                    if let Some(ch) = char::from_u32(code) {
                        out.push(ch);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Scans a non-string, non-container literal (number, `true`, `false`,
/// `null`) — anything up to the next structural character.
fn scan_literal(json: &str, start: usize) -> Option<(String, usize)> {
    let bytes = json.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b',' | b'}' | b']' => break,
            b if b.is_ascii_whitespace() => break,
            _ => i += 1,
        }
    }
    if i == start {
        return None;
    }
    Some((json[start..i].to_string(), i))
}

/// Scans a balanced `{...}`/`[...]` span, honoring string escape state so
/// braces/brackets inside string values don't confuse the depth count.
/// Returns the raw (still-encoded) text of the span.
fn scan_balanced(json: &str, start: usize, open: u8, close: u8) -> Option<(String, usize)> {
    let bytes = json.as_bytes();
    let mut depth = 0i32;
    let mut i = start;
    let mut in_string = false;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' => in_string = true,
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some((json[start..=i].to_string(), i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_flat_misc_properties() {
        let mut seen = Vec::new();
        scan_object_shallow(r#"{"a": "1", "b": 2, "c": true}"#, |k, v| {
            seen.push((k.to_string(), v.to_string()))
        });
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("c".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn unescapes_only_when_backslash_present() {
        let mut seen = Vec::new();
        scan_object_shallow(r#"{"plain": "no escapes here", "esc": "line\nbreak"}"#, |k, v| {
            seen.push((k.to_string(), v.to_string()))
        });
        assert_eq!(seen[0].1, "no escapes here");
        assert_eq!(seen[1].1, "line\nbreak");
    }

    #[test]
    fn scans_quality_assertions_array() {
        let mut seen = Vec::new();
        scan_quality_assertions(
            r#"[{"code":101,"name":"MISSING_GEODETIC_DATUM","qaStatus":0},
               {"code":50,"name":"NAME_NOT_RECOGNISED","qaStatus":1}]"#,
            |code, status| seen.push((code, status)),
        );
        assert_eq!(seen, vec![(101, 0), (50, 1)]);
    }

    #[test]
    fn empty_array_yields_nothing() {
        let mut count = 0;
        scan_quality_assertions("[]", |_, _| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn malformed_input_does_not_panic() {
        let mut count = 0;
        scan_object_shallow("{not json", |_, _| count += 1);
        scan_quality_assertions("[{\"code\":1", |_, _| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn nested_braces_in_string_do_not_confuse_depth() {
        let mut seen = Vec::new();
        scan_object_shallow(r#"{"note": "contains } and { chars"}"#, |k, v| {
            seen.push((k.to_string(), v.to_string()))
        });
        assert_eq!(seen, vec![("note".to_string(), "contains } and { chars".to_string())]);
    }
}

//! Frontmatter parsing.
//!
//! A content file may start with a metadata block delimited by lines of
//! exactly `---`, holding `key: value` lines. Values that look like
//! booleans or numbers are coerced; quoted values are unquoted; everything
//! else stays a string. A malformed block is never fatal.

use serde_json::Value;

use super::JsonMap;

const DELIMITER: &str = "---";

/// A discarded metadata block. Never fatal: `body` is what processing
/// continues with, `reason` feeds the diagnostic.
#[derive(Debug)]
pub struct FrontmatterError {
    pub reason: String,
    pub body: String,
}

/// Split an optional leading frontmatter block from `source`.
///
/// Returns the parsed metadata and the body with the block stripped. A
/// missing block is not an error; a malformed one is reported with the
/// stripped-or-original body so the caller can degrade and continue.
pub fn split_frontmatter(source: &str) -> Result<(JsonMap, String), FrontmatterError> {
    let Some(rest) = strip_opening_delimiter(source) else {
        return Ok((JsonMap::new(), source.to_string()));
    };

    let Some((block, body)) = split_closing_delimiter(rest) else {
        return Err(FrontmatterError {
            reason: "unterminated metadata block".to_string(),
            body: source.to_string(),
        });
    };

    let mut meta = JsonMap::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(FrontmatterError {
                reason: format!("metadata line without `:` separator: `{line}`"),
                body: body.to_string(),
            });
        };
        meta.insert(key.trim().to_string(), coerce_value(value.trim()));
    }

    Ok((meta, body.to_string()))
}

/// Match the opening `---` line and return the remainder.
fn strip_opening_delimiter(source: &str) -> Option<&str> {
    let rest = source.strip_prefix(DELIMITER)?;
    let rest = rest.strip_prefix('\r').unwrap_or(rest);
    rest.strip_prefix('\n')
}

/// Split the block at the closing `---` line.
fn split_closing_delimiter(rest: &str) -> Option<(&str, &str)> {
    for (idx, _) in rest.match_indices('\n') {
        let before = &rest[..idx];
        let line_start = before.rfind('\n').map(|p| p + 1).unwrap_or(0);
        if rest[line_start..idx].trim_end_matches('\r') == DELIMITER {
            let body = rest[idx + 1..].trim_start_matches(['\r', '\n']);
            return Some((&rest[..line_start], body));
        }
    }
    // Closing delimiter as the very last line without trailing newline
    let line_start = rest.rfind('\n').map(|p| p + 1).unwrap_or(0);
    if rest[line_start..].trim_end_matches('\r') == DELIMITER {
        return Some((&rest[..line_start], ""));
    }
    None
}

/// Coerce a raw frontmatter value to bool/number when it looks like a
/// literal; strings otherwise. Quoted values stay strings verbatim.
fn coerce_value(raw: &str) -> Value {
    if raw.len() >= 2 {
        let bytes = raw.as_bytes();
        if (bytes[0] == b'"' && bytes[raw.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[raw.len() - 1] == b'\'')
        {
            return Value::String(raw[1..raw.len() - 1].to_string());
        }
    }

    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = raw.parse::<f64>()
        && let Some(n) = serde_json::Number::from_f64(f)
    {
        return Value::Number(n);
    }

    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercion_round_trip() {
        let src = "---\ntitle: Test\npublished: true\norder: 5\n---\n# Body\n";
        let (meta, body) = split_frontmatter(src).unwrap();

        assert_eq!(meta.get("title"), Some(&Value::String("Test".into())));
        assert_eq!(meta.get("published"), Some(&Value::Bool(true)));
        assert_eq!(meta.get("order"), Some(&Value::Number(5.into())));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn test_key_order_preserved() {
        let src = "---\nzebra: 1\nalpha: 2\nmid: 3\n---\nbody";
        let (meta, _) = split_frontmatter(src).unwrap();
        let keys: Vec<_> = meta.keys().cloned().collect();
        assert_eq!(keys, vec!["zebra", "alpha", "mid"]);
    }

    #[test]
    fn test_quoted_values_stay_strings() {
        let src = "---\ncount: \"5\"\nflag: 'true'\n---\n";
        let (meta, _) = split_frontmatter(src).unwrap();
        assert_eq!(meta.get("count"), Some(&Value::String("5".into())));
        assert_eq!(meta.get("flag"), Some(&Value::String("true".into())));
    }

    #[test]
    fn test_float_coercion() {
        let src = "---\nweight: 1.5\n---\n";
        let (meta, _) = split_frontmatter(src).unwrap();
        assert_eq!(meta.get("weight").and_then(|v| v.as_f64()), Some(1.5));
    }

    #[test]
    fn test_no_frontmatter() {
        let (meta, body) = split_frontmatter("# Just a body\n").unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, "# Just a body\n");
    }

    #[test]
    fn test_unterminated_block_is_body() {
        let src = "---\ntitle: Test\nno closing line";
        let err = split_frontmatter(src).unwrap_err();
        assert!(err.reason.contains("unterminated"));
        assert_eq!(err.body, src);
    }

    #[test]
    fn test_malformed_line_reports_and_keeps_body() {
        let src = "---\ntitle: ok\nthis line has no colon\n---\nbody here";
        let err = split_frontmatter(src).unwrap_err();
        assert!(err.reason.contains("separator"));
        assert_eq!(err.body, "body here");
    }

    #[test]
    fn test_crlf_delimiters() {
        let src = "---\r\ntitle: Test\r\n---\r\nbody";
        let (meta, body) = split_frontmatter(src).unwrap();
        assert_eq!(meta.get("title"), Some(&Value::String("Test".into())));
        assert_eq!(body, "body");
    }

    #[test]
    fn test_closing_delimiter_at_eof() {
        let src = "---\ntitle: Test\n---";
        let (meta, body) = split_frontmatter(src).unwrap();
        assert_eq!(meta.get("title"), Some(&Value::String("Test".into())));
        assert_eq!(body, "");
    }
}

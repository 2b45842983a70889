/*!
 * Response extraction cascade.
 *
 * Model responses are requested as `{"translated_code": "..."}` but arrive in
 * every state of disrepair: wrapped in markdown fences, with unescaped
 * newlines inside the string value, with prose around the object, or as bare
 * Fortran with no JSON at all. This module recovers a best-effort code string
 * through an ordered list of strategies, each more permissive than the last.
 *
 * Each strategy is a pure function `&str -> Option<String>`; the cascade tries
 * them in order and takes the first hit. In `RawFallback` mode the cascade is
 * total: when every strategy defers, the trimmed input itself is returned. In
 * `Strict` mode a miss (or an empty hit) is reported as `None` instead, so the
 * caller can mark the row as a parse failure.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// How the cascade behaves when no strategy yields content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Fall back to the trimmed raw text. Total: empty in, empty out.
    RawFallback,
    /// Report failure instead of trusting raw text.
    Strict,
}

/// A single extraction strategy: yields a code string or defers to the next.
pub type Strategy = fn(&str) -> Option<String>;

/// The cascade in precedence order, most trustworthy first.
pub const CASCADE: &[(&str, Strategy)] = &[
    ("strict_json", strict_json),
    ("fenced_json", fenced_json),
    ("field_regex", field_regex),
    ("brace_scan", brace_scan),
    ("fenced_code", fenced_code),
    ("manual_unwrap", manual_unwrap),
];

/// JSON object inside a markdown fence, optionally tagged `json`.
static FENCED_JSON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());

/// The quoted field value, tolerating escaped quotes inside it.
static FIELD_VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)"translated_code"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap());

/// Any fenced code block, optionally tagged `fortran` (case-insensitive).
static FENCED_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)```(?:fortran)?\s*(.*?)\s*```").unwrap());

/// Leading `{"translated_code": "` of a wrapped object.
static UNWRAP_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*\{\s*"translated_code"\s*:\s*""#).unwrap());

/// Trailing `"}` of a wrapped object.
static UNWRAP_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""\s*\}\s*$"#).unwrap());

/// Run the cascade over a raw model response.
///
/// Returns `None` only in `Strict` mode, when no strategy produced non-empty
/// content. In `RawFallback` mode the result is always `Some`.
pub fn extract_translated_code(raw: &str, mode: ExtractionMode) -> Option<String> {
    let text = raw.trim();

    for (name, strategy) in CASCADE {
        if let Some(code) = strategy(text) {
            log::debug!("extraction strategy '{}' matched", name);
            match mode {
                ExtractionMode::RawFallback => return Some(code),
                ExtractionMode::Strict if !code.is_empty() => return Some(code),
                ExtractionMode::Strict => continue,
            }
        }
    }

    match mode {
        ExtractionMode::RawFallback => Some(text.to_string()),
        ExtractionMode::Strict => None,
    }
}

/// Pull the `translated_code` field out of a parsed JSON value.
fn field_of(value: &serde_json::Value) -> Option<String> {
    value
        .get("translated_code")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
}

/// Undo the escape sequences the response contract calls for.
fn unescape(code: &str) -> String {
    code.replace("\\\"", "\"")
        .replace("\\n", "\n")
        .replace("\\t", "\t")
}

/// Strategy 1: the whole trimmed text is a valid JSON object.
fn strict_json(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    field_of(&value)
}

/// Strategy 2: a fenced ```json block holds the object.
fn fenced_json(text: &str) -> Option<String> {
    let captures = FENCED_JSON_RE.captures(text)?;
    let value: serde_json::Value = serde_json::from_str(&captures[1]).ok()?;
    field_of(&value)
}

/// Strategy 3: grab the quoted field value by regex and unescape it by hand.
///
/// Survives trailing garbage after the closing brace and a missing brace
/// altogether, but requires the value's quotes and backslashes to be escaped.
fn field_regex(text: &str) -> Option<String> {
    let captures = FIELD_VALUE_RE.captures(text)?;
    Some(unescape(&captures[1]).trim().to_string())
}

/// Strategy 4: scan for balanced brace spans and try to parse each one.
///
/// Handles prose before and after the object. Only spans that close back to
/// depth zero are attempted, so nested objects inside the value are fine.
fn brace_scan(text: &str) -> Option<String> {
    if !text.contains("\"translated_code\"") {
        return None;
    }

    let mut depth = 0u32;
    let mut start = None;
    for (i, ch) in text.char_indices() {
        match ch {
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let Some(s) = start {
                        if let Ok(value) =
                            serde_json::from_str::<serde_json::Value>(&text[s..=i])
                        {
                            if let Some(code) = field_of(&value) {
                                return Some(code);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Strategy 5: any fenced block at all, taken verbatim.
fn fenced_code(text: &str) -> Option<String> {
    let captures = FENCED_CODE_RE.captures(text)?;
    Some(captures[1].trim().to_string())
}

/// Strategy 6: strip the object syntax off by hand.
///
/// Last structured resort for values containing real (unescaped) newlines,
/// which no JSON parser or single-line regex will accept.
fn manual_unwrap(text: &str) -> Option<String> {
    if !text.starts_with('{') {
        return None;
    }
    let cleaned = UNWRAP_PREFIX_RE.replace(text, "");
    let cleaned = UNWRAP_SUFFIX_RE.replace(&cleaned, "");
    let cleaned = unescape(&cleaned);
    if cleaned != text && !cleaned.is_empty() {
        Some(cleaned.trim().to_string())
    } else {
        None
    }
}

//! Tolerant field extraction from a single JSON object line
//!
//! A key is located by searching for its quoted literal followed by a
//! colon. Values are read according to the requested type:
//!
//! - string: from the opening `"` to the next unescaped `"`, where `\`
//!   makes the following character literal
//! - number: the token up to `,`, `}` or whitespace, using its longest
//!   numeric prefix
//! - bool: the literal `true` or `false`
//!
//! Every lookup returns `None` when the key is missing or the value does not
//! fit the requested type. Callers decide whether that means "use the
//! default" or "reject".

use heapless::String;

fn is_blank(c: char) -> bool {
    c.is_ascii_whitespace()
}

/// Byte offset just past the colon that follows `"key"`.
///
/// Occurrences of the quoted key that are not followed by a colon (for
/// example the same text used as a value) are skipped.
fn value_offset(line: &str, key: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(pos) = line[from..].find('"') {
        let start = from + pos + 1;
        let rest = &line[start..];
        if let Some(after_key) = rest.strip_prefix(key) {
            if let Some(after_quote) = after_key.strip_prefix('"') {
                if let Some(value) = after_quote.trim_start_matches(is_blank).strip_prefix(':') {
                    return Some(line.len() - value.len());
                }
            }
        }
        from = start;
    }
    None
}

fn value_text<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    value_offset(line, key).map(|at| line[at..].trim_start_matches(is_blank))
}

/// Walk a string value, handing each unescaped character to `push`
///
/// Stops with `None` when the value is not a string, is unterminated, or
/// `push` refuses a character.
fn scan_string(line: &str, key: &str, mut push: impl FnMut(char) -> Option<()>) -> Option<()> {
    let body = value_text(line, key)?.strip_prefix('"')?;

    let mut escaped = false;
    for c in body.chars() {
        if escaped {
            push(c)?;
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => return Some(()),
            _ => push(c)?,
        }
    }
    None
}

/// Extract a string value
///
/// Returns `None` if the value is not a string, is unterminated, or does
/// not fit in `N` bytes.
pub fn string_field<const N: usize>(line: &str, key: &str) -> Option<String<N>> {
    let mut out = String::new();
    scan_string(line, key, |c| out.push(c).ok())?;
    Some(out)
}

/// Whether `key` holds a terminated string value of any length
///
/// Tells a value too long for [`string_field`] apart from a missing one.
pub fn has_string_field(line: &str, key: &str) -> bool {
    scan_string(line, key, |_| Some(())).is_some()
}

fn number_token<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = value_text(line, key)?;
    let end = rest
        .find(|c: char| c == ',' || c == '}' || is_blank(c))
        .unwrap_or(rest.len());
    let token = &rest[..end];
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Longest prefix of `token` that reads as a decimal number, and whether it
/// has a fraction or exponent part.
fn numeric_prefix(token: &str) -> (&str, bool) {
    let bytes = token.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let int_end = digits_from(i);
    let mut digits = int_end - i;
    i = int_end;

    let mut real = false;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_end = digits_from(i + 1);
        digits += frac_end - (i + 1);
        i = frac_end;
        real = true;
    }
    if digits == 0 {
        return ("", false);
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            i = exp_end;
            real = true;
        }
    }

    (&token[..i], real)
}

/// Extract a numeric value
///
/// Trailing garbage after a numeric prefix is ignored (`12abc` reads as
/// 12). Non-finite results read as absent.
pub fn number_field(line: &str, key: &str) -> Option<f32> {
    let (prefix, _) = numeric_prefix(number_token(line, key)?);
    if prefix.is_empty() {
        return None;
    }
    let value: f32 = prefix.parse().ok()?;
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Extract an integer value
///
/// Fractional values are truncated toward zero; out-of-range values
/// saturate.
pub fn int_field(line: &str, key: &str) -> Option<i32> {
    let (prefix, real) = numeric_prefix(number_token(line, key)?);
    if prefix.is_empty() {
        return None;
    }
    if !real {
        if let Ok(value) = prefix.parse::<i64>() {
            return Some(value.clamp(i32::MIN as i64, i32::MAX as i64) as i32);
        }
    }
    let value: f64 = prefix.parse().ok()?;
    if value.is_finite() {
        Some(value as i32)
    } else {
        None
    }
}

/// Extract a boolean literal
pub fn bool_field(line: &str, key: &str) -> Option<bool> {
    let rest = value_text(line, key)?;
    if rest.starts_with("true") {
        Some(true)
    } else if rest.starts_with("false") {
        Some(false)
    } else {
        None
    }
}

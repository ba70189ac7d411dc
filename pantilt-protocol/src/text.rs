//! Text helpers for JSON output and stored scripts

use core::fmt::{self, Write};

use heapless::String;

/// Longest favorite preview, in characters, before `...` is appended
pub const PREVIEW_CHARS: usize = 120;

/// Write `input` as the body of a JSON string (without the quotes)
pub fn write_escaped<W: Write>(out: &mut W, input: &str) -> fmt::Result {
    for c in input.chars() {
        match c {
            '\\' => out.write_str("\\\\")?,
            '"' => out.write_str("\\\"")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    Ok(())
}

/// Decode the escapes a client uses to carry a multi-line script inside one
/// JSON string.
///
/// Both single (`\n`) and doubled (`\\n`) forms decode to the control
/// character, because the field scanner has already consumed one level of
/// backslashes. Returns `None` if the result does not fit.
pub fn unescape_script<const N: usize>(input: &str) -> Option<String<N>> {
    let mut out = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c).ok()?;
            continue;
        }

        let decoded = match chars.peek().copied() {
            Some('n') => Some('\n'),
            Some('r') => Some('\r'),
            Some('t') => Some('\t'),
            Some('\\') => {
                chars.next();
                match chars.peek().copied() {
                    Some('n') => Some('\n'),
                    Some('r') => Some('\r'),
                    Some('t') => Some('\t'),
                    Some('\\') => Some('\\'),
                    _ => {
                        out.push('\\').ok()?;
                        continue;
                    }
                }
            }
            Some('/') => Some('/'),
            Some('"') => Some('"'),
            _ => None,
        };

        match decoded {
            Some(d) => {
                chars.next();
                out.push(d).ok()?;
            }
            None => out.push('\\').ok()?,
        }
    }

    Some(out)
}

/// Single-line preview of a stored script
///
/// Newlines become the two characters `\n`; anything past
/// [`PREVIEW_CHARS`] characters is cut and marked with `...`.
pub fn preview<const N: usize>(script: &str) -> String<N> {
    let mut out = String::new();
    let mut count = 0;
    for c in script.chars() {
        let width = if c == '\n' { 2 } else { 1 };
        if count + width > PREVIEW_CHARS {
            if count < PREVIEW_CHARS && c == '\n' {
                let _ = out.push('\\');
            }
            let _ = out.push_str("...");
            return out;
        }
        let pushed = if c == '\n' {
            out.push_str("\\n")
        } else {
            out.push(c)
        };
        if pushed.is_err() {
            break;
        }
        count += width;
    }
    out
}

/// Trimmed, non-empty lines of a script
pub fn script_lines(script: &str) -> impl Iterator<Item = &str> {
    script.split('\n').map(str::trim).filter(|line| !line.is_empty())
}

/// Cut `input` to at most `max` bytes without splitting a character
pub fn clip(input: &str, max: usize) -> &str {
    if input.len() <= max {
        return input;
    }
    let mut end = max;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    &input[..end]
}

/// Whether a help/example line is itself a JSON object or array and can be
/// embedded without quoting
pub fn looks_like_json(line: &str) -> bool {
    let bytes = line.as_bytes();
    if bytes.len() < 2 {
        return false;
    }
    matches!(
        (bytes[0], bytes[bytes.len() - 1]),
        (b'{', b'}') | (b'[', b']')
    )
}

//! Free-text columns (device names, usernames) are stored as printable ASCII.
//!
//! The escaping matches Python's `unicode_escape` codec, so rows written by
//! earlier tooling read back the same way as rows we write ourselves.

use std::fmt::Write;

/// Escapes everything outside printable ASCII.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            ' '..='~' => escaped.push(c),
            // Writing to a String cannot fail.
            c if (c as u32) < 0x100 => {
                let _ = write!(escaped, "\\x{:02x}", c as u32);
            }
            c if (c as u32) < 0x10000 => {
                let _ = write!(escaped, "\\u{:04x}", c as u32);
            }
            c => {
                let _ = write!(escaped, "\\U{:08x}", c as u32);
            }
        }
    }
    escaped
}

/// Reverses [`escape_text`].
///
/// Anything that isn't a well-formed escape sequence is kept as-is,
/// as older rows may contain stray backslashes.
pub fn unescape_text(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(position) = rest.find('\\') {
        unescaped.push_str(&rest[..position]);
        rest = &rest[position..];

        let (decoded, consumed) = decode_escape(rest);
        match decoded {
            Some(c) => unescaped.push(c),
            None => unescaped.push_str(&rest[..consumed]),
        }
        rest = &rest[consumed..];
    }

    unescaped.push_str(rest);
    unescaped
}

/// Decodes the escape at the start of `input`, which begins with a backslash.
/// Returns the decoded character (if valid) and how many bytes were examined.
fn decode_escape(input: &str) -> (Option<char>, usize) {
    let Some(marker) = input[1..].chars().next() else {
        // A trailing backslash.
        return (None, 1);
    };

    let digits = match marker {
        '\\' => return (Some('\\'), 2),
        't' => return (Some('\t'), 2),
        'n' => return (Some('\n'), 2),
        'r' => return (Some('\r'), 2),
        'x' => 2,
        'u' => 4,
        'U' => 8,
        _ => return (None, 1),
    };

    let end = 2 + digits;
    let Some(hex) = input.get(2..end) else {
        return (None, 1);
    };
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return (None, 1);
    }

    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
        Some(c) => (Some(c), end),
        None => (None, 1),
    }
}

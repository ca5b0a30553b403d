//! Go literal decoding: string unquoting and integer parsing.

use thiserror::Error;

/// A literal whose source text is not valid Go syntax.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("invalid string literal {0}")]
    InvalidString(String),
    #[error("invalid integer literal {0}")]
    InvalidInt(String),
}

/// Interpret `raw` as a Go string or rune literal and return its value.
///
/// Accepts interpreted (`"..."`), raw (`` `...` ``) and single-rune (`'x'`)
/// literals, like `strconv.Unquote`.
pub fn unquote(raw: &str) -> Result<String, LiteralError> {
    let invalid = || LiteralError::InvalidString(raw.to_string());

    let mut chars = raw.chars();
    let quote = chars.next().ok_or_else(invalid)?;
    if raw.len() < 2 || !raw.ends_with(quote) {
        return Err(invalid());
    }
    let inner = &raw[quote.len_utf8()..raw.len() - quote.len_utf8()];

    match quote {
        '`' => {
            if inner.contains('`') {
                return Err(invalid());
            }
            Ok(inner.replace('\r', ""))
        }
        '"' => {
            if inner.contains('\n') {
                return Err(invalid());
            }
            unescape(inner, '"').ok_or_else(invalid)
        }
        '\'' => {
            let value = unescape(inner, '\'').ok_or_else(invalid)?;
            if value.chars().count() != 1 {
                return Err(invalid());
            }
            Ok(value)
        }
        _ => Err(invalid()),
    }
}

/// Decode escape sequences. Returns `None` on malformed input.
///
/// `\x` and octal escapes denote single bytes in string literals, so a run
/// of them may spell out a multi-byte UTF-8 sequence (`"caf\xc3\xa9"`). The
/// decoded bytes must form valid UTF-8 as a whole. In rune literals the same
/// escapes denote the code point itself.
fn unescape(s: &str, quote: char) -> Option<String> {
    let mut out: Vec<u8> = Vec::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    let push_char = |out: &mut Vec<u8>, c: char| {
        let mut buf = [0u8; 4];
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    };
    let push_byte = |out: &mut Vec<u8>, value: u32| -> Option<()> {
        if quote == '\'' {
            push_char(out, char::from_u32(value)?);
        } else {
            out.push(u8::try_from(value).ok()?);
        }
        Some(())
    };

    while let Some(c) = chars.next() {
        if c == quote {
            return None;
        }
        if c != '\\' {
            push_char(&mut out, c);
            continue;
        }

        let esc = chars.next()?;
        match esc {
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'v' => out.push(0x0b),
            '\\' => out.push(b'\\'),
            '\'' | '"' => {
                if esc != quote {
                    return None;
                }
                push_char(&mut out, esc);
            }
            'x' => push_byte(&mut out, take_radix(&mut chars, 2, 16)?)?,
            'u' => push_char(&mut out, char::from_u32(take_radix(&mut chars, 4, 16)?)?),
            'U' => push_char(&mut out, char::from_u32(take_radix(&mut chars, 8, 16)?)?),
            '0'..='7' => {
                let rest = take_radix(&mut chars, 2, 8)?;
                let value = (esc as u32 - '0' as u32) * 64 + rest;
                if value > 0xff {
                    return None;
                }
                push_byte(&mut out, value)?;
            }
            _ => return None,
        }
    }

    String::from_utf8(out).ok()
}

fn take_radix(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
    radix: u32,
) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..digits {
        let d = chars.next()?.to_digit(radix)?;
        value = value * radix + d;
    }
    Some(value)
}

/// Parse a Go integer literal (decimal, `0x`, `0o`, `0b`, legacy octal,
/// with optional `_` separators).
pub fn parse_int(raw: &str) -> Result<i64, LiteralError> {
    let invalid = || LiteralError::InvalidInt(raw.to_string());

    let (negative, body) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let digits: String = body.chars().filter(|c| *c != '_').collect();
    if digits.is_empty() {
        return Err(invalid());
    }

    let lower = digits.to_ascii_lowercase();
    let (radix, number) = if let Some(hex) = lower.strip_prefix("0x") {
        (16, hex)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (2, bin)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        (8, oct)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };

    let value = i64::from_str_radix(number, radix).map_err(|_| invalid())?;
    Ok(if negative { -value } else { value })
}

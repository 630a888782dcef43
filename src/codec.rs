//! Reversible identifier codec
//!
//! Some backends restrict identifiers to a strict subset of the canonical
//! alphabet (e.g. aerOS instance names must match
//! `^[A-Za-z][A-Za-z0-9_]{1,63}$`). This codec maps arbitrary identifiers
//! into such an alphabet without an external lookup table: every byte
//! outside `[A-Za-z0-9]` becomes `_` followed by two lowercase hex digits,
//! the underscore itself is always escaped, and a fixed marker prefix is
//! prepended when the result would not start with a letter.

use crate::error::{Error, Result};

/// Marker prepended when the encoded form would not start with a letter.
/// Stripped again during decode.
const PREFIX: &str = "A0_";

/// Encode `original` into the restricted identifier alphabet.
///
/// Fails when the encoded form exceeds `max_len`; truncating would lose
/// reversibility.
pub fn encode(original: &str, max_len: usize) -> Result<String> {
    let mut out = String::with_capacity(original.len());
    for byte in original.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => out.push(byte as char),
            _ => {
                // underscore included: it is the escape introducer
                out.push('_');
                out.push_str(&format!("{:02x}", byte));
            }
        }
    }

    if !out.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
        out.insert_str(0, PREFIX);
    }

    if out.len() > max_len {
        return Err(Error::InvalidArgument(format!(
            "encoded identifier is {} chars, exceeds the {} char limit; \
             reversibility would be lost",
            out.len(),
            max_len
        )));
    }
    Ok(out)
}

/// Decode an identifier produced by [`encode`], restoring the exact
/// original string.
pub fn decode(encoded: &str) -> Result<String> {
    let s = encoded.strip_prefix(PREFIX).unwrap_or(encoded);

    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'_' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        // expect two hex digits after the underscore
        if i + 2 >= bytes.len() {
            return Err(Error::InvalidArgument(
                "truncated escape sequence at end of identifier".into(),
            ));
        }
        let hex = &s[i + 1..i + 3];
        let value = u8::from_str_radix(hex, 16).map_err(|_| {
            Error::InvalidArgument(format!("invalid escape sequence '_{}'", hex))
        })?;
        out.push(value);
        i += 3;
    }

    String::from_utf8(out)
        .map_err(|_| Error::InvalidArgument("decoded identifier is not valid UTF-8".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_plain_identifiers_pass_through() {
        assert_eq!(encode("videoAnalytics01", 64).unwrap(), "videoAnalytics01");
        assert_eq!(decode("videoAnalytics01").unwrap(), "videoAnalytics01");
    }

    #[test]
    fn test_underscore_always_escaped() {
        let enc = encode("my_app", 64).unwrap();
        assert_eq!(enc, "my_5fapp");
        assert_eq!(decode(&enc).unwrap(), "my_app");
    }

    #[test]
    fn test_prefix_when_not_letter_leading() {
        let enc = encode("5g-app", 64).unwrap();
        assert!(enc.starts_with("A0_"));
        assert_eq!(decode(&enc).unwrap(), "5g-app");
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            "urn:ngsi-ld:Service:demo",
            "app-1.2.3",
            "with space",
            "__",
            "",
            "ütf8-π",
        ];
        for original in cases {
            let enc = encode(original, 256).unwrap();
            assert!(enc.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
            assert_eq!(decode(&enc).unwrap(), original, "case {:?}", original);
        }
    }

    #[test]
    fn test_length_limit_is_an_error_not_a_truncation() {
        let long = "x".repeat(32);
        assert_eq!(encode(&long, 64).unwrap().len(), 32);
        let err = encode(&"€".repeat(32), 64).unwrap_err();
        assert_matches!(err, Error::InvalidArgument(_));
    }

    #[test]
    fn test_decode_rejects_bad_escapes() {
        assert_matches!(decode("abc_"), Err(Error::InvalidArgument(_)));
        assert_matches!(decode("abc_4"), Err(Error::InvalidArgument(_)));
        assert_matches!(decode("abc_zz"), Err(Error::InvalidArgument(_)));
    }
}

use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Ascii,
    Latin1,
    Utf16Le,
    Utf16Be,
}

impl Encoding {
    fn from_label(label: &str) -> Result<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" | "unicode-1-1-utf-8" => Ok(Encoding::Utf8),
            "us-ascii" | "ascii" => Ok(Encoding::Ascii),
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "l1" => Ok(Encoding::Latin1),
            "utf-16le" | "utf-16" => Ok(Encoding::Utf16Le),
            "utf-16be" => Ok(Encoding::Utf16Be),
            _ => Err(Error::Encoding(format!("unsupported encoding \"{}\"", label))),
        }
    }

    fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| Error::Encoding(format!("invalid UTF-8: {}", e))),
            Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(Error::Encoding(format!(
                    "non-ASCII byte 0x{:02x} at offset {}",
                    bytes[pos], pos
                ))),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Utf16Le | Encoding::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(Error::Encoding("truncated UTF-16 input".to_string()));
                }
                let units = bytes.chunks_exact(2).map(|pair| {
                    if self == Encoding::Utf16Le {
                        u16::from_le_bytes([pair[0], pair[1]])
                    } else {
                        u16::from_be_bytes([pair[0], pair[1]])
                    }
                });
                char::decode_utf16(units)
                    .collect::<std::result::Result<String, _>>()
                    .map_err(|e| Error::Encoding(format!("invalid UTF-16: {}", e)))
            }
        }
    }
}

/// Determines the fallback encoding of a stylesheet and decodes it.
/// https://www.w3.org/TR/css-syntax-3/#determine-the-fallback-encoding
///
/// A byte order mark wins over a leading `@charset "<label>";`, which wins over
/// `hint`. Without any of them the input is read as UTF-8.
pub fn decode(bytes: &[u8], hint: Option<&str>) -> Result<String> {
    if let Some(rest) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        return Encoding::Utf8.decode(rest);
    }
    if let Some(rest) = bytes.strip_prefix(b"\xFF\xFE") {
        return Encoding::Utf16Le.decode(rest);
    }
    if let Some(rest) = bytes.strip_prefix(b"\xFE\xFF") {
        return Encoding::Utf16Be.decode(rest);
    }

    if let Some(label) = charset_label(bytes) {
        debug!("using encoding \"{}\" from @charset", label);
        let encoding = match Encoding::from_label(label)? {
            // An ASCII-compatible @charset cannot have been written in UTF-16.
            Encoding::Utf16Le | Encoding::Utf16Be => Encoding::Utf8,
            encoding => encoding,
        };
        return encoding.decode(bytes);
    }

    match hint {
        Some(label) => Encoding::from_label(label)?.decode(bytes),
        None => Encoding::Utf8.decode(bytes),
    }
}

/// Returns the label of a `@charset "<label>";` rule at the very start of `bytes`.
fn charset_label(bytes: &[u8]) -> Option<&str> {
    let rest = bytes.strip_prefix(b"@charset \"")?;
    let end = rest.iter().take(1024).position(|&b| b == b'"')?;
    if rest.get(end + 1) != Some(&b';') {
        return None;
    }
    std::str::from_utf8(&rest[..end])
        .ok()
        .filter(|label| label.is_ascii())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_plain_utf8() {
        assert_eq!(decode("a{content:\"é\"}".as_bytes(), None).unwrap(), "a{content:\"é\"}");
    }

    #[test]
    fn decode_with_byte_order_marks() {
        assert_eq!(decode(b"\xEF\xBB\xBFa{}", Some("latin1")).unwrap(), "a{}");
        assert_eq!(decode(b"\xFF\xFEa\x00{\x00}\x00", None).unwrap(), "a{}");
        assert_eq!(decode(b"\xFE\xFF\x00a\x00{\x00}", None).unwrap(), "a{}");
    }

    #[test]
    fn decode_with_charset_rule() {
        let bytes = b"@charset \"ISO-8859-1\"; a{content:\"\xE9\"}";
        assert_eq!(
            decode(bytes, Some("utf-8")).unwrap(),
            "@charset \"ISO-8859-1\"; a{content:\"\u{e9}\"}"
        );

        let bytes = b"@charset \"utf-16\"; a{}";
        assert_eq!(decode(bytes, None).unwrap(), "@charset \"utf-16\"; a{}");
    }

    #[test]
    fn decode_with_hint() {
        assert_eq!(decode(b"a{content:\"\xE9\"}", Some("Latin1")).unwrap(), "a{content:\"\u{e9}\"}");
    }

    #[test]
    fn decode_errors() {
        assert!(matches!(decode(b"a{content:\"\xE9\"}", None), Err(Error::Encoding(_))));
        assert!(matches!(decode(b"a{}", Some("shift_jis")), Err(Error::Encoding(_))));
        assert!(matches!(
            decode(b"@charset \"koi8-r\"; a{}", None),
            Err(Error::Encoding(_))
        ));
        assert!(matches!(decode(b"a\x80", Some("us-ascii")), Err(Error::Encoding(_))));
        assert!(matches!(decode(b"\xFF\xFEa", None), Err(Error::Encoding(_))));
    }
}

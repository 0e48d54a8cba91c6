//! Text decoding and registry path helpers.

use crate::error::{ProdInfoError, Result};
use encoding_rs::{Encoding, UTF_16LE, UTF_8, WINDOWS_1252};
use tracing::debug;

/// Decodes a UTF-16LE string from a byte slice, trimming null terminators.
///
/// Registry strings are typically null-terminated. An odd trailing byte
/// is an error, as is an unpaired surrogate.
pub fn read_utf16_string(data: &[u8]) -> Result<String> {
    if data.is_empty() {
        return Ok(String::new());
    }

    // UTF-16 requires even number of bytes
    if data.len() % 2 != 0 {
        return Err(ProdInfoError::Encoding {
            encoding: UTF_16LE.name(),
            context: format!("odd byte count {}", data.len()),
        });
    }

    let (decoded, had_errors) = UTF_16LE.decode_without_bom_handling(data);

    if had_errors {
        return Err(ProdInfoError::Encoding {
            encoding: UTF_16LE.name(),
            context: "unpaired surrogate".to_string(),
        });
    }

    Ok(decoded.trim_end_matches('\0').to_string())
}

/// Decodes a whole text file, sniffing a byte order mark.
///
/// Files with a BOM must be valid in the encoding it names. Files without
/// one are read as UTF-8 when they are valid UTF-8 and as Windows-1252
/// otherwise, the ANSI code page `regedit` uses for `REGEDIT4` exports.
pub fn decode_text(data: &[u8]) -> Result<String> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(data) {
        let (decoded, had_errors) = encoding.decode_without_bom_handling(&data[bom_len..]);
        if had_errors {
            return Err(ProdInfoError::Encoding {
                encoding: encoding.name(),
                context: "malformed byte sequence".to_string(),
            });
        }
        return Ok(decoded.into_owned());
    }

    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(data) {
        return Ok(text.into_owned());
    }

    debug!("Not valid UTF-8, decoding as {}", WINDOWS_1252.name());
    let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(data);
    Ok(decoded.into_owned())
}

/// Splits a backslash-separated key path into its non-empty segments.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('\\').filter(|segment| !segment.is_empty())
}

/// Joins two key path fragments with a single backslash.
pub fn join_path(parent: &str, child: &str) -> String {
    let parent = parent.trim_end_matches('\\');
    let child = child.trim_start_matches('\\');
    if parent.is_empty() {
        child.to_string()
    } else if child.is_empty() {
        parent.to_string()
    } else {
        format!("{}\\{}", parent, child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_utf16_string() {
        let data = [b'H', 0, b'i', 0, 0, 0];
        assert_eq!(read_utf16_string(&data).unwrap(), "Hi");
        assert_eq!(read_utf16_string(&[]).unwrap(), "");
    }

    #[test]
    fn test_read_utf16_string_odd_length() {
        let result = read_utf16_string(&[b'H', 0, b'i']);
        assert!(matches!(result, Err(ProdInfoError::Encoding { .. })));
    }

    #[test]
    fn test_decode_text_utf16_bom() {
        let mut data = vec![0xFF, 0xFE];
        data.extend("REGEDIT4".encode_utf16().flat_map(|u| u.to_le_bytes()));
        assert_eq!(decode_text(&data).unwrap(), "REGEDIT4");
    }

    #[test]
    fn test_decode_text_utf8() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFabc").unwrap(), "abc");
        assert_eq!(decode_text(b"abc").unwrap(), "abc");
        assert_eq!(decode_text("Caf\u{e9}".as_bytes()).unwrap(), "Caf\u{e9}");
    }

    #[test]
    fn test_decode_text_ansi_fallback() {
        assert_eq!(decode_text(b"Caf\xE9 \xAE").unwrap(), "Caf\u{e9} \u{ae}");
        // 0x80 is the euro sign in Windows-1252
        assert_eq!(decode_text(b"\x80").unwrap(), "\u{20ac}");
    }

    #[test]
    fn test_decode_text_malformed_utf8_bom() {
        let result = decode_text(b"\xEF\xBB\xBFabc\xFF");
        assert!(matches!(result, Err(ProdInfoError::Encoding { encoding: "UTF-8", .. })));
    }

    #[test]
    fn test_path_helpers() {
        let segments: Vec<&str> = split_path("\\SOFTWARE\\\\Microsoft\\").collect();
        assert_eq!(segments, vec!["SOFTWARE", "Microsoft"]);

        assert_eq!(join_path("SOFTWARE\\", "\\Classes"), "SOFTWARE\\Classes");
        assert_eq!(join_path("", "Classes"), "Classes");
        assert_eq!(join_path("SOFTWARE", ""), "SOFTWARE");
    }
}

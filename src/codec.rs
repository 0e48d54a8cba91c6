//! Conversion between GUIDs and the compact form used in installer registry keys.
//!
//! Windows Installer does not store product and upgrade codes in their
//! hyphenated form. Under `Installer\UpgradeCodes` (and the other installer
//! keys) every GUID is written as 32 hex digits where each segment of the
//! pattern below has its characters reversed:
//!
//! ```text
//! GUID:     12345678-1234-5678-9abc-def012345678
//! Segments: 12345678 1234 5678 9a bc de f0 12 34 56 78
//! Reversed: 87654321 4321 8765 a9 cb ed 0f 21 43 65 87
//! Compact:  8765432143218765A9CBED0F21436587
//! ```
//!
//! Segment boundaries are the same in both directions, so the reversal is
//! its own inverse and a single routine serves encoding and decoding.
//!
//! ```rust
//! use prodinfo::IdentifierCodec;
//! use uuid::Uuid;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let codec = IdentifierCodec::new();
//! let code = Uuid::parse_str("90120000-0030-0000-0000-0000000FF1CE")?;
//!
//! let compact = codec.to_compact(&code);
//! assert_eq!(compact.as_str(), "00002109030000000000000000F01FEC");
//! assert_eq!(codec.from_compact(compact.as_str())?, code);
//! # Ok(())
//! # }
//! ```

use crate::error::{ProdInfoError, Result};
use std::fmt;
use uuid::Uuid;

/// Number of hex digits in a GUID without separators.
pub const GUID_HEX_DIGITS: usize = 32;

/// Segment lengths whose characters are reversed in the registry form.
pub const GUID_REGISTRY_PATTERN: [usize; 11] = [8, 4, 4, 2, 2, 2, 2, 2, 2, 2, 2];

/// A GUID in the compact, segment-reversed registry form.
///
/// Always 32 upper-case hex digits when produced by [`IdentifierCodec::to_compact`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompactForm(String);

impl CompactForm {
    /// Returns the compact form as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `name` contains this compact form, ignoring ASCII case.
    ///
    /// Value names under an upgrade code key are sometimes decorated, so
    /// lookups match on containment rather than equality.
    pub fn found_in(&self, name: &str) -> bool {
        name.to_ascii_uppercase().contains(&self.0)
    }
}

impl fmt::Display for CompactForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bidirectional converter between [`Uuid`] and [`CompactForm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierCodec {
    pattern: &'static [usize; 11],
}

impl IdentifierCodec {
    /// Creates a codec using the Windows Installer segment pattern.
    pub const fn new() -> Self {
        Self {
            pattern: &GUID_REGISTRY_PATTERN,
        }
    }

    /// Converts a GUID to its compact registry form.
    pub fn to_compact(&self, uuid: &Uuid) -> CompactForm {
        let mut buf = Uuid::encode_buffer();
        let digits: Vec<char> = uuid.simple().encode_upper(&mut buf).chars().collect();
        CompactForm(self.reverse_segments(&digits))
    }

    /// Converts a compact registry name back to a GUID.
    ///
    /// # Errors
    ///
    /// Returns `ProdInfoError::InvalidFormat` if `text` is not exactly 32
    /// characters long or contains a character outside `[0-9a-fA-F]`.
    pub fn from_compact(&self, text: &str) -> Result<Uuid> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() != GUID_HEX_DIGITS {
            return Err(ProdInfoError::format_error(format!(
                "expected {} characters, got {} in {:?}",
                GUID_HEX_DIGITS,
                chars.len(),
                text
            )));
        }

        let digits = self.reverse_segments(&chars);

        let mut bytes = [0u8; 16];
        hex::decode_to_slice(&digits, &mut bytes)
            .map_err(|e| ProdInfoError::format_error(format!("{} in {:?}", e, text)))?;

        Ok(Uuid::from_bytes(bytes))
    }

    /// Reverses every pattern segment of a 32-character sequence.
    ///
    /// Applying this twice returns the original sequence.
    fn reverse_segments(&self, chars: &[char]) -> String {
        debug_assert_eq!(chars.len(), GUID_HEX_DIGITS);

        let mut out = String::with_capacity(GUID_HEX_DIGITS);
        let mut index = 0;
        for &len in self.pattern.iter() {
            out.extend(chars[index..index + len].iter().rev());
            index += len;
        }
        out
    }
}

impl Default for IdentifierCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_covers_all_digits() {
        assert_eq!(GUID_REGISTRY_PATTERN.iter().sum::<usize>(), GUID_HEX_DIGITS);
        assert_eq!(IdentifierCodec::new().pattern, &GUID_REGISTRY_PATTERN);
    }

    #[test]
    fn test_reverse_segments_is_involution() {
        let codec = IdentifierCodec::new();
        let input: Vec<char> = "0123456789abcdefFEDCBA9876543210".chars().collect();

        let once = codec.reverse_segments(&input);
        assert_eq!(once, "76543210ba98fedcEFCDAB8967452301");

        let twice: Vec<char> = codec.reverse_segments(&once.chars().collect::<Vec<_>>()).chars().collect();
        assert_eq!(twice, input);
    }

    #[test]
    fn test_to_compact_is_upper_case() {
        let codec = IdentifierCodec::new();
        let uuid = Uuid::parse_str("8d3c9a04-1d7c-4e1b-9e07-6c7c5c4d1f2a").unwrap();
        assert_eq!(codec.to_compact(&uuid).as_str(), "40A9C3D8C7D1B1E4E970C6C7C5D4F1A2");
    }

    #[test]
    fn test_from_compact_accepts_lower_case() {
        let codec = IdentifierCodec::new();
        let uuid = codec.from_compact("40a9c3d8c7d1b1e4e970c6c7c5d4f1a2").unwrap();
        assert_eq!(uuid.to_string(), "8d3c9a04-1d7c-4e1b-9e07-6c7c5c4d1f2a");
    }

    #[test]
    fn test_from_compact_rejects_multibyte_characters() {
        let codec = IdentifierCodec::new();
        let text = "é".repeat(32);
        let result = codec.from_compact(&text);
        assert!(matches!(result, Err(ProdInfoError::InvalidFormat(_))));
    }

    #[test]
    fn test_found_in_ignores_case() {
        let codec = IdentifierCodec::new();
        let uuid = Uuid::parse_str("90120000-0030-0000-0000-0000000FF1CE").unwrap();
        let compact = codec.to_compact(&uuid);

        assert!(compact.found_in("00002109030000000000000000f01fec"));
        assert!(compact.found_in("x00002109030000000000000000F01FECx"));
        assert!(!compact.found_in("00002109030000000000000000F01FED"));
    }
}

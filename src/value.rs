//! Registry value types and typed value data.

use crate::error::Result;
use crate::utils::read_utf16_string;

/// Registry value data types.
///
/// Numbers match the `hex(N)` type tags written by `regedit` exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// REG_NONE (0).
    None,
    /// REG_SZ (1).
    String,
    /// REG_EXPAND_SZ (2).
    ExpandString,
    /// REG_BINARY (3).
    Binary,
    /// REG_DWORD (4).
    Dword,
    /// REG_DWORD_BIG_ENDIAN (5).
    DwordBigEndian,
    /// REG_MULTI_SZ (7).
    MultiString,
    /// REG_QWORD (11).
    Qword,
    /// Any other type number.
    Unknown(u32),
}

impl ValueType {
    /// Maps a raw registry type number to a value type.
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => ValueType::None,
            1 => ValueType::String,
            2 => ValueType::ExpandString,
            3 => ValueType::Binary,
            4 => ValueType::Dword,
            5 => ValueType::DwordBigEndian,
            7 => ValueType::MultiString,
            11 => ValueType::Qword,
            other => ValueType::Unknown(other),
        }
    }
}

/// Parsed registry value data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueData {
    /// No data.
    None,

    /// String value.
    String(String),

    /// Expandable string value.
    ExpandString(String),

    /// Binary data.
    Binary(Vec<u8>),

    /// 32-bit integer.
    Dword(u32),

    /// 32-bit big-endian integer.
    DwordBigEndian(u32),

    /// Multiple strings.
    MultiString(Vec<String>),

    /// 64-bit integer.
    Qword(u64),

    /// Unknown or unsupported type.
    Unknown(u32, Vec<u8>),
}

impl ValueData {
    /// Parses raw little-endian value bytes based on the value type.
    ///
    /// Numeric types shorter than their width are zero-extended, which is
    /// how `regedit` treats truncated `hex(4)` and `hex(b)` payloads.
    pub fn parse(data: &[u8], value_type: ValueType) -> Result<Self> {
        match value_type {
            ValueType::None => Ok(ValueData::None),

            ValueType::String => Ok(ValueData::String(read_utf16_string(data)?)),

            ValueType::ExpandString => Ok(ValueData::ExpandString(read_utf16_string(data)?)),

            ValueType::Binary => Ok(ValueData::Binary(data.to_vec())),

            ValueType::Dword => {
                let mut bytes = [0u8; 4];
                copy_prefix(data, &mut bytes);
                Ok(ValueData::Dword(u32::from_le_bytes(bytes)))
            }

            ValueType::DwordBigEndian => {
                let mut bytes = [0u8; 4];
                copy_prefix(data, &mut bytes);
                Ok(ValueData::DwordBigEndian(u32::from_be_bytes(bytes)))
            }

            ValueType::Qword => {
                let mut bytes = [0u8; 8];
                copy_prefix(data, &mut bytes);
                Ok(ValueData::Qword(u64::from_le_bytes(bytes)))
            }

            ValueType::MultiString => {
                let full_string = read_utf16_string(data)?;
                let strings: Vec<String> = full_string
                    .split('\0')
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect();
                Ok(ValueData::MultiString(strings))
            }

            ValueType::Unknown(tag) => Ok(ValueData::Unknown(tag, data.to_vec())),
        }
    }

    /// Returns the text of string-typed data.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ValueData::String(s) | ValueData::ExpandString(s) => Some(s),
            _ => None,
        }
    }
}

fn copy_prefix(data: &[u8], out: &mut [u8]) {
    let len = data.len().min(out.len());
    out[..len].copy_from_slice(&data[..len]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn test_parse_expand_string() {
        let data = utf16("%ProgramFiles%\\App\0");
        let value = ValueData::parse(&data, ValueType::ExpandString).unwrap();
        assert_eq!(value, ValueData::ExpandString("%ProgramFiles%\\App".to_string()));
        assert_eq!(value.as_str(), Some("%ProgramFiles%\\App"));
    }

    #[test]
    fn test_parse_multi_string() {
        let data = utf16("one\0two\0\0");
        let value = ValueData::parse(&data, ValueType::MultiString).unwrap();
        assert_eq!(value, ValueData::MultiString(vec!["one".into(), "two".into()]));
        assert_eq!(value.as_str(), None);
    }

    #[test]
    fn test_parse_numbers() {
        let dword = ValueData::parse(&[0x0a, 0, 0, 0], ValueType::Dword).unwrap();
        assert_eq!(dword, ValueData::Dword(10));

        let qword = ValueData::parse(&[1, 0, 0, 0, 0, 0, 0, 1], ValueType::Qword).unwrap();
        assert_eq!(qword, ValueData::Qword(0x0100_0000_0000_0001));

        let short = ValueData::parse(&[0xff], ValueType::Dword).unwrap();
        assert_eq!(short, ValueData::Dword(0xff));
    }

    #[test]
    fn test_unknown_type_keeps_tag() {
        let value = ValueData::parse(&[1, 2], ValueType::from_u32(0x8)).unwrap();
        assert_eq!(value, ValueData::Unknown(8, vec![1, 2]));
    }
}

//! Loader for `regedit` export files (`.reg`).
//!
//! `reg export HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Installer\UpgradeCodes`
//! writes a text file that can be copied off a machine and inspected
//! anywhere. This module replays such files into a [`MemoryStore`].
//!
//! ## Format
//!
//! ```text
//! Windows Registry Editor Version 5.00
//!
//! ; comment
//! [HKEY_LOCAL_MACHINE\SOFTWARE\Vendor]
//! "Name"="text with \"quotes\" and \\ backslashes"
//! @="default value"
//! "Count"=dword:0000000a
//! "Blob"=hex:de,ad,be,ef,\
//!   01,02
//! "Path"=hex(2):25,00,41,00,25,00,00,00
//! "Gone"=-
//!
//! [-HKEY_LOCAL_MACHINE\SOFTWARE\Obsolete]
//! ```
//!
//! Version 5 exports are UTF-16LE with a byte order mark; `REGEDIT4`
//! exports are 8-bit text in the ANSI code page, read as Windows-1252
//! unless they are valid UTF-8. Only keys under `HKEY_LOCAL_MACHINE` are
//! loaded, since that is the hive the store represents.

use crate::error::{ProdInfoError, Result};
use crate::store::MemoryStore;
use crate::utils::{decode_text, split_path};
use crate::value::{ValueData, ValueType};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Header line of Unicode exports.
pub const REGEDIT5_HEADER: &str = "Windows Registry Editor Version 5.00";

/// Header line of legacy ANSI exports.
pub const REGEDIT4_HEADER: &str = "REGEDIT4";

/// Root key names accepted for the local machine hive.
const LOCAL_MACHINE_ROOTS: [&str; 2] = ["HKEY_LOCAL_MACHINE", "HKLM"];

impl MemoryStore {
    /// Builds a store from one or more export files, applied in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or decoded, or is not a
    /// well-formed registry export.
    pub fn from_reg_files<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut store = MemoryStore::new();
        for path in paths {
            store.load_reg_file(path)?;
        }
        Ok(store)
    }

    /// Applies an export file to this store.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load_reg_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        info!("Loading registry export");
        let data = std::fs::read(&path)?;
        debug!(size = data.len(), "Read export file");

        let text = decode_text(&data)?;
        self.load_reg_str(&text)?;

        debug!(keys = self.key_count(), "Export applied");
        Ok(())
    }

    /// Applies already decoded export text to this store.
    pub fn load_reg_str(&mut self, text: &str) -> Result<()> {
        let mut parser = RegFileParser {
            store: self,
            current: KeyState::None,
            seen_header: false,
        };

        for (line_no, line) in logical_lines(text) {
            parser.line(line_no, &line)?;
        }

        if !parser.seen_header {
            return Err(ProdInfoError::reg_file(1, "missing registry export header"));
        }
        Ok(())
    }
}

/// The key that value lines currently apply to.
enum KeyState {
    /// No key line seen yet.
    None,
    /// Key under another root hive, or a deleted key.
    Skipped,
    /// Key path relative to HKEY_LOCAL_MACHINE.
    Key(String),
}

struct RegFileParser<'a> {
    store: &'a mut MemoryStore,
    current: KeyState,
    seen_header: bool,
}

impl RegFileParser<'_> {
    fn line(&mut self, line_no: usize, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            return Ok(());
        }

        if !self.seen_header {
            if line == REGEDIT5_HEADER || line == REGEDIT4_HEADER {
                self.seen_header = true;
                return Ok(());
            }
            return Err(ProdInfoError::reg_file(
                line_no,
                format!("expected registry export header, found {:?}", line),
            ));
        }

        if line.starts_with('[') {
            self.key_line(line_no, line)
        } else {
            self.value_line(line_no, line)
        }
    }

    fn key_line(&mut self, line_no: usize, line: &str) -> Result<()> {
        let inner = line
            .strip_prefix('[')
            .and_then(|l| l.strip_suffix(']'))
            .ok_or_else(|| ProdInfoError::reg_file(line_no, "unterminated key name"))?;

        let (delete, full_path) = match inner.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, inner),
        };

        let Some(path) = local_machine_path(full_path) else {
            warn!(key = full_path, "Skipping key outside HKEY_LOCAL_MACHINE");
            self.current = KeyState::Skipped;
            return Ok(());
        };

        if delete {
            debug!(key = %path, "Deleting key");
            self.store.delete_key(&path);
            self.current = KeyState::Skipped;
        } else {
            self.store.create_key(&path);
            self.current = KeyState::Key(path);
        }
        Ok(())
    }

    fn value_line(&mut self, line_no: usize, line: &str) -> Result<()> {
        let (name, rest) = if let Some(rest) = line.strip_prefix('@') {
            (String::new(), rest)
        } else if line.starts_with('"') {
            parse_quoted(line_no, line)?
        } else {
            return Err(ProdInfoError::reg_file(
                line_no,
                format!("expected value name, found {:?}", line),
            ));
        };

        let data = rest
            .trim_start()
            .strip_prefix('=')
            .ok_or_else(|| ProdInfoError::reg_file(line_no, "expected '=' after value name"))?
            .trim();

        let path = match &self.current {
            KeyState::Key(path) => path,
            KeyState::Skipped => return Ok(()),
            KeyState::None => {
                return Err(ProdInfoError::reg_file(line_no, "value outside of a key"))
            }
        };

        if data == "-" {
            self.store.delete_value(path, &name);
            return Ok(());
        }

        let value = parse_data(line_no, data)?;
        self.store.set_value(path, &name, value);
        Ok(())
    }
}

/// Strips the local machine root from a full key path.
///
/// Returns `None` for keys under any other root.
fn local_machine_path(full_path: &str) -> Option<String> {
    let mut segments = split_path(full_path);
    let root = segments.next()?;
    if !LOCAL_MACHINE_ROOTS.iter().any(|r| r.eq_ignore_ascii_case(root)) {
        return None;
    }
    Some(segments.collect::<Vec<_>>().join("\\"))
}

/// Joins lines ending in a backslash with the following line.
///
/// Yields each logical line with the 1-based number of its first physical line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, raw) in text.lines().enumerate() {
        let piece = if pending.is_some() {
            raw.trim()
        } else {
            raw.trim_end()
        };

        let entry = pending.get_or_insert_with(|| (index + 1, String::new()));
        match piece.strip_suffix('\\') {
            Some(head) if is_continuation(piece) => entry.1.push_str(head),
            _ => {
                entry.1.push_str(piece);
                lines.extend(pending.take());
            }
        }
    }

    lines.extend(pending.take());
    lines
}

/// Continuations only occur in hex payloads, which wrap after a byte
/// (`,\`) or right after the type prefix (`hex(2):\`).
fn is_continuation(line: &str) -> bool {
    line.ends_with(",\\") || line.ends_with(":\\")
}

/// Parses a quoted, escaped string at the start of `input`.
///
/// Returns the unescaped text and the remainder after the closing quote.
fn parse_quoted(line_no: usize, input: &str) -> Result<(String, &str)> {
    let body = input
        .strip_prefix('"')
        .ok_or_else(|| ProdInfoError::reg_file(line_no, "expected '\"'"))?;

    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((out, &body[i + 1..])),
            '\\' => match chars.next() {
                Some((_, escaped @ ('\\' | '"'))) => out.push(escaped),
                Some((_, other)) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            _ => out.push(c),
        }
    }

    Err(ProdInfoError::reg_file(line_no, "unterminated string"))
}

/// Parses the data part of a value line.
fn parse_data(line_no: usize, data: &str) -> Result<ValueData> {
    if data.starts_with('"') {
        let (text, rest) = parse_quoted(line_no, data)?;
        if !rest.trim().is_empty() {
            return Err(ProdInfoError::reg_file(
                line_no,
                format!("unexpected text after string: {:?}", rest),
            ));
        }
        return Ok(ValueData::String(text));
    }

    if let Some(digits) = data.strip_prefix("dword:") {
        if digits.is_empty() || digits.len() > 8 {
            return Err(ProdInfoError::reg_file(
                line_no,
                format!("invalid dword {:?}", digits),
            ));
        }
        let value = u32::from_str_radix(digits, 16).map_err(|e| {
            ProdInfoError::reg_file(line_no, format!("invalid dword {:?}: {}", digits, e))
        })?;
        return Ok(ValueData::Dword(value));
    }

    if let Some(bytes) = data.strip_prefix("hex:") {
        return Ok(ValueData::Binary(parse_hex_bytes(line_no, bytes)?));
    }

    if let Some(rest) = data.strip_prefix("hex(") {
        let (tag, bytes) = rest
            .split_once("):")
            .ok_or_else(|| ProdInfoError::reg_file(line_no, "malformed hex(type) value"))?;
        let tag = u32::from_str_radix(tag, 16).map_err(|e| {
            ProdInfoError::reg_file(line_no, format!("invalid value type {:?}: {}", tag, e))
        })?;
        let bytes = parse_hex_bytes(line_no, bytes)?;
        return ValueData::parse(&bytes, ValueType::from_u32(tag))
            .map_err(|e| ProdInfoError::reg_file(line_no, e.to_string()));
    }

    Err(ProdInfoError::reg_file(
        line_no,
        format!("unrecognized value data {:?}", data),
    ))
}

/// Parses a comma-separated list of two-digit hex bytes.
fn parse_hex_bytes(line_no: usize, list: &str) -> Result<Vec<u8>> {
    let mut digits = String::with_capacity(list.len());
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if item.len() != 2 {
            return Err(ProdInfoError::reg_file(
                line_no,
                format!("invalid hex byte {:?}", item),
            ));
        }
        digits.push_str(item);
    }

    hex::decode(&digits).map_err(|e| ProdInfoError::reg_file(line_no, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RegistryStore;

    fn load(text: &str) -> Result<MemoryStore> {
        let mut store = MemoryStore::new();
        store.load_reg_str(text)?;
        Ok(store)
    }

    #[test]
    fn test_logical_lines_join_continuations() {
        let text = "a\n\"Blob\"=hex:01,02,\\\n  03\nb";
        let lines = logical_lines(text);
        assert_eq!(
            lines,
            vec![
                (1, "a".to_string()),
                (2, "\"Blob\"=hex:01,02,03".to_string()),
                (4, "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_continuation_after_type_prefix() {
        let lines = logical_lines("\"LongName\"=hex(2):\\\n  41,00,00,00\n");
        assert_eq!(lines, vec![(1, "\"LongName\"=hex(2):41,00,00,00".to_string())]);
        assert!(is_continuation("\"A\"=hex:\\"));
        assert!(is_continuation("\"A\"=hex:01,\\"));
        assert!(!is_continuation("\"A\"=\"C:\\\\\""));
    }

    #[test]
    fn test_string_ending_in_backslash_is_not_continuation() {
        let lines = logical_lines("\"Dir\"=\"C:\\\\\"\nnext");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].1, "\"Dir\"=\"C:\\\\\"");
    }

    #[test]
    fn test_parse_quoted_escapes() {
        let (text, rest) = parse_quoted(1, r#""a \"b\" c\\d"=x"#).unwrap();
        assert_eq!(text, r#"a "b" c\d"#);
        assert_eq!(rest, "=x");
        assert!(parse_quoted(1, "\"open").is_err());
    }

    #[test]
    fn test_parse_data_types() {
        assert_eq!(parse_data(1, "dword:0000000a").unwrap(), ValueData::Dword(10));
        assert_eq!(
            parse_data(1, "hex:de,ad").unwrap(),
            ValueData::Binary(vec![0xde, 0xad])
        );
        assert_eq!(parse_data(1, "hex:").unwrap(), ValueData::Binary(Vec::new()));
        assert_eq!(
            parse_data(1, "hex(2):41,00,00,00").unwrap(),
            ValueData::ExpandString("A".into())
        );
        assert_eq!(
            parse_data(1, "hex(b):01,00,00,00,00,00,00,00").unwrap(),
            ValueData::Qword(1)
        );
        assert_eq!(parse_data(1, "hex(0):").unwrap(), ValueData::None);
        assert!(parse_data(1, "dword:xyz").is_err());
        assert!(parse_data(1, "hex:1,2").is_err());
        assert!(parse_data(1, "qword:1").is_err());
    }

    #[test]
    fn test_load_keys_and_values() {
        let store = load(
            "Windows Registry Editor Version 5.00\r\n\
             \r\n\
             [HKEY_LOCAL_MACHINE\\SOFTWARE\\Vendor]\r\n\
             @=\"default\"\r\n\
             \"Name\"=\"Vendor \\\"Inc\\\"\"\r\n\
             \r\n\
             [HKEY_CURRENT_USER\\Software\\Vendor]\r\n\
             \"Ignored\"=\"yes\"\r\n",
        )
        .unwrap();

        let key = store.open_key("SOFTWARE\\Vendor").unwrap().unwrap();
        assert_eq!(store.value_names(&key).unwrap(), vec!["", "Name"]);
        assert_eq!(store.string_value(&key, "").unwrap().as_deref(), Some("default"));
        assert_eq!(
            store.string_value(&key, "Name").unwrap().as_deref(),
            Some("Vendor \"Inc\"")
        );
        assert!(store.open_key("Software\\Vendor\\Ignored").unwrap().is_none());
        assert_eq!(store.key_count(), 2);
    }

    #[test]
    fn test_load_deletions() {
        let store = load(
            "REGEDIT4\n\
             [HKLM\\SOFTWARE\\A]\n\
             \"Keep\"=\"1\"\n\
             \"Drop\"=\"2\"\n\
             [HKLM\\SOFTWARE\\B]\n\
             [HKLM\\SOFTWARE\\A]\n\
             \"Drop\"=-\n\
             [-HKLM\\SOFTWARE\\B]\n\
             \"AfterDelete\"=\"ignored\"\n",
        )
        .unwrap();

        let a = store.open_key("SOFTWARE\\A").unwrap().unwrap();
        assert_eq!(store.value_names(&a).unwrap(), vec!["Keep"]);
        assert!(store.open_key("SOFTWARE\\B").unwrap().is_none());
    }

    #[test]
    fn test_errors_report_line_numbers() {
        let err = load("REGEDIT4\n[HKLM\\SOFTWARE]\n\"Bad\"=what\n").unwrap_err();
        assert!(matches!(err, ProdInfoError::InvalidRegFile { line: 3, .. }), "{:?}", err);

        let err = load("\n\nnot a header\n").unwrap_err();
        assert!(matches!(err, ProdInfoError::InvalidRegFile { line: 3, .. }), "{:?}", err);

        let err = load("REGEDIT4\n\"Orphan\"=\"x\"\n").unwrap_err();
        assert!(matches!(err, ProdInfoError::InvalidRegFile { line: 2, .. }), "{:?}", err);

        let err = load("REGEDIT4\n[HKLM\\SOFTWARE\n").unwrap_err();
        assert!(matches!(err, ProdInfoError::InvalidRegFile { line: 2, .. }), "{:?}", err);

        assert!(load("").is_err());
    }
}

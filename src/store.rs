//! Hierarchical key-value store abstraction and its in-memory implementation.
//!
//! Installer queries only need four things from the registry: open a key
//! by path, list its subkeys, list its value names and read a value. The
//! [`RegistryStore`] trait captures exactly that, so queries run the same
//! against a live registry binding, a loaded `.reg` export or a test fixture.
//!
//! Paths are backslash-separated and relative to `HKEY_LOCAL_MACHINE`.
//! Key and value names compare case-insensitively, as in Windows.

use crate::error::Result;
use crate::utils::{join_path, split_path};
use crate::value::ValueData;
use tracing::trace;

/// An open key in a [`RegistryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyHandle {
    path: String,
}

impl KeyHandle {
    /// Creates a handle for a key path.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the full path of this key.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the last segment of the key path.
    pub fn name(&self) -> &str {
        self.path.rsplit('\\').next().unwrap_or_default()
    }
}

/// Read access to a hierarchical registry-like store.
pub trait RegistryStore {
    /// Opens a key by path, returning `None` if it does not exist.
    fn open_key(&self, path: &str) -> Result<Option<KeyHandle>>;

    /// Returns the names of the direct subkeys of `key`.
    fn child_keys(&self, key: &KeyHandle) -> Result<Vec<String>>;

    /// Returns the names of the values stored directly under `key`.
    fn value_names(&self, key: &KeyHandle) -> Result<Vec<String>>;

    /// Reads a value, returning `None` if it does not exist.
    fn value(&self, key: &KeyHandle, name: &str) -> Result<Option<ValueData>>;

    /// Opens a direct or nested subkey of `key`.
    fn open_subkey(&self, key: &KeyHandle, name: &str) -> Result<Option<KeyHandle>> {
        self.open_key(&join_path(key.path(), name))
    }

    /// Reads a string-typed value.
    ///
    /// Returns `None` if the value is missing or not a string type.
    fn string_value(&self, key: &KeyHandle, name: &str) -> Result<Option<String>> {
        Ok(self
            .value(key, name)?
            .and_then(|data| data.as_str().map(str::to_string)))
    }
}

#[derive(Debug, Clone, Default)]
struct KeyNode {
    name: String,
    subkeys: Vec<KeyNode>,
    values: Vec<(String, ValueData)>,
}

impl KeyNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn subkey(&self, name: &str) -> Option<&KeyNode> {
        self.subkeys.iter().find(|k| k.name.eq_ignore_ascii_case(name))
    }

    fn subkey_mut(&mut self, name: &str) -> Option<&mut KeyNode> {
        self.subkeys.iter_mut().find(|k| k.name.eq_ignore_ascii_case(name))
    }

    fn count(&self) -> usize {
        1 + self.subkeys.iter().map(KeyNode::count).sum::<usize>()
    }
}

/// In-memory registry tree.
///
/// Subkeys and values keep their insertion order. Writing a value to a
/// missing key creates the key and its parents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    root: KeyNode,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys in the store, excluding the root.
    pub fn key_count(&self) -> usize {
        self.root.count() - 1
    }

    /// Creates a key and any missing parents, returning a handle to it.
    pub fn create_key(&mut self, path: &str) -> KeyHandle {
        let (canonical, _) = self.ensure_key(path);
        KeyHandle::new(canonical)
    }

    /// Sets a value, creating the key if needed. An existing value with the
    /// same name is replaced in place.
    pub fn set_value(&mut self, path: &str, name: &str, data: ValueData) {
        let (_, node) = self.ensure_key(path);

        match node.values.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = data,
            None => node.values.push((name.to_string(), data)),
        }
    }

    /// Walks to a key, creating missing segments, and returns its
    /// canonical path together with the node.
    fn ensure_key(&mut self, path: &str) -> (String, &mut KeyNode) {
        let mut node = &mut self.root;
        let mut canonical = String::new();

        for segment in split_path(path) {
            let index = match node
                .subkeys
                .iter()
                .position(|k| k.name.eq_ignore_ascii_case(segment))
            {
                Some(index) => index,
                None => {
                    trace!(key = segment, "Creating key");
                    node.subkeys.push(KeyNode::new(segment));
                    node.subkeys.len() - 1
                }
            };
            node = &mut node.subkeys[index];
            canonical = join_path(&canonical, &node.name);
        }

        (canonical, node)
    }

    /// Deletes a key and everything below it. Returns true if it existed.
    pub fn delete_key(&mut self, path: &str) -> bool {
        let mut segments: Vec<&str> = split_path(path).collect();
        let Some(last) = segments.pop() else {
            return false;
        };

        let parent = if segments.is_empty() {
            Some(&mut self.root)
        } else {
            self.find_mut(&segments.join("\\"))
        };

        match parent {
            Some(parent) => {
                let before = parent.subkeys.len();
                parent.subkeys.retain(|k| !k.name.eq_ignore_ascii_case(last));
                before != parent.subkeys.len()
            }
            None => false,
        }
    }

    /// Deletes a single value. Returns true if it existed.
    pub fn delete_value(&mut self, path: &str, name: &str) -> bool {
        match self.find_mut(path) {
            Some(node) => {
                let before = node.values.len();
                node.values.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
                before != node.values.len()
            }
            None => false,
        }
    }

    fn find(&self, path: &str) -> Option<&KeyNode> {
        let mut node = &self.root;
        for segment in split_path(path) {
            node = node.subkey(segment)?;
        }
        Some(node)
    }

    fn find_mut(&mut self, path: &str) -> Option<&mut KeyNode> {
        let mut node = &mut self.root;
        for segment in split_path(path) {
            node = node.subkey_mut(segment)?;
        }
        Some(node)
    }
}

impl RegistryStore for MemoryStore {
    fn open_key(&self, path: &str) -> Result<Option<KeyHandle>> {
        let mut node = &self.root;
        let mut canonical = String::new();

        for segment in split_path(path) {
            match node.subkey(segment) {
                Some(child) => {
                    canonical = join_path(&canonical, &child.name);
                    node = child;
                }
                None => return Ok(None),
            }
        }

        Ok(Some(KeyHandle::new(canonical)))
    }

    fn child_keys(&self, key: &KeyHandle) -> Result<Vec<String>> {
        Ok(self
            .find(key.path())
            .map(|node| node.subkeys.iter().map(|k| k.name.clone()).collect())
            .unwrap_or_default())
    }

    fn value_names(&self, key: &KeyHandle) -> Result<Vec<String>> {
        Ok(self
            .find(key.path())
            .map(|node| node.values.iter().map(|(n, _)| n.clone()).collect())
            .unwrap_or_default())
    }

    fn value(&self, key: &KeyHandle, name: &str) -> Result<Option<ValueData>> {
        Ok(self.find(key.path()).and_then(|node| {
            node.values
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, data)| data.clone())
        }))
    }
}

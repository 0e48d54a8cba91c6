//! Windows Installer queries over a [`RegistryStore`].
//!
//! Windows Installer records package families under
//! `Installer\UpgradeCodes\<compact upgrade code>`, with one value per
//! installed product named by the product's compact code. Display names
//! live under the `Uninstall\{product code}` keys, in either the native
//! or the 32-bit (`Wow6432Node`) view.

use crate::codec::IdentifierCodec;
use crate::error::Result;
use crate::store::{KeyHandle, RegistryStore};
use crate::utils::join_path;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

/// Registry value holding a product's display name.
pub const DISPLAY_NAME_VALUE: &str = "DisplayName";

/// Registry locations consulted by [`Installer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerPaths {
    /// Key holding one subkey per upgrade code.
    pub upgrade_codes: String,

    /// Native uninstall key.
    pub uninstall: String,

    /// Uninstall key of the 32-bit registry view.
    pub uninstall_wow64: String,
}

impl Default for InstallerPaths {
    fn default() -> Self {
        Self {
            upgrade_codes: "SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Installer\\UpgradeCodes"
                .to_string(),
            uninstall: "SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Uninstall".to_string(),
            uninstall_wow64: "SOFTWARE\\Wow6432Node\\Microsoft\\Windows\\CurrentVersion\\Uninstall"
                .to_string(),
        }
    }
}

/// An installed product.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProductEntry {
    /// Product code.
    pub product_code: Uuid,

    /// Display name, or `None` when the product has no uninstall entry.
    pub name: Option<String>,
}

/// An upgrade code and the products registered under it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UpgradeEntry {
    /// Upgrade code.
    pub upgrade_code: Uuid,

    /// Products sharing this upgrade code, in registry order.
    pub products: Vec<ProductEntry>,
}

/// Installer metadata queries.
pub struct Installer<'a, S: RegistryStore + ?Sized> {
    store: &'a S,
    codec: IdentifierCodec,
    paths: InstallerPaths,
}

impl<'a, S: RegistryStore + ?Sized> Installer<'a, S> {
    /// Creates a query object using the default registry locations.
    pub fn new(store: &'a S) -> Self {
        Self::with_paths(store, InstallerPaths::default())
    }

    /// Creates a query object using custom registry locations.
    pub fn with_paths(store: &'a S, paths: InstallerPaths) -> Self {
        Self {
            store,
            codec: IdentifierCodec::new(),
            paths,
        }
    }

    /// Returns the product codes registered under an upgrade code.
    ///
    /// Returns `None` if the upgrade code is not registered at all.
    ///
    /// # Errors
    ///
    /// Returns `ProdInfoError::InvalidFormat` if a value name under the
    /// upgrade code key is not a compact GUID.
    #[instrument(skip(self))]
    pub fn product_codes(&self, upgrade_code: &Uuid) -> Result<Option<Vec<Uuid>>> {
        let compact = self.codec.to_compact(upgrade_code);
        let path = join_path(&self.paths.upgrade_codes, compact.as_str());

        let Some(key) = self.store.open_key(&path)? else {
            debug!(key = %path, "Upgrade code not registered");
            return Ok(None);
        };

        self.decode_value_names(&key).map(Some)
    }

    /// Finds the upgrade code a product is registered under.
    ///
    /// Upgrade code keys are scanned in registry order and the first one
    /// with a value name containing the product's compact code wins.
    #[instrument(skip(self))]
    pub fn upgrade_code(&self, product_code: &Uuid) -> Result<Option<Uuid>> {
        let needle = self.codec.to_compact(product_code);

        let Some(root) = self.store.open_key(&self.paths.upgrade_codes)? else {
            return Ok(None);
        };

        for subkey_name in self.store.child_keys(&root)? {
            let Some(subkey) = self.store.open_subkey(&root, &subkey_name)? else {
                continue;
            };

            let found = self
                .store
                .value_names(&subkey)?
                .iter()
                .any(|name| needle.found_in(name));

            if found {
                trace!(key = subkey.name(), "Product found under upgrade code");
                return self.codec.from_compact(subkey.name()).map(Some);
            }
        }

        Ok(None)
    }

    /// Looks up a product's display name.
    ///
    /// The native uninstall key is tried first, then the 32-bit one.
    /// Returns `None` if neither has an entry for the product, and an
    /// empty string if the entry exists without a `DisplayName` value.
    pub fn product_name(&self, product_code: &Uuid) -> Result<Option<String>> {
        let braced = product_code.braced().to_string();

        for uninstall in [&self.paths.uninstall, &self.paths.uninstall_wow64] {
            let path = join_path(uninstall, &braced);
            if let Some(key) = self.store.open_key(&path)? {
                let name = self.store.string_value(&key, DISPLAY_NAME_VALUE)?;
                return Ok(Some(name.unwrap_or_default()));
            }
        }

        trace!(product = %product_code, "No uninstall entry");
        Ok(None)
    }

    /// Returns the products of an upgrade code together with their names.
    pub fn products(&self, upgrade_code: &Uuid) -> Result<Option<Vec<ProductEntry>>> {
        match self.product_codes(upgrade_code)? {
            Some(codes) => self.describe(codes).map(Some),
            None => Ok(None),
        }
    }

    /// Lists every registered upgrade code with its products.
    ///
    /// Returns an empty list if the upgrade codes key does not exist.
    #[instrument(skip(self))]
    pub fn upgrade_codes(&self) -> Result<Vec<UpgradeEntry>> {
        let Some(root) = self.store.open_key(&self.paths.upgrade_codes)? else {
            debug!(key = %self.paths.upgrade_codes, "Upgrade codes key missing");
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for subkey_name in self.store.child_keys(&root)? {
            let Some(subkey) = self.store.open_subkey(&root, &subkey_name)? else {
                continue;
            };

            let upgrade_code = self.codec.from_compact(subkey.name())?;
            let codes = self.decode_value_names(&subkey)?;
            entries.push(UpgradeEntry {
                upgrade_code,
                products: self.describe(codes)?,
            });
        }

        debug!(count = entries.len(), "Collected upgrade codes");
        Ok(entries)
    }

    fn decode_value_names(&self, key: &KeyHandle) -> Result<Vec<Uuid>> {
        self.store
            .value_names(key)?
            .iter()
            .map(|name| self.codec.from_compact(name))
            .collect()
    }

    fn describe(&self, codes: Vec<Uuid>) -> Result<Vec<ProductEntry>> {
        codes
            .into_iter()
            .map(|product_code| {
                Ok(ProductEntry {
                    product_code,
                    name: self.product_name(&product_code)?,
                })
            })
            .collect()
    }
}

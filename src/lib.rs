//! # Windows Installer product information
//!
//! Looks up the relationships between Windows Installer upgrade codes,
//! product codes and product display names stored in the registry.
//!
//! ## Features
//!
//! - **GUID codec**: converts GUIDs to and from the segment-reversed form
//!   Windows Installer uses for registry key and value names
//! - **Store abstraction**: queries run against any [`RegistryStore`]
//! - **Offline inspection**: loads `regedit` exports (`.reg`, UTF-16 or
//!   ANSI) into an in-memory store
//! - **JSON output**: serializable results behind the `json` feature
//!
//! ## Registry Layout
//!
//! ```text
//! HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion
//!   Installer\UpgradeCodes
//!     <compact upgrade code>
//!       <compact product code> = ""
//!   Uninstall
//!     {product code}
//!       DisplayName = "..."
//! HKLM\SOFTWARE\Wow6432Node\Microsoft\Windows\CurrentVersion
//!   Uninstall
//!     {product code}
//!       DisplayName = "..."
//! ```
//!
//! ## Examples
//!
//! ```
//! use prodinfo::{Installer, MemoryStore};
//! use uuid::Uuid;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = MemoryStore::new();
//! store.load_reg_str(r#"Windows Registry Editor Version 5.00
//!
//! [HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Installer\UpgradeCodes\00002109030000000000000000F01FEC]
//! "8765432143218765A9CBED0F21436587"=""
//!
//! [HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\{12345678-1234-5678-9ABC-DEF012345678}]
//! "DisplayName"="Example Product"
//! "#)?;
//!
//! let installer = Installer::new(&store);
//! let upgrade_code = Uuid::parse_str("90120000-0030-0000-0000-0000000FF1CE")?;
//!
//! for product in installer.products(&upgrade_code)?.unwrap_or_default() {
//!     println!("{} {:?}", product.product_code, product.name);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod installer;
pub mod regfile;
pub mod report;
pub mod store;
pub mod utils;
pub mod value;

// Re-export main types for convenience
pub use codec::{CompactForm, IdentifierCodec, GUID_HEX_DIGITS, GUID_REGISTRY_PATTERN};
pub use error::{ProdInfoError, Result};
pub use installer::{Installer, InstallerPaths, ProductEntry, UpgradeEntry};
pub use store::{KeyHandle, MemoryStore, RegistryStore};
pub use value::{ValueData, ValueType};

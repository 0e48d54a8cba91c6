//! Text and JSON rendering of installer query results.

use crate::error::Result;
use crate::installer::{ProductEntry, UpgradeEntry};
use std::io::Write;
use uuid::Uuid;

/// Placeholder printed for products without an uninstall entry.
pub const UNDEFINED_NAME: &str = "[undefined]";

/// Indentation of product lines below their upgrade code.
const PRODUCT_INDENT: &str = "    ";

/// Writes every upgrade code followed by its indented products.
///
/// ```text
/// 90120000-0030-0000-0000-0000000ff1ce
///     12345678-1234-5678-9abc-def012345678 Example Product
/// ```
pub fn write_upgrade_codes<W: Write>(out: &mut W, entries: &[UpgradeEntry]) -> Result<()> {
    for entry in entries {
        writeln!(out, "{}", entry.upgrade_code)?;
        for product in &entry.products {
            write!(out, "{}", PRODUCT_INDENT)?;
            write_product(out, product)?;
        }
    }
    Ok(())
}

/// Writes one `<product code> <name>` line per product.
pub fn write_products<W: Write>(out: &mut W, products: &[ProductEntry]) -> Result<()> {
    for product in products {
        write_product(out, product)?;
    }
    Ok(())
}

/// Writes the upgrade code owning a product.
pub fn write_upgrade_code<W: Write>(out: &mut W, upgrade_code: &Uuid) -> Result<()> {
    writeln!(out, "{}", upgrade_code)?;
    Ok(())
}

fn write_product<W: Write>(out: &mut W, product: &ProductEntry) -> Result<()> {
    let name = product.name.as_deref().unwrap_or(UNDEFINED_NAME);
    writeln!(out, "{} {}", product.product_code, name)?;
    Ok(())
}

/// Serializes query results as pretty-printed JSON followed by a newline.
#[cfg(feature = "json")]
pub fn write_json<W: Write, T: serde::Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(std::io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid(s: &str) -> Uuid {
        Uuid::parse_str(s).unwrap()
    }

    fn entries() -> Vec<UpgradeEntry> {
        vec![UpgradeEntry {
            upgrade_code: uuid("90120000-0030-0000-0000-0000000FF1CE"),
            products: vec![
                ProductEntry {
                    product_code: uuid("12345678-1234-5678-9abc-def012345678"),
                    name: Some("Example Product".into()),
                },
                ProductEntry {
                    product_code: uuid("8d3c9a04-1d7c-4e1b-9e07-6c7c5c4d1f2a"),
                    name: None,
                },
            ],
        }]
    }

    #[test]
    fn test_write_upgrade_codes() {
        let mut out = Vec::new();
        write_upgrade_codes(&mut out, &entries()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "90120000-0030-0000-0000-0000000ff1ce\n\
             \x20   12345678-1234-5678-9abc-def012345678 Example Product\n\
             \x20   8d3c9a04-1d7c-4e1b-9e07-6c7c5c4d1f2a [undefined]\n"
        );
    }

    #[test]
    fn test_write_products() {
        let mut out = Vec::new();
        write_products(&mut out, &entries()[0].products[..1]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "12345678-1234-5678-9abc-def012345678 Example Product\n"
        );
    }

    #[test]
    fn test_write_upgrade_code() {
        let mut out = Vec::new();
        let code = uuid("90120000-0030-0000-0000-0000000FF1CE");
        write_upgrade_code(&mut out, &code).unwrap();
        assert_eq!(out, b"90120000-0030-0000-0000-0000000ff1ce\n");
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_write_json() {
        let mut out = Vec::new();
        write_json(&mut out, &entries()).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            parsed[0]["upgrade_code"],
            "90120000-0030-0000-0000-0000000ff1ce"
        );
        assert_eq!(parsed[0]["products"][1]["name"], serde_json::Value::Null);
    }
}

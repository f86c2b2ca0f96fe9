//! Encode/decode helpers for SQLite ↔ domain type conversions.

use navbar::{NavbarError, Page};

/// Encode a `Page` to the string used in the SQLite CHECK.
pub fn encode_page(page: Page) -> &'static str {
    page.as_str()
}

/// Decode a page column back into a `Page`.
pub fn decode_page(s: &str) -> Result<Page, NavbarError> {
    s.parse()
}

/// `bar_idx` column values are guaranteed `>= 1` by the schema.
pub fn decode_position(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

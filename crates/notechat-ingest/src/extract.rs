//! Per-format text readers.
//!
//! Every reader takes the raw upload bytes and returns plain text. A
//! document that parses but holds no text yields `""`; bytes that do not
//! parse as the declared format yield [`notechat_core::Error::Extraction`].

pub mod docx;
pub mod pdf;
pub mod pptx;
pub mod sheet;

use notechat_core::{Error, Result};

const UTF8_BOM: &str = "\u{feff}";

/// Strict UTF-8, leading byte-order mark dropped.
pub fn plain_text(bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes).map_err(|e| Error::extraction("txt", e))?;
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text).to_string())
}

//! PDF text via lopdf, one page at a time.

use lopdf::Document;
use tracing::{debug, warn};

use notechat_core::{Error, Result};

/// Extract page text in page order. Whitespace-only pages are dropped.
pub fn extract(bytes: &[u8]) -> Result<String> {
    let doc = Document::load_mem(bytes).map_err(|e| Error::extraction("pdf", e))?;
    let pages = doc.get_pages();
    debug!("PDF has {} pages", pages.len());

    let mut parts = Vec::with_capacity(pages.len());
    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(text) if !text.trim().is_empty() => parts.push(text),
            Ok(_) => debug!("Page {} has no text", page_num),
            // A single unreadable page (odd font encoding, broken stream) is skipped.
            Err(e) => warn!("Failed to extract text from page {}: {}", page_num, e),
        }
    }

    Ok(parts.join("\n"))
}

//! PPTX shape text, read straight from the slide XML inside the zip.

use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use zip::ZipArchive;

use notechat_core::{Error, Result};

static SLIDE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());
static SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<p:sp(?:\s[^>]*)?>(.*?)</p:sp>").unwrap());
static PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<a:p(?:\s[^>]*)?>(.*?)</a:p>").unwrap());
static RUN_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"<a:t(?:\s[^>]*)?>([^<]*)</a:t>").unwrap());
static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#[xX]([0-9a-fA-F]{1,6})|#([0-9]{1,7})|(lt|gt|quot|apos|amp));").unwrap()
});

/// Text-bearing shapes in slide order, then shape order, one per line.
pub fn extract(bytes: &[u8]) -> Result<String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| Error::extraction("pptx", e))?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let caps = SLIDE_NAME.captures(name)?;
            let num = caps[1].parse().ok()?;
            Some((num, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(num, _)| *num);
    debug!("PPTX has {} slides", slides.len());

    let mut shapes = Vec::new();
    for (_, name) in &slides {
        let mut xml = String::new();
        archive
            .by_name(name)
            .map_err(|e| Error::extraction("pptx", e))?
            .read_to_string(&mut xml)
            .map_err(|e| Error::extraction("pptx", e))?;
        shapes.extend(shape_texts(&xml));
    }

    Ok(shapes.join("\n"))
}

/// Non-empty shape texts of one slide. Paragraphs inside a shape are
/// separated by newlines.
fn shape_texts(xml: &str) -> Vec<String> {
    SHAPE
        .captures_iter(xml)
        .filter_map(|shape| {
            let paragraphs: Vec<String> = PARAGRAPH
                .captures_iter(&shape[1])
                .map(|p| {
                    RUN_TEXT
                        .captures_iter(&p[1])
                        .map(|t| unescape(&t[1]))
                        .collect::<String>()
                })
                .collect();
            let text = paragraphs.join("\n");
            (!text.trim().is_empty()).then_some(text)
        })
        .collect()
}

/// Decode the predefined XML entities and numeric character references in
/// one pass. References to invalid code points are left as written.
fn unescape(s: &str) -> String {
    ENTITY
        .replace_all(s, |caps: &regex::Captures| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (None, Some(dec)) => dec.as_str().parse().ok(),
                (None, None) => {
                    return match &caps[3] {
                        "lt" => "<",
                        "gt" => ">",
                        "quot" => "\"",
                        "apos" => "'",
                        _ => "&",
                    }
                    .to_string()
                }
            };
            code.and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

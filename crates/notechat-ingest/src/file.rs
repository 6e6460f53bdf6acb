//! Supported upload formats and text extraction dispatch.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract;
use notechat_core::{Error, Result};

/// Supported file types for text extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    Xls,
    Txt,
}

impl FileType {
    pub const ALL: [FileType; 6] = [
        Self::Pdf,
        Self::Docx,
        Self::Pptx,
        Self::Xlsx,
        Self::Xls,
        Self::Txt,
    ];

    /// Map an upload's file extension (without the dot) to a type tag.
    ///
    /// Legacy `doc` and `ppt` uploads are handed to the OOXML readers.
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" | "doc" => Ok(Self::Docx),
            "pptx" | "ppt" => Ok(Self::Pptx),
            "xlsx" => Ok(Self::Xlsx),
            "xls" => Ok(Self::Xls),
            "txt" => Ok(Self::Txt),
            other => Err(Error::UnsupportedType(other.to_string())),
        }
    }

    /// Detect file type from a file name's extension.
    pub fn from_filename(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        Self::from_extension(ext)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a type tag exactly; extension aliases are not accepted here.
impl FromStr for FileType {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| Error::UnsupportedType(tag.to_string()))
    }
}

/// Extract plain text from `bytes` of the given type.
pub fn extract_text(bytes: &[u8], file_type: FileType) -> Result<String> {
    let text = match file_type {
        FileType::Pdf => extract::pdf::extract(bytes)?,
        FileType::Docx => extract::docx::extract(bytes)?,
        FileType::Pptx => extract::pptx::extract(bytes)?,
        FileType::Xlsx => extract::sheet::extract_xlsx(bytes)?,
        FileType::Xls => extract::sheet::extract_xls(bytes)?,
        FileType::Txt => extract::plain_text(bytes)?,
    };
    debug!("Extracted {} chars from {} bytes of {}", text.len(), bytes.len(), file_type);
    Ok(text)
}

/// Extract with a string type tag. Unknown tags fail before any parsing.
pub fn extract_tagged(bytes: &[u8], tag: &str) -> Result<String> {
    extract_text(bytes, tag.parse()?)
}

/// Read a file from disk and extract it according to its extension.
pub fn extract_path(path: &Path) -> Result<(FileType, String)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let file_type = FileType::from_filename(name)?;
    let bytes = std::fs::read(path)?;
    Ok((file_type, extract_text(&bytes, file_type)?))
}

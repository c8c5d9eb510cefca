//! Text extraction from uploaded documents
//!
//! Turns raw bytes of a supported format into plain text. Extraction is
//! lossy with respect to layout (columns, tables, styling) but never with
//! respect to character data: plain text must be valid UTF-8, no
//! replacement characters are substituted.

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
    Html,
}

impl DocumentFormat {
    /// Determine the format from a filename extension.
    ///
    /// Unknown and missing extensions are rejected rather than guessed.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" | "md" | "text" => Ok(Self::Text),
            "html" | "htm" => Ok(Self::Html),
            _ => Err(Error::UnsupportedFormat(filename.to_string())),
        }
    }
}

/// Extract plain text from document bytes.
///
/// `source_label` (filename or URL) is only used for error messages.
pub fn extract(data: &[u8], format: DocumentFormat, source_label: &str) -> Result<String> {
    match format {
        DocumentFormat::Text => extract_text(data, source_label),
        DocumentFormat::Html => {
            let raw = extract_text(data, source_label)?;
            Ok(extract_html(&raw))
        }
        DocumentFormat::Pdf => extract_pdf(data, source_label),
    }
}

fn extract_text(data: &[u8], source_label: &str) -> Result<String> {
    std::str::from_utf8(data)
        .map(|s| s.to_string())
        .map_err(|e| Error::decode(source_label, e.to_string()))
}

/// Pull readable text out of an HTML page.
///
/// Only block-level content elements contribute; scripts, styles, and
/// navigation chrome outside those elements are dropped. A matched element
/// nested inside another matched element is skipped so its text is not
/// collected twice.
pub fn extract_html(html: &str) -> String {
    let document = Html::parse_document(html);
    // Infallible for a fixed selector list.
    let selector = match Selector::parse("p, h1, h2, h3, h4, h5, h6, li, blockquote, pre, td, th")
    {
        Ok(s) => s,
        Err(_) => return String::new(),
    };

    let matched: HashSet<_> = document.select(&selector).map(|el| el.id()).collect();

    let mut parts = Vec::new();
    for element in document.select(&selector) {
        if element
            .ancestors()
            .any(|ancestor| matched.contains(&ancestor.id()))
        {
            continue;
        }
        let text = element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() {
            parts.push(text);
        }
    }
    parts.join("\n")
}

fn extract_pdf(data: &[u8], source_label: &str) -> Result<String> {
    let raw = pdf_extract::extract_text_from_mem(data)
        .map_err(|e| Error::extraction(source_label, e.to_string()))?;
    // PDF extraction scatters hard line breaks everywhere; collapse
    // whitespace per line and drop blank lines.
    let cleaned = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    Ok(cleaned)
}

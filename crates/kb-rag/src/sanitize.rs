//! Blocklist-based text redaction
//!
//! A simple pattern filter, not a security boundary. Every case-insensitive
//! whole-word occurrence of a configured term is replaced by a fixed-length
//! mask, leaving surrounding text untouched.

use regex::RegexBuilder;

use crate::config::SanitizerConfig;
use crate::error::{Error, Result};

/// Replacement for matched blocklist terms, fixed regardless of term length
pub const MASK: &str = "****";

/// Whole-word blocklist redactor
pub struct Sanitizer {
    pattern: Option<regex::Regex>,
}

impl Sanitizer {
    /// Compile a sanitizer from the configured blocklist.
    ///
    /// An empty blocklist produces an identity sanitizer.
    pub fn new(config: &SanitizerConfig) -> Result<Self> {
        let terms: Vec<String> = config
            .blocklist
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();

        if terms.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", terms.join("|")))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Config(format!("invalid blocklist pattern: {e}")))?;

        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Redact all whole-word blocklist matches. Idempotent.
    pub fn sanitize(&self, text: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern.replace_all(text, MASK).into_owned(),
            None => text.to_string(),
        }
    }
}

//! Query construction for the findAddressCandidates endpoint.

use super::types::AddressQuery;
use std::fmt::Write;

/// Word separator the geocoder expects in place of spaces.
pub const WORD_SEPARATOR: char = '+';

/// Normalize one address field for transmission.
///
/// Whitespace runs become a single `+`, leading and trailing whitespace is
/// dropped, and every byte outside the URL unreserved set is percent-encoded.
pub fn normalize_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, word) in value.split_whitespace().enumerate() {
        if i > 0 {
            out.push(WORD_SEPARATOR);
        }
        for b in word.bytes() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
                out.push(b as char);
            } else {
                // writing into a String cannot fail
                let _ = write!(out, "%{:02X}", b);
            }
        }
    }
    out
}

/// A fully built candidate search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRequest {
    url: String,
}

impl CandidateRequest {
    pub fn new(endpoint: &str, query: &AddressQuery) -> Self {
        let sep = if endpoint.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{}Street={}&City={}&ZIP={}&f=json",
            endpoint,
            sep,
            normalize_field(&query.street),
            normalize_field(&query.city),
            normalize_field(&query.postal_code),
        );
        Self { url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

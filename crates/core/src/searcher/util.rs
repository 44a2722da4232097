//! Text and ranking helpers shared by the KAT parsers and query builder.

use std::str::FromStr;

use unicode_normalization::UnicodeNormalization;

use super::ParseError;

/// Rate a torrent by its availability.
///
/// Seeders count double since they hold the complete content.
pub fn torrent_availability(seeds: u32, leeches: u32) -> u64 {
    u64::from(seeds) * 2 + u64::from(leeches)
}

/// Compose a string to Unicode NFC form.
pub fn normalize_unicode(text: &str) -> String {
    text.nfc().collect()
}

/// Normalize a search term: NFC composition, then lower-case.
pub fn normalize_search_term(term: &str) -> String {
    normalize_unicode(term).to_lowercase()
}

/// Parse a numeric field the way the site prints it, ignoring surrounding whitespace.
pub(crate) fn parse_number<T: FromStr>(field: &'static str, text: &str) -> Result<T, ParseError> {
    text.trim().parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: text.to_string(),
    })
}

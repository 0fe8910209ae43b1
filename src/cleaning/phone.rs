//! Phone number standardization for the users feed.
//!
//! Source numbers arrive as free text (spaces, dashes, parens, extension
//! markers) with a country code already validated upstream. The output is a
//! `+`, the dialing prefix for that country, and digits only.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_DIAL_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d+]").unwrap());

/// Dialing prefix for the country codes the users feed is filtered to.
pub fn dialing_prefix(country_code: &str) -> Option<&'static str> {
    match country_code {
        "GB" => Some("+44"),
        "DE" => Some("+49"),
        "US" => Some("+1"),
        _ => None,
    }
}

/// Normalize a free-text phone number against its country code.
///
/// Strips everything but digits and `+`. A number already carrying the
/// country prefix is left untouched, including any redundant `0` sitting
/// after the prefix. Otherwise a single local leading `0` is dropped and the
/// prefix is prepended.
///
/// Returns `None` for a country code with no known prefix; the users cleaner
/// filters codes before calling this, so `None` marks a row for rejection
/// rather than a crash.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let prefix = dialing_prefix(country_code)?;
    let cleaned = NON_DIAL_CHARS.replace_all(raw, "");
    if cleaned.starts_with(prefix) {
        return Some(cleaned.into_owned());
    }
    let local = cleaned.strip_prefix('0').unwrap_or(&cleaned);
    Some(format!("{}{}", prefix, local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gb_local_number_gains_prefix() {
        assert_eq!(
            normalize_phone("07911 123456", "GB").as_deref(),
            Some("+447911123456")
        );
    }

    #[test]
    fn already_prefixed_number_is_unchanged() {
        assert_eq!(
            normalize_phone("+447911123456", "GB").as_deref(),
            Some("+447911123456")
        );
    }

    #[test]
    fn redundant_zero_after_existing_prefix_is_preserved() {
        // Known limitation carried over from the source behavior
        assert_eq!(
            normalize_phone("+44 (0) 7911 123456", "GB").as_deref(),
            Some("+4407911123456")
        );
    }

    #[test]
    fn punctuation_is_stripped() {
        assert_eq!(
            normalize_phone("(030) 1234-5678", "DE").as_deref(),
            Some("+493012345678")
        );
        assert_eq!(
            normalize_phone("555-123-4567x89", "US").as_deref(),
            Some("+1555123456789")
        );
    }

    #[test]
    fn unknown_country_code_is_a_row_level_skip() {
        assert_eq!(normalize_phone("07911 123456", "FR"), None);
    }
}

//! City label normalization

use std::sync::OnceLock;

use regex::Regex;

use crate::crawler::content_extraction::collapse_whitespace;

fn parenthesized() -> &'static Regex {
    static PARENS: OnceLock<Regex> = OnceLock::new();
    PARENS.get_or_init(|| Regex::new(r"\([^)]*\)").expect("valid parentheses regex"))
}

fn digit_runs() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").expect("valid digits regex"))
}

/// Reduce an event label to the city it names
///
/// `"DevOpsDays Lisbon (2019)"` becomes `"DevOpsDays Lisbon"` and
/// `"Rome: DevOpsDays"` becomes `"DevOpsDays"`.
pub fn normalize_city(label: &str) -> String {
    let mut city = collapse_whitespace(label);

    if let Some((before, _)) = city.split_once(" - ") {
        city = before.to_string();
    }
    if let Some((_, after)) = city.rsplit_once(':') {
        city = after.to_string();
    }

    let city = parenthesized().replace_all(&city, "");
    let city = digit_runs().replace_all(&city, "");
    collapse_whitespace(&city)
}

/// Cache key for a label: normalized and lowercased
pub fn cache_key(label: &str) -> String {
    normalize_city(label).to_lowercase()
}

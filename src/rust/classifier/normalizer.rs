use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Matched without regard to case so that lowercasing can't expose a new URL on a second pass.
    static ref URL_PATTERN: Regex = Regex::new(r"(?i:http|www)\S+").unwrap();
    static ref MENTION_PATTERN: Regex = Regex::new(r"@\w+").unwrap();
    // Word chars, whitespace, the Vietnamese letter block and basic punctuation survive.
    static ref SPECIAL_CHAR_PATTERN: Regex =
        Regex::new(r"[^\w\s\x{00C0}-\x{1EF9},.!?]").unwrap();
}

/// Cleans raw comment text into the form the vectorizer was fitted on.
///
/// Steps run in order, each one working on the output of the previous:
/// 1. Empty input short-circuits to an empty string
/// 2. URLs (`http...`, `https...`, `www...` up to whitespace) are removed
/// 3. `@mentions` are removed
/// 4. Anything outside word characters, whitespace, U+00C0..U+1EF9 and `,.!?`
///    becomes a space
/// 5. Whitespace runs collapse to one space and the ends are trimmed
/// 6. The result is lowercased
///
/// Normalization never fails; input with nothing meaningful left yields `""`.
///
/// # Example
/// ```
/// use toxic_classifier::normalize;
///
/// assert_eq!(normalize("Xem tại https://t.co/x @admin  NGAY!!"), "xem tại ngay!!");
/// ```
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text = URL_PATTERN.replace_all(raw, "");
    let text = MENTION_PATTERN.replace_all(&text, "");
    let text = SPECIAL_CHAR_PATTERN.replace_all(&text, " ");

    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Like [`normalize`], treating a missing value as empty text.
pub fn normalize_optional(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}

/// Whether normalized text still carries something a vectorizer can use.
///
/// Punctuation-only leftovers such as `"!!!"` are not informational.
pub(crate) fn is_informational(normalized: &str) -> bool {
    normalized.chars().any(char::is_alphanumeric)
}

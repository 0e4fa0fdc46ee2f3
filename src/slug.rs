use unicode_normalization::UnicodeNormalization;

/// Derives the title a content section is expected to carry for `slug`.
///
/// Every hyphen becomes a single space; nothing else is normalized, so case,
/// accents and repeated hyphens survive unchanged.
pub fn slug_to_title(slug: &str) -> String {
    slug.replace('-', " ")
}

/// Builds the navigation slug for a display title.
///
/// The title is NFC-normalized and lowercased, whitespace runs collapse into
/// one hyphen, and anything that is neither alphanumeric nor a hyphen is
/// dropped. Accented letters are kept.
pub fn title_to_slug(title: &str) -> String {
    let normalized = title.nfc().collect::<String>().to_lowercase();
    let mut out = String::with_capacity(normalized.len());
    let mut pending_separator = false;
    for ch in normalized.trim().chars() {
        if ch.is_whitespace() {
            pending_separator = true;
            continue;
        }
        if !(ch.is_alphanumeric() || ch == '-') {
            continue;
        }
        if pending_separator && !out.is_empty() {
            out.push('-');
        }
        pending_separator = false;
        out.push(ch);
    }
    out
}

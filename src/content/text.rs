use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Words per minute assumed for the read-time estimate.
const READING_SPEED_WPM: usize = 200;

/// Derives a URL slug from a title: lowercase ASCII, diacritics stripped,
/// every run of non-alphanumeric characters collapsed to a single hyphen,
/// no leading or trailing hyphen. Idempotent.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        for lc in c.to_lowercase() {
            if lc.is_ascii_alphanumeric() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(lc);
            } else {
                pending_hyphen = true;
            }
        }
    }

    slug
}

/// Estimates the reading time of an HTML fragment in minutes at a fixed
/// rate of 200 words per minute, rounded up, with a floor of one minute.
/// Markup is excluded from the word count.
pub fn estimate_read_time(content: &str) -> u32 {
    let mut text = String::with_capacity(content.len());
    let mut in_tag = false;
    for c in content.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }

    let words = text.split_whitespace().count();

    words.div_ceil(READING_SPEED_WPM).max(1) as u32
}

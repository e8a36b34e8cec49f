use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Builds a URL-safe identifier: lowercase, NFKD-decomposed, whitespace and
/// underscores become dashes, anything that is not a letter, digit or dash is
/// dropped, and dash runs collapse. Decomposition strips accents (`é` becomes
/// `e`, `й` becomes `и`); other non-ASCII letters are kept.
///
/// Input with no usable characters falls back to `id-` followed by the base-36
/// code points of the trimmed input, or plain `id` when the input is blank.
#[must_use]
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    let decomposed: String = value.to_lowercase().nfkd().collect();
    for ch in decomposed.trim().chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_dash = true;
            continue;
        }
        if is_combining_mark(ch) || !ch.is_alphanumeric() {
            continue;
        }
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.push(ch);
    }

    if slug.is_empty() {
        fallback(value)
    } else {
        slug
    }
}

fn fallback(value: &str) -> String {
    let encoded: String = value
        .trim()
        .chars()
        .map(|ch| to_base36(u32::from(ch)))
        .collect();

    if encoded.is_empty() {
        "id".to_owned()
    } else {
        format!("id-{encoded}")
    }
}

fn to_base36(mut n: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_owned();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_words_with_single_dashes() {
        assert_eq!(slugify("  Upper  Body__Day "), "upper-body-day");
        assert_eq!(slugify("legs - - heavy"), "legs-heavy");
    }

    #[test]
    fn drops_punctuation_and_keeps_cyrillic() {
        assert_eq!(slugify("Груди: Жим!"), "груди-жим");
        assert_eq!(slugify("Back (v2)"), "back-v2");
    }

    #[test]
    fn decomposes_accented_letters() {
        assert_eq!(slugify("Груди-Жим лежачий"), "груди-жим-лежачии");
        assert_eq!(slugify("Café au lait"), "cafe-au-lait");
        assert_eq!(slugify("Ｌｅｇｓ ①"), "legs-1");
    }

    #[test]
    fn strips_edge_dashes() {
        assert_eq!(slugify("--core--"), "core");
    }

    #[test]
    fn falls_back_to_code_points() {
        assert_eq!(slugify("!!"), "id-xx");
        assert_eq!(slugify("   "), "id");
    }
}

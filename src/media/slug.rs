use deunicode::deunicode;

/// Directory name used when region and governorate slug to nothing.
pub const EMPTY_SLUG: &str = "unassigned";

/// Lowercase ASCII slug joined with `_`: "Eastern_Al Jandal" -> "eastern_al_jandal".
///
/// Non-ASCII text is transliterated first, so Arabic names keep a readable
/// directory instead of collapsing to [`EMPTY_SLUG`].
pub fn slugify(raw: &str) -> String {
    let ascii = deunicode(raw);
    let mut out = String::with_capacity(ascii.len());
    let mut pending_sep = false;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    if out.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        out
    }
}

/// Photo directory slug for a site's region/governorate pair.
pub fn site_slug(region: &str, governorate: &str) -> String {
    slugify(&format!("{region}_{governorate}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_words_with_underscore() {
        assert_eq!(site_slug("Eastern", "Al Jandal"), "eastern_al_jandal");
        assert_eq!(slugify("  Riyadh -- (North)  "), "riyadh_north");
    }

    #[test]
    fn transliterates_non_ascii() {
        assert_eq!(slugify("Café Région"), "cafe_region");

        let arabic = site_slug("الشرقية", "");
        assert_ne!(arabic, EMPTY_SLUG);
        assert!(arabic.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));

        let mixed = site_slug("Eastern", "الجندل");
        assert!(mixed.starts_with("eastern_"));
        assert!(mixed.len() > "eastern_".len());
    }

    #[test]
    fn punctuation_only_falls_back() {
        assert_eq!(site_slug("", ""), EMPTY_SLUG);
        assert_eq!(slugify(" -- () "), EMPTY_SLUG);
    }
}

use regex::Regex;
use std::sync::OnceLock;

static PARENTHETICAL_RE: OnceLock<Regex> = OnceLock::new();

/// Moves a trailing parenthetical modifier to the front of the search term:
/// `ginger (fresh)` searches as `fresh ginger`.
pub fn clean_search_query(item_name: &str) -> String {
    let re = PARENTHETICAL_RE.get_or_init(|| {
        Regex::new(r"^(.+?)\s*\((.+?)\)\s*$").expect("parenthetical regex is valid")
    });
    match re.captures(item_name) {
        Some(caps) => format!("{} {}", caps[2].trim(), caps[1].trim()),
        None => item_name.to_string(),
    }
}

/// Lowercased item name with parentheses removed, used for word matching.
pub fn normalize_item_name(item_name: &str) -> String {
    item_name
        .to_lowercase()
        .replace(['(', ')'], "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_moves_to_front() {
        assert_eq!(clean_search_query("ginger (fresh)"), "fresh ginger");
        assert_eq!(
            clean_search_query("chicken thighs (boneless)"),
            "boneless chicken thighs"
        );
    }

    #[test]
    fn plain_names_are_untouched() {
        assert_eq!(clean_search_query("brown rice"), "brown rice");
        assert_eq!(clean_search_query("(fresh) ginger"), "(fresh) ginger");
    }

    #[test]
    fn normalize_strips_parens() {
        assert_eq!(normalize_item_name("Ginger (Fresh)"), "ginger fresh");
    }
}

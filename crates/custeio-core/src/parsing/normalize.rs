use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Derive a document key from a display name.
///
/// Steps:
/// 1. Trim
/// 2. Lowercase
/// 3. Replace `/` with `-` (slashes are path separators in the store)
///
/// An empty result means the record must be skipped.
pub fn normalize_key(display_name: &str) -> String {
    display_name.trim().to_lowercase().replace('/', "-")
}

/// A key is valid when it is non-empty and already in normalized form.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && normalize_key(key) == key
}

/// Lowercase and strip accents so "Açúcar" matches "acucar".
pub fn fold_for_search(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_lowercase_slash() {
        assert_eq!(normalize_key(" Farinha/Trigo "), "farinha-trigo");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_key(""), "");
        assert_eq!(normalize_key("   "), "");
    }

    #[test]
    fn test_multiple_slashes() {
        assert_eq!(normalize_key("Óleo/Soja/900ml"), "óleo-soja-900ml");
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("farinha-trigo"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("Farinha"));
        assert!(!is_valid_key("a/b"));
        assert!(!is_valid_key(" a"));
    }

    #[test]
    fn test_fold_for_search() {
        assert_eq!(fold_for_search("Açúcar Refinado"), "acucar refinado");
        assert_eq!(fold_for_search("PÃO"), "pao");
    }
}

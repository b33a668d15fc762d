//! Page-side naming for bridge functions.
//!
//! A function `(namespace, name)` lives in the page's global scope as
//! `__bridge_<namespace>_<name>`, with any character that is not valid in a
//! script identifier replaced by `_`.

/// Prefix shared by every page-side bridge function.
pub const BRIDGE_PREFIX: &str = "__bridge_";

/// Replace separator punctuation so `raw` can be used inside a script identifier.
pub fn mangle(raw: &str) -> String {
    raw.chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() || character == '_' || character == '$' {
                character
            } else {
                '_'
            }
        })
        .collect()
}

/// Global page-side name of the function `name` in `namespace`.
pub fn bridge_function_name(namespace: &str, name: &str) -> String {
    format!("{BRIDGE_PREFIX}{}_{}", mangle(namespace), mangle(name))
}

/// Whether `raw` is usable as a parameter name once mangled.
pub(crate) fn is_valid_parameter(raw: &str) -> bool {
    raw.chars()
        .next()
        .is_some_and(|first| !first.is_ascii_digit())
        && !RESERVED_WORDS.contains(&raw)
}

/// Reserved words that cannot name a parameter.
const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "let", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "yield", "arguments", "eval",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_become_underscores() {
        assert_eq!(mangle("link-hints"), "link_hints");
        assert_eq!(mangle("a.b/c d"), "a_b_c_d");
        assert_eq!(mangle("keep_$this9"), "keep_$this9");
    }

    #[test]
    fn function_names_carry_the_prefix() {
        assert_eq!(
            bridge_function_name("link-hints", "fetch"),
            "__bridge_link_hints_fetch"
        );
        assert_eq!(
            bridge_function_name("sections", "clean-up"),
            "__bridge_sections_clean_up"
        );
    }

    #[test]
    fn parameters_must_not_start_with_digits_or_be_reserved() {
        assert!(is_valid_parameter("matching"));
        assert!(is_valid_parameter("selected_id"));
        assert!(!is_valid_parameter("1st"));
        assert!(!is_valid_parameter(""));
        assert!(!is_valid_parameter("function"));
    }
}

pub use self::column::{Column, ColumnType};
pub use self::definition::{QueryDef, QueryKind, QuerySpec};

pub mod column;
pub mod definition;
pub mod placeholders;

/// Reserved words that cannot name a generated function, parameter or local.
const CPP_KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "asm", "auto", "bool", "break", "case", "catch", "char",
    "class", "const", "constexpr", "continue", "decltype", "default", "delete", "do",
    "double", "else", "enum", "explicit", "export", "extern", "false", "float", "for",
    "friend", "goto", "if", "inline", "int", "long", "mutable", "namespace", "new",
    "noexcept", "not", "nullptr", "operator", "or", "private", "protected", "public",
    "register", "return", "short", "signed", "sizeof", "static", "struct", "switch",
    "template", "this", "throw", "true", "try", "typedef", "typename", "union",
    "unsigned", "using", "virtual", "void", "volatile", "while",
];

/// Names the generated C++ declares itself: locals, fixed parameters and template
/// parameters. The configured statement local is checked separately.
pub const GENERATED_NAMES: &[&str] = &[
    "db",
    "r",
    "stmt",
    "handler",
    "m",
    "sql",
    "errmsg",
    "ensure_finalize",
    "Handler",
    "Model",
];

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// An identifier that is also usable as a C++ name.
pub fn is_cpp_identifier(name: &str) -> bool {
    is_identifier(name) && !CPP_KEYWORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::{is_cpp_identifier, is_identifier};

    #[test_case("id", true; "plain")]
    #[test_case("_private", true; "leading underscore")]
    #[test_case("users2", true; "trailing digit")]
    #[test_case("2users", false; "leading digit")]
    #[test_case("", false; "empty")]
    #[test_case("user-id", false; "dash")]
    #[test_case("名前", false; "non ascii")]
    fn identifier_rules(name: &str, expected: bool) {
        assert_eq!(is_identifier(name), expected);
    }

    #[test]
    fn keywords_are_not_cpp_identifiers() {
        assert!(is_identifier("delete"));
        assert!(!is_cpp_identifier("delete"));
        assert!(!is_cpp_identifier("int"));
        assert!(is_cpp_identifier("type"));
    }
}

//! Identifier normalization for generated TypeScript.
//!
//! Converts arbitrary table and column names into camelCase / PascalCase and
//! escapes names that would collide with TypeScript type keywords.

/// Names that cannot be used as-is for an interface or a member.
const RESERVED_WORDS: &[&str] = &[
    "any",
    "bigint",
    "boolean",
    "never",
    "null",
    "number",
    "object",
    "package",
    "string",
    "symbol",
    "undefined",
    "unknown",
    "void",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseOptions {
    /// Uppercase the first character: `foo-bar` -> `FooBar`.
    pub pascal_case: bool,
    /// Keep runs of capitals: `foo-BAR` -> `fooBAR`.
    pub preserve_consecutive_uppercase: bool,
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Appends `_` to names that collide with a reserved word.
pub fn safe_name(name: &str) -> String {
    if is_reserved(name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Whether `name` can be written without quotes as a property or type name.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c == '$' || c.is_alphabetic() => {}
        _ => return false,
    }

    chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}

pub fn pascal_case(input: &str) -> String {
    camel_case(
        input,
        CaseOptions {
            pascal_case: true,
            ..CaseOptions::default()
        },
    )
}

pub fn camel_case(input: &str, options: CaseOptions) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut chars: Vec<char> = trimmed.chars().collect();
    if chars.len() == 1 {
        return if options.pascal_case {
            upper(chars[0])
        } else {
            lower(chars[0])
        };
    }

    if trimmed != trimmed.to_lowercase() {
        chars = split_case_boundaries(chars);
    }

    let start = chars
        .iter()
        .position(|c| !is_separator(*c))
        .unwrap_or(chars.len());
    let rest: String = chars[start..].iter().collect();

    let mut value = if options.preserve_consecutive_uppercase {
        lower_leading_capital(&rest)
    } else {
        rest.to_lowercase()
    };

    if options.pascal_case {
        let mut it = value.chars();
        if let Some(first) = it.next() {
            value = upper(first) + it.as_str();
        }
    }

    upper_after_digits(&join_separated_words(&value))
}

fn is_separator(c: char) -> bool {
    matches!(c, '_' | '.' | '-' | ' ')
}

fn is_identifier_char(c: char) -> bool {
    c == '_' || c.is_alphabetic() || c.is_numeric()
}

fn lower(c: char) -> String {
    c.to_lowercase().collect()
}

fn upper(c: char) -> String {
    c.to_uppercase().collect()
}

fn is_lower_only(c: char) -> bool {
    lower(c) == c.to_string() && upper(c) != c.to_string()
}

fn is_upper_only(c: char) -> bool {
    upper(c) == c.to_string() && lower(c) != c.to_string()
}

/// Inserts `-` where the casing marks a new word: `fooBar` -> `foo-Bar`,
/// `XMLHttp` -> `XML-Http`.
fn split_case_boundaries(mut chars: Vec<char>) -> Vec<char> {
    let mut last_lower = false;
    let mut last_upper = false;
    let mut last_last_upper = false;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if last_lower && c.is_uppercase() {
            chars.insert(i, '-');
            last_lower = false;
            last_last_upper = last_upper;
            last_upper = true;
            i += 1;
        } else if last_upper && last_last_upper && c.is_lowercase() {
            chars.insert(i - 1, '-');
            last_last_upper = last_upper;
            last_upper = false;
            last_lower = true;
        } else {
            last_lower = is_lower_only(c);
            last_last_upper = last_upper;
            last_upper = is_upper_only(c);
        }

        i += 1;
    }

    chars
}

fn lower_leading_capital(value: &str) -> String {
    let mut it = value.chars();
    match (it.next(), it.clone().next()) {
        (Some(first), next) if first.is_uppercase() && !next.is_some_and(char::is_uppercase) => {
            lower(first) + it.as_str()
        }
        _ => value.to_string(),
    }
}

/// Drops separator runs and uppercases the character that follows each one.
fn join_separated_words(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());

    let mut i = 0;
    while i < chars.len() {
        if !is_separator(chars[i]) {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let end = chars[i..]
            .iter()
            .position(|c| !is_separator(*c))
            .map_or(chars.len(), |n| i + n);

        if end == chars.len() {
            break;
        }

        if is_identifier_char(chars[end]) {
            out.push_str(&upper(chars[end]));
            i = end + 1;
            continue;
        }

        // `_` is itself a word character, so a run like `-_` before a
        // non-word character collapses onto its last underscore.
        match chars[i + 1..end].iter().rposition(|c| *c == '_') {
            Some(n) => {
                out.push('_');
                i = i + 1 + n + 1;
            }
            None => {
                out.extend(&chars[i..end]);
                i = end;
            }
        }
    }

    out
}

fn upper_after_digits(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        out.push(c);
        if !c.is_ascii_digit() {
            continue;
        }

        while let Some(d) = chars.next_if(char::is_ascii_digit) {
            out.push(d);
        }

        if let Some(next) = chars.next_if(|c| is_identifier_char(*c)) {
            out.push_str(&upper(next));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camel(input: &str) -> String {
        camel_case(input, CaseOptions::default())
    }

    fn preserving(input: &str, pascal_case: bool) -> String {
        camel_case(
            input,
            CaseOptions {
                pascal_case,
                preserve_consecutive_uppercase: true,
            },
        )
    }

    #[test]
    fn test_camel_case_separators() {
        assert_eq!(camel("foo_bar"), "fooBar");
        assert_eq!(camel("foo-bar"), "fooBar");
        assert_eq!(camel("foo.bar"), "fooBar");
        assert_eq!(camel("foo bar"), "fooBar");
        assert_eq!(camel("--foo.bar"), "fooBar");
        assert_eq!(camel("__foo__bar__"), "fooBar");
        assert_eq!(camel("last_login"), "lastLogin");
    }

    #[test]
    fn test_camel_case_existing_casing() {
        assert_eq!(camel("Foo-Bar"), "fooBar");
        assert_eq!(camel("fooBar"), "fooBar");
        assert_eq!(camel("XMLHttpRequest"), "xmlHttpRequest");
        assert_eq!(camel("FOO"), "foo");
    }

    #[test]
    fn test_camel_case_digits() {
        assert_eq!(camel("foo2bar"), "foo2Bar");
        assert_eq!(camel("address_line_1"), "addressLine1");
        assert_eq!(camel("1st_place"), "1StPlace");
    }

    #[test]
    fn test_short_inputs() {
        assert_eq!(camel(""), "");
        assert_eq!(camel("   "), "");
        assert_eq!(camel("A"), "a");
        assert_eq!(pascal_case("a"), "A");
        assert_eq!(camel("-"), "-");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("foo_bar"), "FooBar");
        assert_eq!(pascal_case("Foo-Bar"), "FooBar");
        assert_eq!(pascal_case("account"), "Account");
        assert_eq!(pascal_case("user_accounts"), "UserAccounts");
    }

    #[test]
    fn test_preserve_consecutive_uppercase() {
        assert_eq!(preserving("XMLHttpRequest", false), "XMLHttpRequest");
        assert_eq!(preserving("Foo-BAR", false), "fooBAR");
        assert_eq!(preserving("fooBAR", true), "FooBAR");
    }

    #[test]
    fn test_separators_before_symbols() {
        assert_eq!(camel("a-$b"), "a-$b");
        assert_eq!(camel("a-_$b"), "a_$b");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for input in ["foo_bar", "XMLHttpRequest", "created_on", "a1b2", "user-ID"] {
            let once = camel(input);
            assert_eq!(camel(&once), once, "camel case of {input}");

            let once = pascal_case(input);
            assert_eq!(pascal_case(&once), once, "pascal case of {input}");
        }
    }

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("string"), "string_");
        assert_eq!(safe_name("number"), "number_");
        assert_eq!(safe_name("package"), "package_");
        assert_eq!(safe_name("account"), "account");
        assert_eq!(safe_name(&safe_name("string")), "string_");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("last_login"));
        assert!(is_identifier("$ref"));
        assert!(!is_identifier("first name"));
        assert!(!is_identifier("2fa"));
        assert!(!is_identifier(""));
    }
}

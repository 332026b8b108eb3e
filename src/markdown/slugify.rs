//! Filesystem-safe slugs.

/// Generate a lowercase, hyphen-separated slug from text.
///
/// Converts text to lowercase, replaces spaces and separators with hyphens,
/// drops everything else, and removes consecutive/leading/trailing hyphens.
///
/// # Examples
///
/// ```
/// use novelpress::markdown::slugify;
///
/// assert_eq!(slugify("The Salt Road"), "the-salt-road");
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
/// ```
pub fn slugify(text: &str) -> String {
    text.chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || matches!(c, '-' | '_' | '/' | '.' | ':') {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

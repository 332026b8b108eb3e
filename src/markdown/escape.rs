//! XML escaping for text placed in package documents.

/// Escape XML special characters.
///
/// # Examples
///
/// ```
/// use novelpress::markdown::escape_xml;
///
/// assert_eq!(escape_xml("Tom & Jerry"), "Tom &amp; Jerry");
/// assert_eq!(escape_xml("<tag>"), "&lt;tag&gt;");
/// ```
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + s.len() / 10);
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            // Control characters are not allowed in XML 1.0
            c if c.is_control() && !matches!(c, '\n' | '\t' | '\r') => {}
            _ => result.push(c),
        }
    }
    result
}

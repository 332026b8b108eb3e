//! Inline emphasis conversion.
//!
//! Input text must already be XML-escaped. Only emphasis delimiters are
//! rewritten; the only markup this module emits is `<em>` and `<strong>`.

/// Delimiter passes, longest first. Running the triple pass before the
/// double pass (and the double before the single) keeps `***x***` from
/// being split into mismatched halves.
const PASSES: &[(&str, &str, &str)] = &[
    ("***", "<strong><em>", "</em></strong>"),
    ("___", "<strong><em>", "</em></strong>"),
    ("**", "<strong>", "</strong>"),
    ("__", "<strong>", "</strong>"),
    ("*", "<em>", "</em>"),
    ("_", "<em>", "</em>"),
];

const TAGS: &[&str] = &["<em>", "</em>", "<strong>", "</strong>"];

/// Convert Markdown emphasis to XHTML tags.
///
/// A delimiter run only pairs with a run of exactly the same length. The
/// opener must be followed by non-whitespace and the closer preceded by
/// non-whitespace; underscores never open or close inside a word. Text that
/// contains no delimiters, including previously converted text, is returned
/// unchanged.
///
/// # Examples
///
/// ```
/// use novelpress::markdown::convert;
///
/// assert_eq!(convert("a *soft* word"), "a <em>soft</em> word");
/// assert_eq!(convert("**bold**"), "<strong>bold</strong>");
/// assert_eq!(convert("***both***"), "<strong><em>both</em></strong>");
/// assert_eq!(convert("snake_case_name"), "snake_case_name");
/// ```
pub fn convert(text: &str) -> String {
    if !text.contains(['*', '_']) {
        return text.to_string();
    }
    let mut out = text.to_string();
    for (delim, open, close) in PASSES {
        if out.contains(delim) {
            out = replace_pass(&out, delim, open, close);
        }
    }
    out
}

fn replace_pass(text: &str, delim: &str, open: &str, close: &str) -> String {
    let bytes = text.as_bytes();
    let marker = delim.as_bytes()[0];
    let len = delim.len();
    let intraword_allowed = marker == b'*';

    let mut result = String::with_capacity(text.len() + 16);
    let mut pos = 0;
    let mut copied = 0;

    while pos < bytes.len() {
        if bytes[pos] != marker {
            pos += 1;
            continue;
        }

        let run_end = run_end(bytes, pos, marker);
        let run_len = run_end - pos;
        if run_len != len || !can_open(text, pos, run_end, intraword_allowed) {
            pos = run_end;
            continue;
        }

        match find_closer(text, run_end, marker, len, intraword_allowed) {
            Some(close_start) if tags_balanced(&text[run_end..close_start]) => {
                result.push_str(&text[copied..pos]);
                result.push_str(open);
                result.push_str(&text[run_end..close_start]);
                result.push_str(close);
                pos = close_start + len;
                copied = pos;
            }
            _ => pos = run_end,
        }
    }

    result.push_str(&text[copied..]);
    result
}

fn run_end(bytes: &[u8], start: usize, marker: u8) -> usize {
    let mut end = start;
    while end < bytes.len() && bytes[end] == marker {
        end += 1;
    }
    end
}

/// First run of exactly `len` markers after `from` that can close.
fn find_closer(
    text: &str,
    from: usize,
    marker: u8,
    len: usize,
    intraword_allowed: bool,
) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut pos = from;
    while pos < bytes.len() {
        if bytes[pos] != marker {
            pos += 1;
            continue;
        }
        let end = run_end(bytes, pos, marker);
        if end - pos == len && can_close(text, from, pos, end, intraword_allowed) {
            return Some(pos);
        }
        pos = end;
    }
    None
}

fn can_open(text: &str, start: usize, end: usize, intraword_allowed: bool) -> bool {
    let next = text[end..].chars().next();
    if !next.is_some_and(|c| !c.is_whitespace()) {
        return false;
    }
    intraword_allowed || !text[..start].chars().next_back().is_some_and(char::is_alphanumeric)
}

fn can_close(
    text: &str,
    content_start: usize,
    start: usize,
    end: usize,
    intraword_allowed: bool,
) -> bool {
    if start == content_start {
        return false;
    }
    let prev = text[..start].chars().next_back();
    if !prev.is_some_and(|c| !c.is_whitespace()) {
        return false;
    }
    intraword_allowed || !text[end..].chars().next().is_some_and(char::is_alphanumeric)
}

/// Tags inside a span must open and close within it.
fn tags_balanced(inner: &str) -> bool {
    let mut stack: Vec<&str> = Vec::new();
    let mut rest = inner;
    while let Some(idx) = rest.find('<') {
        rest = &rest[idx..];
        let Some(tag) = TAGS.iter().find(|t| rest.starts_with(**t)) else {
            rest = &rest[1..];
            continue;
        };
        if let Some(name) = tag.strip_prefix("</") {
            let name = name.trim_end_matches('>');
            if stack.pop() != Some(name) {
                return false;
            }
        } else {
            stack.push(tag.trim_start_matches('<').trim_end_matches('>'));
        }
        rest = &rest[tag.len()..];
    }
    stack.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_italic() {
        assert_eq!(convert("a *word* here"), "a <em>word</em> here");
        assert_eq!(convert("a _word_ here"), "a <em>word</em> here");
    }

    #[test]
    fn test_bold() {
        assert_eq!(convert("**loud** noise"), "<strong>loud</strong> noise");
        assert_eq!(convert("__loud__ noise"), "<strong>loud</strong> noise");
    }

    #[test]
    fn test_bold_italic() {
        assert_eq!(convert("***both***"), "<strong><em>both</em></strong>");
        assert_eq!(convert("___both___"), "<strong><em>both</em></strong>");
    }

    #[test]
    fn test_nested_italic_in_bold() {
        assert_eq!(
            convert("**bold *and* more**"),
            "<strong>bold <em>and</em> more</strong>"
        );
        assert_eq!(
            convert("*very **bold** text*"),
            "<em>very <strong>bold</strong> text</em>"
        );
    }

    #[test]
    fn test_mismatched_runs_left_alone() {
        assert_eq!(convert("***a** b*"), "***a** b*");
        assert_eq!(convert("**open only"), "**open only");
    }

    #[test]
    fn test_crossing_spans_not_nested_wrongly() {
        let out = convert("*a **b* c**");
        assert!(tags_balanced(&out), "{out}");
    }

    #[test]
    fn test_whitespace_rules() {
        assert_eq!(convert("2 * 3 * 4"), "2 * 3 * 4");
        assert_eq!(convert("* not a list*"), "* not a list*");
    }

    #[test]
    fn test_intraword_underscores() {
        assert_eq!(convert("snake_case_name"), "snake_case_name");
        assert_eq!(convert("file_name and _this_"), "file_name and <em>this</em>");
        assert_eq!(convert("un*frigging*believable"), "un<em>frigging</em>believable");
    }

    #[test]
    fn test_escaped_entities_untouched() {
        assert_eq!(
            convert("&lt;b&gt; &amp; *x*"),
            "&lt;b&gt; &amp; <em>x</em>"
        );
    }

    #[test]
    fn test_converted_text_is_stable() {
        let once = convert("She *knew*. **Now.** ***Run.***");
        assert_eq!(convert(&once), once);
    }

    fn arb_marked_text() -> impl Strategy<Value = String> {
        prop::collection::vec(("[a-z]{1,8}", 0u8..4, any::<bool>()), 1..12).prop_map(|words| {
            words
                .into_iter()
                .map(|(word, style, underscore)| {
                    let d = if underscore { "_" } else { "*" };
                    match style {
                        0 => word,
                        n => {
                            let run = d.repeat(n as usize);
                            format!("{run}{word}{run}")
                        }
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    proptest! {
        #[test]
        fn prop_convert_is_idempotent(text in arb_marked_text()) {
            let once = convert(&text);
            prop_assert_eq!(convert(&once), once.clone());
            prop_assert!(!once.contains('*'));
            prop_assert!(tags_balanced(&once));
        }

        #[test]
        fn prop_plain_text_unchanged(text in "[a-zA-Z0-9 .,;<>/&]{0,64}") {
            prop_assert_eq!(convert(&text), text);
        }
    }
}

//! Chapter titles derived from act labels.

/// Words that introduce a structural ordinal ("Act 1", "Part II").
const PREFIX_WORDS: &[&str] = &["act", "part", "book", "chapter", "section", "volume"];

const NUMBER_WORDS: &[&str] = &[
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "first",
    "second", "third", "fourth", "fifth", "final",
];

/// Strip a leading structural prefix from an act label.
///
/// "Act 1: The Call" becomes "The Call", "Part 2 — Descent" becomes
/// "Descent". Labels without a prefix, or with nothing after it, are
/// returned trimmed but otherwise unchanged.
///
/// # Examples
///
/// ```
/// use novelpress::chapter::title_from_act;
///
/// assert_eq!(title_from_act("Act 1: The Call"), "The Call");
/// assert_eq!(title_from_act("Part IV - Ashes"), "Ashes");
/// assert_eq!(title_from_act("The Long Night"), "The Long Night");
/// ```
pub fn title_from_act(label: &str) -> String {
    let trimmed = label.trim();
    let mut words = trimmed.splitn(3, char::is_whitespace);

    let (Some(first), Some(second)) = (words.next(), words.next()) else {
        return trimmed.to_string();
    };
    if !PREFIX_WORDS.contains(&first.to_ascii_lowercase().as_str()) {
        return trimmed.to_string();
    }

    // The separator may be glued to the ordinal ("1:") or stand alone ("—").
    let ordinal = second.trim_end_matches(is_separator);
    if !is_ordinal(ordinal) {
        return trimmed.to_string();
    }

    let rest = words
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| is_separator(c) || c.is_whitespace())
        .trim();

    if rest.is_empty() {
        trimmed.to_string()
    } else {
        rest.to_string()
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, ':' | '.' | '-' | '–' | '—' | ',' | '|')
}

fn is_ordinal(word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    if word.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if word
        .chars()
        .all(|c| matches!(c.to_ascii_uppercase(), 'I' | 'V' | 'X' | 'L' | 'C'))
    {
        return true;
    }
    NUMBER_WORDS.contains(&word.to_ascii_lowercase().as_str())
}

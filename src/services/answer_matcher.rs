//! Fuzzy comparison between a free-text guess and the canonical answer.
//!
//! Catalog titles carry a lot of noise ("Time (Remastered 2011)",
//! "Song - Single Version", "Track feat. Someone"), so a guess is accepted
//! when it matches the answer after a sequence of increasingly lenient
//! normalizations. The first rule that matches wins.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum length ratio between the shorter and the longer string for a
/// substring match to count.
const CONTAINMENT_RATIO: f64 = 0.6;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid non-word pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").expect("valid bracket pattern"));
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\s)(?:by|feat\.?|featuring|-)(?:\s|$)").expect("valid separator pattern")
});

/// Lowercase, drop punctuation, collapse whitespace and trim.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_owned()
}

/// Remove `(...)` and `[...]` annotations, then normalize.
fn strip_brackets(text: &str) -> String {
    normalize(&BRACKETED.replace_all(text, " "))
}

/// Keep what precedes the first attribution separator, bracket-cleaned.
fn before_separator(text: &str) -> String {
    let without_brackets = BRACKETED.replace_all(text, " ");
    let prefix = match SEPARATOR.find(&without_brackets) {
        Some(found) => &without_brackets[..found.start()],
        None => &without_brackets[..],
    };
    normalize(prefix)
}

/// Whether `guess` should be accepted for `answer`.
pub fn is_match(guess: &str, answer: &str) -> bool {
    let guess_normalized = normalize(guess);
    let answer_normalized = normalize(answer);
    if guess_normalized.is_empty() || answer_normalized.is_empty() {
        return false;
    }

    if guess_normalized == answer_normalized {
        return true;
    }

    let answer_clean = strip_brackets(answer);
    let guess_clean = strip_brackets(guess);

    if !answer_clean.is_empty() && (guess_normalized == answer_clean || guess_clean == answer_clean)
    {
        return true;
    }

    if !guess_clean.is_empty() && guess_clean == answer_normalized {
        return true;
    }

    let guess_prefix = before_separator(guess);
    let answer_prefix = before_separator(answer);
    if !guess_prefix.is_empty() && guess_prefix == answer_prefix {
        return true;
    }

    contains_with_ratio(
        &[&guess_normalized, &guess_clean],
        &[&answer_normalized, &answer_clean],
    )
}

/// Substring acceptance, guarded against very short guesses.
///
/// The ratio is measured against the longer of the answer variants so that a
/// bracket-cleaned answer cannot make a tiny guess look proportionate.
fn contains_with_ratio(guesses: &[&str], answers: &[&str]) -> bool {
    let longest_answer = answers
        .iter()
        .map(|answer| answer.chars().count())
        .max()
        .unwrap_or(0);

    guesses
        .iter()
        .filter(|guess| !guess.is_empty())
        .any(|guess| {
            answers
                .iter()
                .filter(|answer| !answer.is_empty())
                .any(|answer| {
                    if !(answer.contains(*guess) || guess.contains(*answer)) {
                        return false;
                    }
                    let guess_len = guess.chars().count();
                    let shorter = guess_len.min(longest_answer) as f64;
                    let longer = guess_len.max(longest_answer) as f64;
                    longer > 0.0 && shorter / longer >= CONTAINMENT_RATIO
                })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_case_punctuation_and_spaces() {
        assert_eq!(normalize("  Hello,   World! "), "hello world");
        assert_eq!(normalize("Don't Stop Me Now"), "dont stop me now");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn identical_answers_match() {
        for text in ["Time", "Bohemian Rhapsody", "99 Luftballons", "Café del Mar"] {
            assert!(is_match(text, text), "{text}");
        }
    }

    #[test]
    fn case_and_punctuation_are_ignored() {
        assert!(is_match("Hello, World!", "hello world"));
        assert!(is_match("HELLO WORLD", "Hello, World!"));
    }

    #[test]
    fn bracketed_annotations_are_ignored() {
        assert!(is_match("Time", "Time (Remastered 2011)"));
        assert!(is_match("Time", "Time [Live]"));
        assert!(is_match("time (remaster)", "Time"));
        assert!(is_match("Time (Live)", "Time (Remastered 2011)"));
    }

    #[test]
    fn trailing_attributions_are_ignored() {
        assert!(is_match("Time", "Time - Single Version"));
        assert!(is_match("Love Me Again", "Love Me Again feat. Someone"));
        assert!(is_match("Love Me Again", "Love Me Again featuring Someone"));
        assert!(is_match("Stay", "Stay by The Kid LAROI"));
        assert!(is_match("Stay by Someone Else", "Stay"));
    }

    #[test]
    fn separators_only_count_as_whole_tokens() {
        assert!(!is_match("Good", "Goodbye Yellow Brick Road"));
        assert!(!is_match("Re", "Re-Wind"));
        assert!(!is_match("Baby", "Babylon"));
    }

    #[test]
    fn close_substrings_are_accepted() {
        assert!(is_match("Bohemian Rhapsod", "Bohemian Rhapsody"));
        assert!(is_match("the rolling stones", "Rolling Stones"));
    }

    #[test]
    fn short_substrings_are_rejected() {
        assert!(!is_match("the", "The Sound of Silence"));
        assert!(!is_match("love", "Whole Lotta Love"));
    }

    #[test]
    fn unrelated_guess_is_rejected() {
        assert!(!is_match("Money", "Time"));
    }

    #[test]
    fn empty_inputs_never_match() {
        assert!(!is_match("", "Time"));
        assert!(!is_match("Time", ""));
        assert!(!is_match("", ""));
        assert!(!is_match("   ", "Time"));
        assert!(!is_match("?!", "Time"));
    }
}

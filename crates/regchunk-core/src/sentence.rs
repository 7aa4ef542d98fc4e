//! Sentence-boundary detection.
//!
//! The chunker consumes sentences through the [`SentenceSplitter`] trait so
//! that a full linguistic model can be plugged in. [`PunctuationSplitter`]
//! is the built-in implementation: a punctuation splitter tuned for legal
//! text, where `160.101`, `Art. 5`, `U.S.C.` and `1.` enumerators must not
//! end a sentence.

use crate::error::CollaboratorError;

/// Splits text into ordered, non-empty sentences.
///
/// Implementations must be deterministic within one run. Errors propagate
/// unchanged out of the chunker.
pub trait SentenceSplitter: Send + Sync {
    fn split(&self, text: &str) -> Result<Vec<String>, CollaboratorError>;
}

impl<F> SentenceSplitter for F
where
    F: Fn(&str) -> Result<Vec<String>, CollaboratorError> + Send + Sync,
{
    fn split(&self, text: &str) -> Result<Vec<String>, CollaboratorError> {
        self(text)
    }
}

/// Punctuation-based splitter with legal abbreviation handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct PunctuationSplitter;

impl SentenceSplitter for PunctuationSplitter {
    fn split(&self, text: &str) -> Result<Vec<String>, CollaboratorError> {
        Ok(split_sentences(text))
    }
}

const ABBREVIATIONS: &[&str] = &[
    "al", "approx", "art", "arts", "cf", "ch", "cit", "co", "corp", "dept", "dr", "e.g", "et",
    "etc", "fed", "i.e", "ibid", "inc", "jr", "ltd", "mr", "mrs", "ms", "no", "nos", "op", "p",
    "para", "paras", "pp", "pt", "pub", "reg", "regs", "sec", "secs", "sr", "st", "stat",
    "subch", "subpt", "v", "viz", "vol", "vs",
];

const CLOSERS: &[char] = &['"', '\'', '”', '’', ')', ']'];
const OPENERS: &[char] = &['(', '[', '"', '“', '\''];

/// Split `text` into sentences.
///
/// Blank lines are hard boundaries. Inside a paragraph, whitespace is
/// collapsed and a sentence ends after a word whose last significant
/// character is `.`, `!` or `?`, unless the word is a known abbreviation,
/// an initial, a leading enumerator, or the next word starts lowercase.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();

    for paragraph in text.split("\n\n") {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        let mut current: Vec<&str> = Vec::new();

        for (i, word) in words.iter().enumerate() {
            current.push(word);
            if ends_sentence(word, words.get(i + 1).copied(), current.len() == 1) {
                sentences.push(current.join(" "));
                current.clear();
            }
        }
        if !current.is_empty() {
            sentences.push(current.join(" "));
        }
    }

    sentences
}

fn ends_sentence(word: &str, next: Option<&str>, leading: bool) -> bool {
    let core = word.trim_end_matches(CLOSERS);
    let Some(last) = core.chars().last() else {
        return false;
    };

    match last {
        '!' | '?' => true,
        '.' => {
            let stem = core.trim_end_matches('.').trim_start_matches(OPENERS);
            if stem.is_empty() || is_abbreviation(stem) {
                return false;
            }
            if leading && is_enumerator(stem) {
                return false;
            }
            if stem.chars().count() == 1 && stem.chars().all(char::is_uppercase) {
                return false;
            }
            match next.and_then(|n| n.trim_start_matches(OPENERS).chars().next()) {
                Some(c) => !c.is_lowercase(),
                None => true,
            }
        }
        _ => false,
    }
}

fn is_abbreviation(stem: &str) -> bool {
    let lower = stem.to_lowercase();
    if ABBREVIATIONS.contains(&lower.as_str()) {
        return true;
    }
    // Dotted initialisms: U.S, U.S.C, C.F.R
    lower.contains('.')
        && lower
            .split('.')
            .all(|seg| !seg.is_empty() && seg.len() <= 3 && seg.chars().all(char::is_alphabetic))
}

/// `1`, `12`, `a`, `iv`: list markers that open a paragraph.
fn is_enumerator(stem: &str) -> bool {
    stem.chars().all(|c| c.is_ascii_digit())
        || (stem.len() <= 4 && stem.chars().all(|c| "ivxlcdmIVXLCDM".contains(c)))
        || (stem.len() == 1 && stem.chars().all(char::is_alphabetic))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_split() {
        let s = split_sentences("First sentence. Second one! Third? Fourth.");
        assert_eq!(s, vec!["First sentence.", "Second one!", "Third?", "Fourth."]);
    }

    #[test]
    fn test_section_numbers_do_not_split() {
        let s = split_sentences("§ 160.101 Statutory basis. The requirements apply.");
        assert_eq!(s, vec!["§ 160.101 Statutory basis.", "The requirements apply."]);
    }

    #[test]
    fn test_abbreviations_do_not_split() {
        let s = split_sentences(
            "See Art. 6 and 42 U.S.C. 1320d, e.g. for covered entities. Done.",
        );
        assert_eq!(
            s,
            vec!["See Art. 6 and 42 U.S.C. 1320d, e.g. for covered entities.", "Done."]
        );
    }

    #[test]
    fn test_leading_enumerator_kept_with_sentence() {
        let s = split_sentences("1. Member States shall provide. 2. They shall notify.");
        assert_eq!(s, vec!["1. Member States shall provide.", "2. They shall notify."]);
    }

    #[test]
    fn test_year_at_end_splits() {
        let s = split_sentences("It was adopted in 2016. It applies since 2018.");
        assert_eq!(s, vec!["It was adopted in 2016.", "It applies since 2018."]);
    }

    #[test]
    fn test_blank_line_is_boundary() {
        let s = split_sentences("PART 160—GENERAL\n\nThe text follows.");
        assert_eq!(s, vec!["PART 160—GENERAL", "The text follows."]);
    }

    #[test]
    fn test_wrapped_lines_join() {
        let s = split_sentences("A covered entity must\ncomply with this part.");
        assert_eq!(s, vec!["A covered entity must comply with this part."]);
    }

    #[test]
    fn test_quotes_and_parens_close_sentences() {
        let s = split_sentences("He said \"stop.\" Then (it ended.) Next.");
        assert_eq!(s, vec!["He said \"stop.\"", "Then (it ended.)", "Next."]);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("  \n\n  ").is_empty());
    }

    #[test]
    fn test_closure_splitter() {
        let splitter = |text: &str| -> Result<Vec<String>, CollaboratorError> {
            Ok(text.lines().map(str::to_string).collect())
        };
        assert_eq!(splitter.split("a\nb").unwrap(), vec!["a", "b"]);
    }
}

//! Section purpose classification from heading text.

use serde::{Deserialize, Serialize};

/// The purpose of a section within an educational document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// A true chapter boundary ("Chapter 3", "3 Limits").
    Chapter,
    /// Any other section.
    #[default]
    Section,
    /// Introductory material (preface, overview, abstract).
    Introduction,
    /// Closing material (conclusion, summary).
    Conclusion,
    /// Bibliography and reading lists.
    References,
    /// Exercises, problems, review questions.
    Exercises,
    /// Appendices.
    Appendix,
}

const INTRODUCTION_WORDS: &[&str] = &[
    "introduction",
    "preface",
    "foreword",
    "overview",
    "abstract",
];
const CONCLUSION_WORDS: &[&str] = &[
    "conclusion",
    "conclusions",
    "summary",
    "closing remarks",
    "wrap-up",
];
const REFERENCE_WORDS: &[&str] = &[
    "references",
    "bibliography",
    "works cited",
    "further reading",
];
const EXERCISE_WORDS: &[&str] = &[
    "exercises",
    "exercise",
    "problems",
    "questions",
    "review questions",
    "practice",
    "quiz",
];

impl SectionKind {
    /// Classify a section by its heading text.
    pub fn from_title(title: &str) -> Self {
        let lower = title.trim().to_lowercase();
        if lower.is_empty() {
            return Self::Section;
        }

        let first_word = lower.split_whitespace().next().unwrap_or_default();
        if first_word == "chapter" || first_word == "part" {
            return Self::Chapter;
        }
        if first_word == "appendix" {
            return Self::Appendix;
        }

        // Strip a numbering prefix so "5. Summary" still reads as a summary.
        let body = strip_numbering(&lower);
        let body = body.trim_end_matches(':').trim();

        if matches_any(body, EXERCISE_WORDS) {
            Self::Exercises
        } else if matches_any(body, REFERENCE_WORDS) {
            Self::References
        } else if matches_any(body, INTRODUCTION_WORDS) {
            Self::Introduction
        } else if matches_any(body, CONCLUSION_WORDS) {
            Self::Conclusion
        } else if is_top_level_numbered(&lower) {
            Self::Chapter
        } else {
            Self::Section
        }
    }

    /// Whether this kind starts a new top-level grouping in an outline.
    pub fn is_chapter_boundary(self) -> bool {
        self == Self::Chapter
    }

    /// Short lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::Section => "section",
            Self::Introduction => "introduction",
            Self::Conclusion => "conclusion",
            Self::References => "references",
            Self::Exercises => "exercises",
            Self::Appendix => "appendix",
        }
    }
}

/// Match a keyword either as the whole text or as its leading phrase.
fn matches_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| {
        text == *w
            || text
                .strip_prefix(w)
                .is_some_and(|rest| rest.starts_with([' ', ':', '-', '.']))
    })
}

/// Remove a leading "1.", "1.2", "IV." style prefix.
fn strip_numbering(text: &str) -> &str {
    let Some((prefix, rest)) = text.split_once(char::is_whitespace) else {
        return text;
    };
    let prefix = prefix.trim_end_matches(['.', ')', ':']);
    let numeric = !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit() || c == '.');
    let roman = !prefix.is_empty() && prefix.chars().all(|c| "ivxlc".contains(c));
    if numeric || roman { rest.trim_start() } else { text }
}

/// Whether the text after a numbering prefix reads like a title rather than
/// a list item: no sentence punctuation at the end and every word of four or
/// more letters capitalized.
pub(crate) fn is_title_phrase(text: &str) -> bool {
    let Some((_, phrase)) = text.trim().split_once(char::is_whitespace) else {
        return false;
    };
    let phrase = phrase.trim();
    if phrase.is_empty() || phrase.ends_with(['.', '!', '?', ';', ',']) {
        return false;
    }
    phrase
        .split_whitespace()
        .filter(|word| word.chars().filter(|c| c.is_alphabetic()).count() >= 4)
        .all(|word| word.chars().next().is_some_and(|c| !c.is_lowercase()))
}

/// "3 Limits" or "3. Limits" but not "3.1 Limits".
fn is_top_level_numbered(text: &str) -> bool {
    let Some((prefix, rest)) = text.split_once(char::is_whitespace) else {
        return false;
    };
    let digits = prefix.trim_end_matches(['.', ':', ')']);
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && !rest.trim().is_empty()
}

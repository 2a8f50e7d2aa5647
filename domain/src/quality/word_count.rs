//! Word-count targets and compliance scoring.
//!
//! The analyzer only recognises numbers written directly in front of
//! "word"/"words" (separated by nothing but spaces or a hyphen), or
//! directly after "word count"/"word limit". Numbers anywhere else in the
//! prompt are never guessed to be a length target.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Default relative tolerance around a word target
pub const DEFAULT_TOLERANCE: f64 = 0.10;

const NUMBER: &str = r"(\d{1,3}(?:,\d{3})+|\d+)";

/// `N words`, `N-word`, `N-M words`, `N to M words`, `between N and M words`.
/// A bare `and` only joins a range after `between`.
static TRAILING_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:\bbetween\s+{NUMBER}\s*(?:-|–|—|to|and)\s*|{NUMBER}\s*(?:-|–|—|to)\s*)?{NUMBER}([\s-]*)words?\b"
    ))
    .expect("valid word target regex")
});

/// `word count of N`, `word limit: N-M`
static LEADING_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\bword\s*(?:count|limit)(\s*(?:of|:|=|is)?\s*){NUMBER}(?:\s*(?:-|–|—|to)\s*{NUMBER})?"
    ))
    .expect("valid word target regex")
});

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").expect("valid markdown regex"));
static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:[-*+]|\d+[.)])[ \t]+").expect("valid markdown regex")
});
static BLOCKQUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:>[ \t]?)+").expect("valid markdown regex"));
static RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*_][ \t]*){3,}$").expect("valid markdown regex"));

// Inline formatting, applied in order by `strip_markdown`
static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[\s\S]*?```").expect("valid markdown regex"));
static INLINE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\*\*(.+?)\*\*",
        r"__(.+?)__",
        r"\*(.+?)\*",
        r"_(.+?)_",
        r"~~(.+?)~~",
        r"`(.+?)`",
        r"\[(.+?)\]\(.+?\)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid markdown regex"))
    .collect()
});
static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid markdown regex"));

/// Requested length of an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WordTarget {
    Exact { words: usize },
    Range { min: usize, max: usize },
}

impl WordTarget {
    pub fn exact(words: usize) -> Self {
        WordTarget::Exact { words }
    }

    /// Build a range, swapping reversed bounds and collapsing `min == max`
    pub fn range(a: usize, b: usize) -> Self {
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        if min == max {
            WordTarget::Exact { words: min }
        } else {
            WordTarget::Range { min, max }
        }
    }

    /// Signed distance from `actual` to the nearest acceptable count
    /// without tolerance: negative means too short.
    pub fn delta(&self, actual: usize) -> i64 {
        let actual = actual as i64;
        match *self {
            WordTarget::Exact { words } => actual - words as i64,
            WordTarget::Range { min, max } => {
                if actual < min as i64 {
                    actual - min as i64
                } else if actual > max as i64 {
                    actual - max as i64
                } else {
                    0
                }
            }
        }
    }
}

impl std::fmt::Display for WordTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WordTarget::Exact { words } => write!(f, "{} words", words),
            WordTarget::Range { min, max } => write!(f, "{}-{} words", min, max),
        }
    }
}

/// Basic statistics of a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextStats {
    pub words: usize,
    pub sentences: usize,
    /// Non-whitespace characters
    pub characters: usize,
}

/// Stateless word-count analysis
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCountAnalyzer;

struct Candidate {
    target: WordTarget,
    start: usize,
    gap: usize,
}

fn parse_number(raw: &str) -> Option<usize> {
    raw.replace(',', "").parse().ok()
}

fn candidate(first: Option<usize>, second: Option<usize>) -> Option<WordTarget> {
    match (first, second) {
        (Some(a), Some(b)) if a > 0 && b > 0 => Some(WordTarget::range(a, b)),
        (Some(n), None) | (None, Some(n)) if n > 0 => Some(WordTarget::exact(n)),
        _ => None,
    }
}

fn is_marker_token(token: &str) -> bool {
    token.chars().all(|c| "#*_~`>|-+=".contains(c))
}

impl WordCountAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Find the word-count target requested in `prompt`.
    ///
    /// When several mentions exist, the one with the smallest gap to
    /// "word(s)" wins; ties go to the earliest mention.
    pub fn detect_target(&self, prompt: &str) -> Option<WordTarget> {
        let mut candidates = Vec::new();

        for caps in TRAILING_WORD_RE.captures_iter(prompt) {
            let first = caps
                .get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| parse_number(m.as_str()));
            let second = caps.get(3).and_then(|m| parse_number(m.as_str()));
            let gap = caps.get(4).map_or(0, |m| m.as_str().len());
            let start = caps.get(0).map_or(0, |m| m.start());
            if let Some(target) = candidate(first, second) {
                candidates.push(Candidate { target, start, gap });
            }
        }

        for caps in LEADING_WORD_RE.captures_iter(prompt) {
            let gap = caps.get(1).map_or(0, |m| m.as_str().trim().len() + 1);
            let first = caps.get(2).and_then(|m| parse_number(m.as_str()));
            let second = caps.get(3).and_then(|m| parse_number(m.as_str()));
            let start = caps.get(0).map_or(0, |m| m.start());
            if let Some(target) = candidate(first, second) {
                candidates.push(Candidate { target, start, gap });
            }
        }

        candidates
            .into_iter()
            .min_by_key(|c| (c.gap, c.start))
            .map(|c| c.target)
    }

    /// Count words, ignoring markdown structure
    pub fn count_words(&self, text: &str) -> usize {
        let stripped = HEADER_RE.replace_all(text, "");
        let stripped = RULE_RE.replace_all(&stripped, "");
        let stripped = BLOCKQUOTE_RE.replace_all(&stripped, "");
        let stripped = LIST_MARKER_RE.replace_all(&stripped, "");
        stripped
            .split_whitespace()
            .filter(|token| !is_marker_token(token))
            .count()
    }

    /// Whether `actual` is acceptably close to `target`
    pub fn within_tolerance(&self, actual: usize, target: WordTarget, tolerance: f64) -> bool {
        let actual = actual as f64;
        match target {
            WordTarget::Exact { words } => {
                let words = words as f64;
                (actual - words).abs() <= words * tolerance
            }
            WordTarget::Range { min, max } => {
                min as f64 * (1.0 - tolerance) <= actual && actual <= max as f64 * (1.0 + tolerance)
            }
        }
    }

    pub fn text_stats(&self, text: &str) -> TextStats {
        if text.trim().is_empty() {
            return TextStats::default();
        }
        // A sentence is a non-blank run of text closed by a terminator
        let parts: Vec<&str> = text.split(['.', '!', '?']).collect();
        let closed = &parts[..parts.len().saturating_sub(1)];
        let sentences = closed.iter().filter(|p| !p.trim().is_empty()).count();
        TextStats {
            words: self.count_words(text),
            sentences,
            characters: text.chars().filter(|c| !c.is_whitespace()).count(),
        }
    }

    /// Render markdown as plain text
    pub fn strip_markdown(&self, text: &str) -> String {
        let mut out = CODE_FENCE_RE.replace_all(text, "").into_owned();
        out = HEADER_RE.replace_all(&out, "").into_owned();
        for re in INLINE_RES.iter() {
            out = re.replace_all(&out, "$1").into_owned();
        }
        out = RULE_RE.replace_all(&out, "").into_owned();
        out = BLANK_RUN_RE.replace_all(&out, "\n\n").into_owned();
        out.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> WordCountAnalyzer {
        WordCountAnalyzer::new()
    }

    #[test]
    fn test_detect_range_with_hyphen() {
        assert_eq!(
            analyzer().detect_target("Write a 200-300 word summary"),
            Some(WordTarget::range(200, 300))
        );
    }

    #[test]
    fn test_detect_range_variants() {
        let a = analyzer();
        assert_eq!(
            a.detect_target("Answer in 200 to 300 words."),
            Some(WordTarget::range(200, 300))
        );
        assert_eq!(
            a.detect_target("Keep it 200–300 words"),
            Some(WordTarget::range(200, 300))
        );
        assert_eq!(
            a.detect_target("between 150 and 250 words please"),
            Some(WordTarget::range(150, 250))
        );
    }

    #[test]
    fn test_bare_and_does_not_join_a_range() {
        let a = analyzer();
        assert_eq!(
            a.detect_target("Summarize chapters 3 and 400 words max"),
            Some(WordTarget::exact(400))
        );
        assert_eq!(
            a.detect_target("Give me 2 and 300 words"),
            Some(WordTarget::exact(300))
        );
        assert_eq!(
            a.detect_target("Between 100 to 200 words"),
            Some(WordTarget::range(100, 200))
        );
    }

    #[test]
    fn test_detect_exact() {
        let a = analyzer();
        assert_eq!(a.detect_target("Write 500 words on tides"), Some(WordTarget::exact(500)));
        assert_eq!(a.detect_target("a 500-word essay"), Some(WordTarget::exact(500)));
        assert_eq!(a.detect_target("about 1,000 words"), Some(WordTarget::exact(1000)));
        assert_eq!(
            a.detect_target("Essay with a word count of 750"),
            Some(WordTarget::exact(750))
        );
    }

    #[test]
    fn test_detect_none() {
        let a = analyzer();
        assert_eq!(a.detect_target("Write a summary"), None);
        assert_eq!(a.detect_target("List 5 reasons in 3 paragraphs"), None);
        assert_eq!(a.detect_target("Explain 5 keywords"), None);
    }

    #[test]
    fn test_detect_prefers_closest_mention() {
        // The double space makes the first mention less adjacent
        let a = analyzer();
        assert_eq!(
            a.detect_target("Write 10 paragraphs, 400  words total, or a 300 words draft"),
            Some(WordTarget::exact(300))
        );
        assert_eq!(
            a.detect_target("Either 100 words or 200 words"),
            Some(WordTarget::exact(100))
        );
    }

    #[test]
    fn test_detect_normalizes_ranges() {
        let a = analyzer();
        assert_eq!(a.detect_target("300-200 words"), Some(WordTarget::range(200, 300)));
        assert_eq!(a.detect_target("250-250 words"), Some(WordTarget::exact(250)));
        assert_eq!(a.detect_target("0 words"), None);
    }

    #[test]
    fn test_within_tolerance_exact() {
        let a = analyzer();
        assert!(a.within_tolerance(540, WordTarget::exact(500), 0.10));
        assert!(!a.within_tolerance(560, WordTarget::exact(500), 0.10));
        assert!(a.within_tolerance(450, WordTarget::exact(500), 0.10));
    }

    #[test]
    fn test_within_tolerance_range() {
        let a = analyzer();
        let target = WordTarget::range(200, 300);
        assert!(a.within_tolerance(180, target, 0.10));
        assert!(a.within_tolerance(330, target, 0.10));
        assert!(!a.within_tolerance(179, target, 0.10));
        assert!(!a.within_tolerance(331, target, 0.10));
    }

    #[test]
    fn test_count_words_ignores_markdown_structure() {
        let text = "# Title\n\n- first item\n- second item\n\n> quoted line\n\n---\n\n**bold** text *here*";
        // Title, first, item, second, item, quoted, line, **bold**, text, *here*
        assert_eq!(analyzer().count_words(text), 10);
    }

    #[test]
    fn test_count_words_numbered_list() {
        assert_eq!(analyzer().count_words("1. one\n2. two three"), 3);
        assert_eq!(analyzer().count_words("   \n"), 0);
    }

    #[test]
    fn test_delta() {
        assert_eq!(WordTarget::exact(500).delta(450), -50);
        assert_eq!(WordTarget::range(200, 300).delta(250), 0);
        assert_eq!(WordTarget::range(200, 300).delta(320), 20);
    }

    #[test]
    fn test_text_stats() {
        let stats = analyzer().text_stats("One two. Three four five! Six?");
        assert_eq!(stats.words, 6);
        assert_eq!(stats.sentences, 3);
        assert_eq!(stats.characters, 25);
        assert_eq!(analyzer().text_stats(""), TextStats::default());
    }

    #[test]
    fn test_strip_markdown() {
        let text = "## Heading\n\nSome **bold** and _italic_ with `code` and [a link](http://x).";
        assert_eq!(
            analyzer().strip_markdown(text),
            "Heading\n\nSome bold and italic with code and a link."
        );
    }
}

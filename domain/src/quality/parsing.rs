//! Response parsing for the quality agents.
//!
//! These functions turn free-form model replies into rubric criteria and
//! per-criterion verdicts. Pure text processing, no I/O.
//!
//! # Functions
//!
//! | Function | Agent | Expected reply |
//! |----------|-------|----------------|
//! | [`parse_criteria_list`] | Criteria | Bulleted or numbered list |
//! | [`parse_verdicts`] | Grader | `N. PASS - note` / `N. FAIL - note` per line, or JSON |

use super::grade::{CriterionFeedback, Verdict};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Upper bound on qualitative criteria kept from one reply
pub const MAX_CRITERIA: usize = 10;

/// Note recorded for criteria the grader did not answer
pub const MISSING_VERDICT_NOTE: &str = "no verdict returned";

static LIST_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•+]|\d+[.)])\s+(.+)$").expect("valid list item regex")
});

static WORD_COUNT_CRITERION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bword[\s-]*(?:count|limit|length)\b|\d[\d,]*\s*(?:-|–|to)?\s*\d*[\s-]*words?\b")
        .expect("valid word criterion regex")
});

static VERDICT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:criterion\s*)?(\d+)\s*[.):]?\s*\**\s*(pass(?:ed)?|fail(?:ed)?|yes|no)\b\**\s*[-:–—]?\s*(.*)$",
    )
    .expect("valid verdict regex")
});

/// Extract qualitative criteria from a criteria-agent reply.
///
/// List items are preferred; a reply without any list falls back to its
/// non-empty lines. Criteria about length are dropped because the word
/// target is computed locally and always takes precedence.
pub fn parse_criteria_list(response: &str) -> Vec<String> {
    let items: Vec<String> = response
        .lines()
        .filter_map(|line| LIST_ITEM_RE.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| clean_item(m.as_str())))
        .collect();

    let items = if items.is_empty() {
        response
            .lines()
            .map(clean_item)
            .filter(|line| !line.ends_with(':'))
            .collect()
    } else {
        items
    };

    items
        .into_iter()
        .filter(|item| !item.is_empty())
        .filter(|item| !is_word_count_criterion(item))
        .take(MAX_CRITERIA)
        .collect()
}

/// Whether a proposed criterion is really a length requirement
pub fn is_word_count_criterion(criterion: &str) -> bool {
    WORD_COUNT_CRITERION_RE.is_match(criterion)
}

fn clean_item(raw: &str) -> String {
    raw.trim().trim_matches('*').trim().to_string()
}

fn verdict_from(word: &str) -> Verdict {
    match word.to_lowercase().as_str() {
        "pass" | "passed" | "yes" => Verdict::Pass,
        _ => Verdict::Fail,
    }
}

/// Match a grader reply against the rubric's criteria.
///
/// Verdicts are keyed by 1-based criterion number. Unknown numbers are
/// ignored, the first verdict for a number wins, and every criterion the
/// reply leaves out is recorded as a failure with [`MISSING_VERDICT_NOTE`].
///
/// # Examples
///
/// ```
/// use draftsmith_domain::quality::parsing::parse_verdicts;
/// use draftsmith_domain::quality::grade::Verdict;
///
/// let criteria = vec!["Clear".to_string(), "Cites sources".to_string()];
/// let feedback = parse_verdicts("1. PASS - reads well", &criteria);
/// assert_eq!(feedback[0].verdict, Verdict::Pass);
/// assert_eq!(feedback[1].verdict, Verdict::Fail);
/// ```
pub fn parse_verdicts(response: &str, criteria: &[String]) -> Vec<CriterionFeedback> {
    let mut found = parse_verdicts_json(response).unwrap_or_default();

    if found.is_empty() {
        for caps in response.lines().filter_map(|l| VERDICT_LINE_RE.captures(l)) {
            let Some(index) = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) else {
                continue;
            };
            let verdict = caps.get(2).map_or(Verdict::Fail, |m| verdict_from(m.as_str()));
            let note = caps.get(3).map_or("", |m| m.as_str()).trim().to_string();
            found.entry(index).or_insert((verdict, note));
        }
    }

    criteria
        .iter()
        .enumerate()
        .map(|(i, criterion)| match found.remove(&(i + 1)) {
            Some((verdict, note)) => CriterionFeedback::new(criterion.clone(), verdict, note),
            None => CriterionFeedback::new(criterion.clone(), Verdict::Fail, MISSING_VERDICT_NOTE),
        })
        .collect()
}

/// `[{"criterion": 1, "verdict": "pass", "note": "..."}]`, possibly fenced
fn parse_verdicts_json(response: &str) -> Option<HashMap<usize, (Verdict, String)>> {
    let start = response.find('[')?;
    let end = response[start..].rfind(']')?;
    let parsed: serde_json::Value = serde_json::from_str(&response[start..start + end + 1]).ok()?;

    let mut found = HashMap::new();
    for entry in parsed.as_array()? {
        let Some(index) = entry.get("criterion").and_then(|v| v.as_u64()) else {
            continue;
        };
        let verdict = entry
            .get("verdict")
            .and_then(|v| v.as_str())
            .map_or(Verdict::Fail, verdict_from);
        let note = entry
            .get("note")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        found.entry(index as usize).or_insert((verdict, note));
    }
    Some(found)
}

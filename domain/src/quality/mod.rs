//! Structural quality gates: rubrics, grading and word counts.

pub mod grade;
pub mod parsing;
pub mod rubric;
pub mod word_count;

pub use grade::{CriterionFeedback, GradeResult, Verdict};
pub use parsing::{is_word_count_criterion, parse_criteria_list, parse_verdicts};
pub use rubric::Rubric;
pub use word_count::{DEFAULT_TOLERANCE, TextStats, WordCountAnalyzer, WordTarget};

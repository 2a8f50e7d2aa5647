//! Console output formatter for finished turns

use colored::Colorize;
use draftsmith_application::TurnOutcome;
use draftsmith_domain::{
    GradeResult, Message, MessageMetadata, MessageStatus, OutputFormat, TextStats,
    WordCountAnalyzer,
};
use serde::Serialize;

/// Formats turn outcomes for console display
pub struct ConsoleFormatter;

/// JSON shape of a committed turn
#[derive(Serialize)]
struct JsonTurn<'a> {
    message_id: String,
    parent_id: Option<String>,
    status: Option<MessageStatus>,
    content: &'a str,
    stats: TextStats,
    #[serde(flatten)]
    metadata: Option<&'a MessageMetadata>,
}

impl ConsoleFormatter {
    /// Render `outcome` in the requested format
    pub fn format(outcome: &TurnOutcome, format: OutputFormat) -> String {
        match format {
            OutputFormat::Answer => Self::format_answer(&outcome.assistant_message),
            OutputFormat::Full => Self::format_full(outcome),
            OutputFormat::Json => Self::format_json(&outcome.assistant_message),
        }
    }

    /// Answer text, followed by the quality notice when the run fell short
    pub fn format_answer(message: &Message) -> String {
        let mut output = message.content().to_string();
        if let Some(notice) = Self::quality_notice(message) {
            output.push_str("\n\n");
            output.push_str(&notice);
        }
        output.push('\n');
        output
    }

    /// Answer with status, rubric, grade history, warnings and statistics
    pub fn format_full(outcome: &TurnOutcome) -> String {
        let message = &outcome.assistant_message;
        let mut output = String::new();

        output.push_str(&Self::header("draftsmith"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Prompt:".cyan().bold(),
            outcome.user_message.content()
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Status:".cyan().bold(),
            Self::status_label(message.status())
        ));

        if let Some(metadata) = message.metadata() {
            if let Some(rubric) = &metadata.rubric {
                output.push_str(&Self::section_header("Rubric"));
                for (i, criterion) in rubric.criteria.iter().enumerate() {
                    output.push_str(&format!("  {}. {}\n", i + 1, criterion));
                }
                if let Some(requirement) = rubric.word_requirement() {
                    output.push_str(&format!("  Length: {}\n", requirement));
                }
            }

            if !metadata.grades.is_empty() {
                output.push_str(&Self::section_header("Grades"));
                for (i, grade) in metadata.grades.iter().enumerate() {
                    output.push_str(&Self::grade_block(i + 1, grade));
                }
            }

            if !metadata.warnings.is_empty() {
                output.push_str(&format!("\n{}\n", "Warnings:".yellow().bold()));
                for warning in &metadata.warnings {
                    output.push_str(&format!("  * {}\n", warning));
                }
            }

            if let Some(notice) = &metadata.notice {
                output.push_str(&format!("\n{} {}\n", "Notice:".yellow().bold(), notice));
            }
        }

        let stats = WordCountAnalyzer::new().text_stats(message.content());
        output.push_str(&format!(
            "\n{} {} words, {} sentences, {} characters\n",
            "Stats:".dimmed(),
            stats.words,
            stats.sentences,
            stats.characters
        ));

        output.push_str(&Self::section_header("Answer"));
        output.push('\n');
        output.push_str(&Self::format_answer(message));
        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(message: &Message) -> String {
        let turn = JsonTurn {
            message_id: message.id().to_string(),
            parent_id: message.parent_id().map(|id| id.to_string()),
            status: message.status(),
            content: message.content(),
            stats: WordCountAnalyzer::new().text_stats(message.content()),
            metadata: message.metadata(),
        };
        serde_json::to_string_pretty(&turn).unwrap_or_else(|_| "{}".to_string())
    }

    /// Notice listing what the last grade still failed.
    ///
    /// Shown only for answers that did not pass every check; the stored
    /// message content is never changed.
    pub fn quality_notice(message: &Message) -> Option<String> {
        let status = message.status()?;
        if status.is_complete() {
            return None;
        }
        let metadata = message.metadata()?;

        let mut lines = vec![format!(
            "{} {}",
            "Quality Check Notice:".yellow().bold(),
            metadata
                .notice
                .as_deref()
                .unwrap_or("The response may not meet every criterion.")
        )];

        if let Some(grade) = metadata.last_grade() {
            for failed in grade.failed_criteria() {
                lines.push(format!("  - {}", failed.criterion));
            }
            if !grade.word_count_ok()
                && let Some(target) = metadata.rubric.as_ref().and_then(|r| r.word_target)
            {
                lines.push(format!(
                    "  - Length: {} words (target {})",
                    grade.word_count_actual(),
                    target
                ));
            }
        }

        Some(format!("---\n{}", lines.join("\n")))
    }

    fn status_label(status: Option<MessageStatus>) -> String {
        match status {
            Some(MessageStatus::Complete) => "complete".green().to_string(),
            Some(other) => other.as_str().yellow().to_string(),
            None => "-".dimmed().to_string(),
        }
    }

    fn grade_block(iteration: usize, grade: &GradeResult) -> String {
        let mark = if grade.passed() {
            "PASS".green()
        } else {
            "FAIL".red()
        };
        let mut block = format!(
            "\n  {} {}\n",
            mark,
            crate::progress::reporter::grade_line(iteration, grade)
        );
        for feedback in grade.criteria_feedback() {
            let verdict = if feedback.verdict.is_pass() {
                "v".green()
            } else {
                "x".red()
            };
            if feedback.note.is_empty() {
                block.push_str(&format!("    {} {}\n", verdict, feedback.criterion));
            } else {
                block.push_str(&format!(
                    "    {} {}: {}\n",
                    verdict,
                    feedback.criterion,
                    feedback.note.dimmed()
                ));
            }
        }
        block
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftsmith_domain::{ConversationThread, CriterionFeedback, Role, Rubric, Verdict, WordTarget};

    fn answered(status: MessageStatus, grade: GradeResult) -> Message {
        let mut thread = ConversationThread::new();
        let user = thread
            .append(None, Role::User, "Write 100 words", vec![])
            .unwrap();
        let metadata = MessageMetadata {
            rubric: Some(
                Rubric::new(vec!["Clear".to_string(), "Cites sources".to_string()])
                    .with_word_target(Some(WordTarget::exact(100))),
            ),
            grades: vec![grade],
            iterations: 1,
            warnings: vec![],
            notice: Some("Maximum refinement iterations (1) reached without passing every check.".to_string()),
        };
        thread
            .append_assistant(Some(user.id()), "The answer.", status, metadata)
            .unwrap()
    }

    fn failing_grade() -> GradeResult {
        GradeResult::new(
            vec![
                CriterionFeedback::new("Clear", Verdict::Pass, ""),
                CriterionFeedback::new("Cites sources", Verdict::Fail, "none"),
            ],
            60,
            false,
        )
    }

    #[test]
    fn test_notice_lists_failed_criteria_and_length() {
        colored::control::set_override(false);
        let message = answered(MessageStatus::MaxIterationsExhausted, failing_grade());
        let notice = ConsoleFormatter::quality_notice(&message).unwrap();
        assert!(notice.contains("Quality Check Notice"));
        assert!(notice.contains("  - Cites sources"));
        assert!(!notice.contains("  - Clear"));
        assert!(notice.contains("Length: 60 words (target 100 words)"));

        // stored content is untouched
        assert_eq!(message.content(), "The answer.");
    }

    #[test]
    fn test_no_notice_when_complete() {
        let message = answered(MessageStatus::Complete, failing_grade());
        assert!(ConsoleFormatter::quality_notice(&message).is_none());
        assert_eq!(ConsoleFormatter::format_answer(&message), "The answer.\n");
    }

    #[test]
    fn test_json_includes_metadata_and_stats() {
        let message = answered(MessageStatus::MaxIterationsExhausted, failing_grade());
        let json: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_json(&message)).unwrap();
        assert_eq!(json["status"], "max_iterations_exhausted");
        assert_eq!(json["content"], "The answer.");
        assert_eq!(json["stats"]["words"], 2);
        assert_eq!(json["iterations"], 1);
        assert_eq!(json["grades"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "> "), "> a\n> b");
    }
}

//! Progress reporting for refinement runs

use colored::Colorize;
use draftsmith_application::ports::progress::{ProgressEvent, ProgressNotifier};
use draftsmith_domain::{GradeResult, MessageStatus, RefinementPhase, RunOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress with a spinner and one line per finished step
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn set_phase(&self, phase: RefinementPhase) {
        let Ok(mut slot) = self.spinner.lock() else {
            return;
        };
        if phase.is_terminal() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
            return;
        }
        let pb = slot.get_or_insert_with(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        pb.set_prefix(phase.display_name());
        pb.set_message("...");
    }

    /// Print a line above the spinner, or directly when none is active
    fn line(&self, text: String) {
        match self.spinner.lock().ok().and_then(|slot| slot.as_ref().cloned()) {
            Some(pb) => pb.println(text),
            None => eprintln!("{}", text),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::PhaseEntered { phase } => self.set_phase(*phase),
            ProgressEvent::RunComplete {
                outcome,
                status,
                iterations,
            } => {
                self.set_phase(RefinementPhase::Failed);
                eprintln!("{}", run_summary(*outcome, *status, *iterations));
            }
            other => {
                if let Some(text) = describe(other) {
                    self.line(text);
                }
            }
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::PhaseEntered { phase } if !phase.is_terminal() => {
                eprintln!("{} {}", "->".cyan(), phase.display_name().bold());
            }
            ProgressEvent::PhaseEntered { .. } => {}
            ProgressEvent::RunComplete {
                outcome,
                status,
                iterations,
            } => eprintln!("{}", run_summary(*outcome, *status, *iterations)),
            other => {
                if let Some(text) = describe(other) {
                    eprintln!("{}", text);
                }
            }
        }
    }
}

fn describe(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::CriteriaReady { rubric } => {
            let target = rubric
                .word_requirement()
                .map(|req| format!(", length {}", req))
                .unwrap_or_default();
            Some(format!(
                "  {} {} criteria{}",
                "v".green(),
                rubric.criteria.len(),
                target
            ))
        }
        ProgressEvent::DraftReady { words } => {
            Some(format!("  {} first draft, {} words", "v".green(), words))
        }
        ProgressEvent::GradeResult { iteration, grade } => {
            Some(format!("  {} {}", grade_mark(grade), grade_line(*iteration, grade)))
        }
        ProgressEvent::RefineApplied { iteration, words } => Some(format!(
            "  {} revision {} written, {} words",
            "~".yellow(),
            iteration,
            words
        )),
        ProgressEvent::PhaseEntered { .. } | ProgressEvent::RunComplete { .. } => None,
    }
}

fn grade_mark(grade: &GradeResult) -> colored::ColoredString {
    if grade.passed() {
        "v".green()
    } else {
        "x".red()
    }
}

/// "grade 2: 3/4 criteria, 212 words (ok)"
pub(crate) fn grade_line(iteration: usize, grade: &GradeResult) -> String {
    let length = if grade.word_count_ok() { "ok" } else { "off target" };
    format!(
        "grade {}: {}/{} criteria, {} words ({})",
        iteration,
        grade.passed_count(),
        grade.criteria_feedback().len(),
        grade.word_count_actual(),
        length
    )
}

fn run_summary(outcome: RunOutcome, status: Option<MessageStatus>, iterations: usize) -> String {
    let text = match status {
        Some(status) => format!(
            "{} ({}) after {} grading round(s)",
            outcome, status, iterations
        ),
        None => format!("{} after {} grading round(s)", outcome, iterations),
    };
    match (outcome, status) {
        (RunOutcome::Passed, _) => text.green().to_string(),
        (RunOutcome::Failed, _) => text.red().to_string(),
        _ => text.yellow().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftsmith_domain::{CriterionFeedback, Rubric, Verdict, WordTarget};

    #[test]
    fn test_grade_line() {
        colored::control::set_override(false);
        let grade = GradeResult::new(
            vec![
                CriterionFeedback::new("Clear", Verdict::Pass, ""),
                CriterionFeedback::new("Cites", Verdict::Fail, "none"),
            ],
            212,
            true,
        );
        assert_eq!(
            grade_line(2, &grade),
            "grade 2: 1/2 criteria, 212 words (ok)"
        );
    }

    #[test]
    fn test_describe_criteria_with_target() {
        colored::control::set_override(false);
        let rubric = Rubric::new(vec!["A".to_string(), "B".to_string()])
            .with_word_target(Some(WordTarget::range(200, 300)));
        let text = describe(&ProgressEvent::CriteriaReady { rubric }).unwrap();
        assert!(text.contains("2 criteria, length 200-300 words"));
    }

    #[test]
    fn test_phase_events_have_no_line() {
        assert!(
            describe(&ProgressEvent::PhaseEntered {
                phase: RefinementPhase::Grade
            })
            .is_none()
        );
    }
}

//! Prompt templates for the refinement agents

use crate::conversation::entities::Attachment;
use crate::quality::grade::GradeResult;
use crate::quality::rubric::Rubric;

/// Templates for generating prompts at each step of the refinement loop
pub struct PromptTemplate;

impl PromptTemplate {
    /// Render uploaded files as a delimited context block for the request body
    pub fn attachment_block(attachments: &[Attachment]) -> String {
        if attachments.is_empty() {
            return String::new();
        }

        let mut block = String::from("\n=== ATTACHED FILES ===\n");
        for attachment in attachments {
            block.push_str(&format!(
                "\n--- {} ---\n{}\n",
                attachment.name, attachment.text
            ));
        }
        block.push_str("=== END OF ATTACHED FILES ===\n");
        block
    }

    /// System prompt for the generation agent
    pub fn generation_system() -> &'static str {
        r#"You are a knowledgeable assistant.
Answer the user's request directly, accurately and completely.
Follow every explicit instruction about format and length.
Use the attached files and earlier conversation turns as context when they are relevant."#
    }

    /// Prompt asking for qualitative criteria
    pub fn criteria_prompt(user_prompt: &str) -> String {
        format!(
            r#"Create quality criteria for answering the prompt below.

Reply with a numbered list of 3 to 7 short, checkable criteria, one per line.
Cover accuracy, completeness, structure and any explicit instructions in the prompt.
Do NOT include criteria about word count or length; length is checked separately.
Use any attached files to decide what a complete answer must contain.

USER PROMPT:
{prompt}
"#,
            prompt = user_prompt.trim()
        )
    }

    /// Prompt asking the grader for one verdict per criterion
    pub fn grader_prompt(draft: &str, rubric: &Rubric, word_count: usize) -> String {
        let length = match rubric.word_requirement() {
            Some(requirement) => format!(
                "\nThe response has {} words; the required length is {}. Length is checked separately, do not grade it.\n",
                word_count, requirement
            ),
            None => String::new(),
        };

        format!(
            r#"Grade the response below against each numbered criterion.

Reply with exactly one line per criterion, in this format:
<number>. PASS - <short note>
<number>. FAIL - <what is missing or wrong>

CRITERIA:
{criteria}
{length}
RESPONSE:
{draft}
"#,
            criteria = rubric.numbered_criteria(),
            length = length,
            draft = draft
        )
    }

    /// Prompt asking for a revised draft that fixes the failed checks
    pub fn refiner_prompt(
        user_prompt: &str,
        draft: &str,
        grade: &GradeResult,
        rubric: &Rubric,
    ) -> String {
        let mut problems: Vec<String> = grade
            .failed_criteria()
            .map(|f| {
                if f.note.is_empty() {
                    format!("- {}", f.criterion)
                } else {
                    format!("- {}: {}", f.criterion, f.note)
                }
            })
            .collect();

        if !grade.word_count_ok()
            && let Some(target) = rubric.word_target
        {
            let delta = target.delta(grade.word_count_actual());
            let direction = if delta < 0 { "short" } else { "long" };
            problems.push(format!(
                "- Length: the response has {} words, {} words too {}; the target is {}. Expand or condense to hit it.",
                grade.word_count_actual(),
                delta.unsigned_abs(),
                direction,
                target
            ));
        }

        format!(
            r#"Improve the response below so that it meets ALL criteria.

PROBLEMS TO FIX:
{problems}

ALL CRITERIA:
{criteria}

ORIGINAL PROMPT:
{prompt}

RESPONSE TO IMPROVE:
{draft}

Provide only the improved response."#,
            problems = problems.join("\n"),
            criteria = rubric.numbered_criteria(),
            prompt = user_prompt.trim(),
            draft = draft
        )
    }
}

//! Prompt text and the section labels shared by the prompt builder and the response parser.

pub const LABEL_SCORE: &str = "SCORE:";
pub const LABEL_SUMMARY: &str = "SUMMARY:";
pub const LABEL_STRENGTHS: &str = "STRENGTHS:";
pub const LABEL_IMPROVEMENTS: &str = "IMPROVEMENTS:";
pub const LABEL_CODE_BEFORE: &str = "CODE EXAMPLE BEFORE:";
pub const LABEL_CODE_AFTER: &str = "CODE EXAMPLE AFTER:";
pub const LABEL_FINAL_THOUGHTS: &str = "FINAL THOUGHTS:";

pub const SUB_LABEL_SCORE: &str = "score:";
pub const SUB_LABEL_ISSUE: &str = "issue:";
pub const SUB_LABEL_ACTION: &str = "action:";

/// Marker line appended to a file cut to fit the prompt budget
pub const TRUNCATION_MARKER: &str = "[truncated]";

/// Output contract given to the model. `{0}` is the repository name.
pub const REVIEW_INSTRUCTIONS: &str = r#"You are a senior software engineer reviewing the repository {0}.
Review the source files below for code quality, structure, correctness, security and maintainability.

Answer using EXACTLY these labeled sections, each label at the start of its own line, in this order:

SCORE: an overall score from 0 to 100, written as N/100
SUMMARY: two or three sentences describing the overall state of the code
STRENGTHS:
- Title: one sentence explaining what is done well
(two to four items)
IMPROVEMENTS:
1. Title - score: N/10 - issue: what is wrong - action: what to change
(two to four items, most important first)
CODE EXAMPLE BEFORE:
a short snippet from the repository that illustrates the most important improvement
CODE EXAMPLE AFTER:
the same snippet rewritten with the improvement applied
FINAL THOUGHTS: one or two encouraging sentences with the next step to take

Do not add other sections. Do not wrap the labels in extra formatting."#;

pub const BEGINNER_GUIDANCE: &str =
    "The developer is a beginner: explain issues in plain language and keep the tone encouraging.";
pub const INTERMEDIATE_GUIDANCE: &str =
    "The developer has intermediate experience: balance explanations with concrete best practices.";
pub const ADVANCED_GUIDANCE: &str =
    "The developer is advanced: be concise and focus on architecture, edge cases and performance trade-offs.";

/// `{0}` is a comma-separated list of focus areas
pub const FOCUS_GUIDANCE: &str = "Pay particular attention to: {0}.";

pub const CONTEXT_HEADING: &str = "## Project context";
pub const FILES_HEADING: &str = "## Source files";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_use_every_label() {
        for label in [
            LABEL_SCORE,
            LABEL_SUMMARY,
            LABEL_STRENGTHS,
            LABEL_IMPROVEMENTS,
            LABEL_CODE_BEFORE,
            LABEL_CODE_AFTER,
            LABEL_FINAL_THOUGHTS,
        ] {
            assert!(
                REVIEW_INSTRUCTIONS.lines().any(|line| line.starts_with(label)),
                "{} missing",
                label
            );
        }
        for sub_label in [SUB_LABEL_SCORE, SUB_LABEL_ISSUE, SUB_LABEL_ACTION] {
            assert!(REVIEW_INSTRUCTIONS.contains(sub_label), "{} missing", sub_label);
        }
    }
}

//! Renders the selected files and caller context into one size-bounded prompt.

use crate::error::{Result, ReviewError};
use crate::models::{AnalysisContext, CandidateFile, ExperienceLevel, PromptDocument};
use crate::prompts::{
    ADVANCED_GUIDANCE, BEGINNER_GUIDANCE, CONTEXT_HEADING, FILES_HEADING, FOCUS_GUIDANCE,
    INTERMEDIATE_GUIDANCE, REVIEW_INSTRUCTIONS, TRUNCATION_MARKER,
};
use crate::utils::truncate_chars;
use tracing::{debug, warn};

fn render_instructions(repository_name: &str, context: &AnalysisContext) -> String {
    let mut text = REVIEW_INSTRUCTIONS.replace("{0}", repository_name);

    if let Some(level) = context.experience_level {
        text.push_str("\n\n");
        text.push_str(match level {
            ExperienceLevel::Beginner => BEGINNER_GUIDANCE,
            ExperienceLevel::Intermediate => INTERMEDIATE_GUIDANCE,
            ExperienceLevel::Advanced => ADVANCED_GUIDANCE,
        });
    }
    if !context.focus_areas.is_empty() {
        text.push_str(if context.experience_level.is_some() { "\n" } else { "\n\n" });
        text.push_str(&FOCUS_GUIDANCE.replace("{0}", &focus_list(context)));
    }
    text
}

fn focus_list(context: &AnalysisContext) -> String {
    context
        .focus_areas
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Key/value lines for the fields that are set; `None` when nothing is set
fn render_context(context: &AnalysisContext) -> Option<String> {
    if context.is_empty() {
        return None;
    }

    let mut lines = vec![CONTEXT_HEADING.to_string()];
    if let Some(description) = &context.description {
        lines.push(format!("Project description: {}", description));
    }
    if !context.goals.is_empty() {
        lines.push("Project goals:".to_string());
        lines.extend(context.goals.iter().map(|goal| format!("- {}", goal)));
    }
    if !context.focus_areas.is_empty() {
        lines.push(format!("Focus areas: {}", focus_list(context)));
    }
    if let Some(level) = context.experience_level {
        lines.push(format!("Developer experience level: {}", level));
    }
    Some(lines.join("\n"))
}

/// A backtick fence longer than any run inside `content`
fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat(longest.max(2) + 1)
}

fn render_file(file: &CandidateFile, fence: &str, body: &str, truncated: bool) -> String {
    let mut block = format!(
        "\n### File: {} ({})\n{}{}\n",
        file.path, file.language, fence, file.language
    );
    block.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        block.push('\n');
    }
    if truncated {
        block.push_str(TRUNCATION_MARKER);
        block.push('\n');
    }
    block.push_str(fence);
    block.push('\n');
    block
}

/// Builds the prompt for `files` (already in priority order) within `max_chars`
///
/// Tail files are dropped until the rest fit; if even the first file alone is too large its
/// content is cut and marked. Files without loaded content are ignored.
pub fn build(
    files: &[CandidateFile],
    context: &AnalysisContext,
    repository_name: &str,
    max_chars: usize,
) -> Result<PromptDocument> {
    let files: Vec<(&CandidateFile, &str)> = files
        .iter()
        .filter_map(|f| f.content.as_deref().map(|content| (f, content)))
        .collect();
    if files.is_empty() {
        return Err(ReviewError::NoAnalyzableFiles);
    }

    let mut text = render_instructions(repository_name, context);
    if let Some(block) = render_context(context) {
        text.push_str("\n\n");
        text.push_str(&block);
    }
    text.push_str("\n\n");
    text.push_str(FILES_HEADING);
    text.push('\n');

    let mut used = text.chars().count();
    let mut included = Vec::new();

    for (file, content) in &files {
        let block = render_file(file, &fence_for(content), content, false);
        let size = block.chars().count();
        if used + size > max_chars {
            break;
        }
        used += size;
        text.push_str(&block);
        included.push(file.path.clone());
    }

    if !included.is_empty() {
        if included.len() < files.len() {
            warn!(
                "Prompt budget of {} chars reached; dropped {} of {} files",
                max_chars,
                files.len() - included.len(),
                files.len()
            );
        }
        debug!("Built prompt of {} chars with {} files", used, included.len());
        return Ok(PromptDocument {
            text,
            files: included,
            truncated: false,
        });
    }

    // Not even the first file fits whole: cut it
    let (file, content) = files[0];
    let fence = fence_for(content);
    let overhead = render_file(file, &fence, "", true).chars().count() + 1;
    let available = match max_chars.checked_sub(used + overhead) {
        Some(n) if n > 0 => n,
        _ => {
            warn!(
                "Prompt budget of {} chars cannot hold any file content",
                max_chars
            );
            return Err(ReviewError::NoAnalyzableFiles);
        }
    };

    let cut = truncate_chars(content, available);
    text.push_str(&render_file(file, &fence, cut, true));
    warn!(
        "{} truncated to {} of {} chars to fit the prompt budget",
        file.path,
        cut.chars().count(),
        content.chars().count()
    );

    Ok(PromptDocument {
        text,
        files: vec![file.path.clone()],
        truncated: true,
    })
}

//! Command-line arguments and terminal rendering of a finished review.

use crate::api::AnalyzeRequest;
use crate::error::Result;
use crate::models::{AnalysisContext, AnalysisResponse};
use clap::Parser;
use colored::*;
use std::path::PathBuf;

/// Review a public GitHub repository with a language model
#[derive(Debug, Parser)]
#[command(name = "llamareview", author, version, about, long_about = None)]
pub struct Cli {
    /// Repository URL, e.g. https://github.com/owner/repo
    pub url: String,

    /// Short description of what the project does
    #[arg(short, long)]
    pub description: Option<String>,

    /// A goal for the project (repeatable)
    #[arg(short, long = "goal")]
    pub goals: Vec<String>,

    /// Area to emphasise: security, performance, maintainability, style, testing (repeatable)
    #[arg(short, long = "focus")]
    pub focus: Vec<String>,

    /// Experience level of the developer: beginner, intermediate, advanced
    #[arg(short, long)]
    pub level: Option<String>,

    /// Print the full response as JSON instead of a formatted report
    #[arg(long)]
    pub json: bool,

    /// Write the result to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Skip the banner
    #[arg(long)]
    pub quiet: bool,
}

impl Cli {
    /// Validates the context flags the same way the HTTP API validates its payload
    pub fn context(&self) -> Result<AnalysisContext> {
        let request = AnalyzeRequest {
            github_url: self.url.clone(),
            project_description: self.description.clone(),
            project_goals: Some(self.goals.clone()),
            focus_areas: Some(self.focus.clone()),
            experience_level: self.level.clone(),
        };
        request.to_context()
    }
}

/// Prints a colorful banner at the start of the CLI.
pub fn print_banner() {
    println!(
        "{}\n{}\n",
        "  LlamaReview".bold().green(),
        format!("  AI code review for GitHub repositories (v{})", env!("CARGO_PKG_VERSION")).blue()
    );
}

pub fn print_info(message: &str) {
    eprintln!("{}", message.green());
}

pub fn print_warning(message: &str) {
    eprintln!("{}", message.yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}

fn score_colored(score: u8) -> ColoredString {
    let text = format!("{}/100", score);
    match score {
        80..=100 => text.green().bold(),
        60..=79 => text.yellow().bold(),
        _ => text.red().bold(),
    }
}

fn heading(title: &str) -> ColoredString {
    title.bright_cyan().bold()
}

/// Renders a review as a human-readable terminal report
///
/// Empty sections are left out. Colours follow the `colored` global override, so callers
/// writing to a file should disable them first.
pub fn render_report(response: &AnalysisResponse) -> String {
    let repo = &response.repository;
    let analysis = &response.analysis;
    let mut out = String::new();

    out.push_str(&format!("{} {}\n", heading("Repository:"), repo.name.bold()));
    out.push_str(&format!("{}\n", repo.url));
    if !repo.languages.is_empty() {
        out.push_str(&format!("Languages: {}\n", repo.languages.join(", ")));
    }
    out.push_str(&format!("Files analyzed: {}\n\n", repo.total_files_analyzed));

    out.push_str(&format!(
        "{} {}\n",
        heading("Overall score:"),
        score_colored(analysis.overall_score)
    ));

    if !analysis.summary.is_empty() {
        out.push_str(&format!("\n{}\n{}\n", heading("Summary"), analysis.summary));
    }

    if !analysis.strengths.is_empty() {
        out.push_str(&format!("\n{}\n", heading("Strengths")));
        for item in &analysis.strengths {
            if item.description.is_empty() {
                out.push_str(&format!("  {} {}\n", "+".green(), item.title.bold()));
            } else {
                out.push_str(&format!(
                    "  {} {}: {}\n",
                    "+".green(),
                    item.title.bold(),
                    item.description
                ));
            }
        }
    }

    if !analysis.improvements.is_empty() {
        out.push_str(&format!("\n{}\n", heading("Improvements")));
        for (i, item) in analysis.improvements.iter().enumerate() {
            let score = if item.score.is_empty() {
                String::new()
            } else {
                format!(" ({})", item.score)
            };
            out.push_str(&format!("  {}. {}{}\n", i + 1, item.title.bold(), score.dimmed()));
            if !item.issue.is_empty() {
                out.push_str(&format!("     {} {}\n", "Issue:".yellow(), item.issue));
            }
            if !item.action.is_empty() {
                out.push_str(&format!("     {} {}\n", "Action:".green(), item.action));
            }
        }
    }

    if !analysis.code_examples.is_empty() {
        out.push_str(&format!("\n{}\n", heading("Code example")));
        if !analysis.code_examples.before.is_empty() {
            out.push_str(&format!("{}\n{}\n", "Before:".red(), analysis.code_examples.before));
        }
        if !analysis.code_examples.after.is_empty() {
            out.push_str(&format!("{}\n{}\n", "After:".green(), analysis.code_examples.after));
        }
    }

    if !analysis.final_thoughts.is_empty() {
        out.push_str(&format!(
            "\n{}\n{}\n",
            heading("Final thoughts"),
            analysis.final_thoughts
        ));
    }

    out
}

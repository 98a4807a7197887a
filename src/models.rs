//! Data model shared by every stage of a review run.
//!
//! All of these types are created fresh for each run and dropped when it ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated reference to a public GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    /// Owner/organization login
    pub owner: String,
    /// Repository name
    pub name: String,
    /// Canonical `https://github.com/{owner}/{name}` URL
    pub url: String,
}

impl RepositoryRef {
    /// Builds a reference with its canonical URL
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        let owner = owner.into();
        let name = name.into();
        let url = format!("https://github.com/{}/{}", owner, name);
        Self { owner, name, url }
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One row of a repository listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoEntry {
    /// Repository-relative path
    pub path: String,
    /// Size in bytes as reported by the listing
    pub size: u64,
}

impl RepoEntry {
    /// Creates a listing entry
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// A file chosen for review. Content is loaded only after selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: String,
    pub size: u64,
    pub language: String,
    pub content: Option<String>,
}

impl CandidateFile {
    /// Attaches fetched content
    pub fn with_content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }
}

/// Areas the caller wants the review to emphasise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusArea {
    Security,
    Performance,
    Maintainability,
    Style,
    Testing,
}

impl FocusArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Maintainability => "maintainability",
            Self::Style => "style",
            Self::Testing => "testing",
        }
    }
}

impl fmt::Display for FocusArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FocusArea {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "security" => Ok(Self::Security),
            "performance" => Ok(Self::Performance),
            "maintainability" => Ok(Self::Maintainability),
            "style" => Ok(Self::Style),
            "testing" => Ok(Self::Testing),
            other => Err(format!("unknown focus area: {}", other)),
        }
    }
}

/// Self-reported developer experience level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown experience level: {}", other)),
        }
    }
}

/// Optional caller-supplied context that shapes the prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisContext {
    /// Free-text project description
    pub description: Option<String>,
    /// Goals in the order the caller gave them
    pub goals: Vec<String>,
    /// Focus areas, de-duplicated, in first-seen order
    pub focus_areas: Vec<FocusArea>,
    /// Unset when `None`
    pub experience_level: Option<ExperienceLevel>,
}

impl AnalysisContext {
    /// Builds a context, dropping blank strings and duplicate focus areas
    pub fn new(
        description: Option<String>,
        goals: Vec<String>,
        focus_areas: impl IntoIterator<Item = FocusArea>,
        experience_level: Option<ExperienceLevel>,
    ) -> Self {
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let goals = goals
            .into_iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        let mut unique = Vec::new();
        for area in focus_areas {
            if !unique.contains(&area) {
                unique.push(area);
            }
        }
        Self {
            description,
            goals,
            focus_areas: unique,
            experience_level,
        }
    }

    /// True when no field carries information
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.goals.is_empty()
            && self.focus_areas.is_empty()
            && self.experience_level.is_none()
    }
}

/// The single text document sent to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDocument {
    pub text: String,
    /// Paths of the files embedded in `text`, in prompt order
    pub files: Vec<String>,
    /// Whether the last file had to be cut to fit the budget
    pub truncated: bool,
}

/// Something the reviewed code does well
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthItem {
    pub title: String,
    pub description: String,
}

/// A concrete improvement suggestion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementItem {
    pub title: String,
    /// Free-form, e.g. `"7/10"`
    pub score: String,
    pub issue: String,
    pub action: String,
}

/// Before/after illustration; both empty means no example was provided
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExamplePair {
    pub before: String,
    pub after: String,
}

impl CodeExamplePair {
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

/// Structured form of the model's review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Always within `0..=100`
    pub overall_score: u8,
    pub summary: String,
    pub strengths: Vec<StrengthItem>,
    pub improvements: Vec<ImprovementItem>,
    pub code_examples: CodeExamplePair,
    pub final_thoughts: String,
}

/// Score used when the model gives none
pub const DEFAULT_SCORE: u8 = 50;

impl Default for AnalysisRecord {
    fn default() -> Self {
        Self {
            overall_score: DEFAULT_SCORE,
            summary: String::new(),
            strengths: Vec::new(),
            improvements: Vec::new(),
            code_examples: CodeExamplePair::default(),
            final_thoughts: String::new(),
        }
    }
}

/// Repository metadata block of the final response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
    pub url: String,
    pub languages: Vec<String>,
    pub total_files_analyzed: usize,
}

/// The terminal artifact of a review run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub repository: RepositorySummary,
    pub analysis: AnalysisRecord,
    /// The untouched model text
    pub raw_review: String,
    /// Completion time (UTC)
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_ref_canonical_url() {
        let repo = RepositoryRef::new("octocat", "Hello-World");
        assert_eq!(repo.url, "https://github.com/octocat/Hello-World");
        assert_eq!(repo.full_name(), "octocat/Hello-World");
    }

    #[test]
    fn test_context_normalization() {
        let context = AnalysisContext::new(
            Some("   ".to_string()),
            vec!["ship v1".to_string(), " ".to_string()],
            [FocusArea::Security, FocusArea::Style, FocusArea::Security],
            None,
        );
        assert_eq!(context.description, None);
        assert_eq!(context.goals, vec!["ship v1".to_string()]);
        assert_eq!(context.focus_areas, vec![FocusArea::Security, FocusArea::Style]);
        assert!(!context.is_empty());
        assert!(AnalysisContext::default().is_empty());
    }

    #[test]
    fn test_focus_area_serde_names() {
        let json = serde_json::to_string(&FocusArea::Maintainability).unwrap();
        assert_eq!(json, "\"maintainability\"");
        let level: ExperienceLevel = serde_json::from_str("\"advanced\"").unwrap();
        assert_eq!(level, ExperienceLevel::Advanced);
        assert!("guru".parse::<ExperienceLevel>().is_err());
    }

    #[test]
    fn test_default_record() {
        let record = AnalysisRecord::default();
        assert_eq!(record.overall_score, 50);
        assert!(record.code_examples.is_empty());
    }
}

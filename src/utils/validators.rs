use crate::error::{Result, ReviewError};
use crate::models::RepositoryRef;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static GITHUB_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid name regex"));

/// Trims whitespace and surrounding quotes from user input
///
/// - Trims leading/trailing ASCII and Unicode whitespace
/// - Strips surrounding single or double quotes if present
pub fn normalize_user_input(input: &str) -> &str {
    let trimmed = input.trim();
    if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Validates a GitHub repository URL and derives its canonical reference
///
/// Accepts `https://github.com/{owner}/{repo}` with optional `www.`, trailing slash,
/// `.git` suffix, or deeper paths such as `/tree/main/src`.
pub fn validate_github_url(input: &str) -> Result<RepositoryRef> {
    let raw = normalize_user_input(input);
    if raw.is_empty() {
        return Err(ReviewError::InvalidUrl("URL is empty".into()));
    }

    let parsed = Url::parse(raw).map_err(|e| ReviewError::InvalidUrl(format!("{}: {}", raw, e)))?;

    if !matches!(parsed.scheme(), "https" | "http") {
        return Err(ReviewError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        )));
    }

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    if host != "github.com" && host != "www.github.com" {
        return Err(ReviewError::InvalidUrl(format!("{} is not a GitHub URL", raw)));
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < 2 {
        return Err(ReviewError::InvalidUrl(
            "expected https://github.com/{owner}/{repository}".into(),
        ));
    }

    let owner = segments[0];
    let repo = segments[1].strip_suffix(".git").unwrap_or(segments[1]);

    if !GITHUB_NAME.is_match(owner) || !GITHUB_NAME.is_match(repo) || repo == "." || repo == ".." {
        return Err(ReviewError::InvalidUrl(format!(
            "'{}/{}' is not a valid repository name",
            owner, repo
        )));
    }

    Ok(RepositoryRef::new(owner, repo))
}

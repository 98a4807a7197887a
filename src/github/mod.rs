//! GitHub REST API access: tree listing, file contents and language statistics.

use crate::config::GitHubConfig;
use crate::error::{Result, ReviewError};
use crate::models::{RepoEntry, RepositoryRef};
use crate::utils::sanitize_api_response;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Content of one repository file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedContent {
    Text(String),
    /// Not valid text; such files are dropped from the review
    Binary,
}

/// Source of repository listings and file contents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// Every file (blob) in the repository's default branch
    async fn list_paths(&self, repo: &RepositoryRef) -> Result<Vec<RepoEntry>>;

    /// Content of a single file
    async fn fetch_content(&self, repo: &RepositoryRef, path: &str) -> Result<FetchedContent>;

    /// Language names, most used first
    async fn languages(&self, _repo: &RepositoryRef) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: Option<String>,
    encoding: Option<String>,
}

/// GitHub implementation of [`RepositoryProvider`]
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: Url,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("llamareview/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        if let Some(token) = config.token.as_deref().filter(|t| !t.trim().is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|_| ReviewError::Config("GitHub token contains invalid characters".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ReviewError::Network(e.to_string()))?;

        let api_base = Url::parse(config.api_base.trim_end_matches('/')).map_err(|e| {
            ReviewError::Config(format!("invalid GitHub API base '{}': {}", config.api_base, e))
        })?;

        Ok(Self { client, api_base })
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| ReviewError::Config("GitHub API base cannot be a base URL".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn repo_endpoint<'a>(
        &self,
        repo: &'a RepositoryRef,
        rest: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url> {
        self.endpoint(
            ["repos", repo.owner.as_str(), repo.name.as_str()]
                .into_iter()
                .chain(rest),
        )
    }

    async fn get(&self, url: Url, what: &str) -> Result<Response> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ReviewError::Network(format!("{}: {}", what, e.without_url())))?;
        check_status(response, what).await
    }

    async fn default_branch(&self, repo: &RepositoryRef) -> Result<String> {
        let url = self.repo_endpoint(repo, [])?;
        let info: RepoInfo = self.get(url, &repo.full_name()).await?.json().await?;
        Ok(info.default_branch.unwrap_or_else(|| "main".to_string()))
    }
}

/// Maps a non-success GitHub response onto the error taxonomy
async fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let quota_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false);
    let body = response.text().await.unwrap_or_default();
    debug!(
        "GitHub returned {} for {}: {}",
        status,
        what,
        sanitize_api_response(&body)
    );

    Err(match status {
        StatusCode::NOT_FOUND => ReviewError::NotFound(what.to_string()),
        StatusCode::TOO_MANY_REQUESTS => ReviewError::RateLimitExceeded(what.to_string()),
        StatusCode::FORBIDDEN if quota_exhausted => ReviewError::RateLimitExceeded(what.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ReviewError::Forbidden(what.to_string()),
        _ => ReviewError::GitHubApi(format!("{} returned HTTP {}", what, status.as_u16())),
    })
}

/// Decodes a base64 `contents` payload and classifies it as text or binary
fn decode_content(encoded: &str) -> Result<FetchedContent> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| ReviewError::GitHubApi(format!("invalid base64 content: {}", e)))?;

    if content_inspector::inspect(&bytes).is_binary() {
        return Ok(FetchedContent::Binary);
    }
    Ok(match String::from_utf8(bytes) {
        Ok(text) => FetchedContent::Text(text),
        Err(_) => FetchedContent::Binary,
    })
}

#[async_trait]
impl RepositoryProvider for GitHubClient {
    async fn list_paths(&self, repo: &RepositoryRef) -> Result<Vec<RepoEntry>> {
        let branch = self.default_branch(repo).await?;

        let mut url = self.repo_endpoint(repo, ["git", "trees"])?;
        url.path_segments_mut()
            .map_err(|_| ReviewError::Config("GitHub API base cannot be a base URL".into()))?
            .extend(branch.split('/'));
        url.query_pairs_mut().append_pair("recursive", "1");

        let tree: TreeResponse = self.get(url, &repo.full_name()).await?.json().await?;
        if tree.truncated {
            warn!(
                "Tree listing for {} was truncated by GitHub; analysing a partial listing",
                repo
            );
        }

        let entries: Vec<RepoEntry> = tree
            .tree
            .into_iter()
            .filter(|item| item.kind == "blob")
            .map(|item| RepoEntry::new(item.path, item.size.unwrap_or(0)))
            .collect();

        info!("Listed {} files in {} ({})", entries.len(), repo, branch);
        Ok(entries)
    }

    async fn fetch_content(&self, repo: &RepositoryRef, path: &str) -> Result<FetchedContent> {
        let url = self.repo_endpoint(repo, std::iter::once("contents").chain(path.split('/')))?;
        let what = format!("{}:{}", repo, path);
        let payload: ContentResponse = self.get(url, &what).await?.json().await?;

        match (payload.encoding.as_deref(), payload.content) {
            (Some("base64"), Some(content)) => decode_content(&content),
            _ => Err(ReviewError::GitHubApi(format!(
                "{} has no inline content",
                what
            ))),
        }
    }

    async fn languages(&self, repo: &RepositoryRef) -> Result<Vec<String>> {
        let url = self.repo_endpoint(repo, ["languages"])?;
        let stats: HashMap<String, u64> =
            self.get(url, &repo.full_name()).await?.json().await?;

        let mut ranked: Vec<(String, u64)> = stats.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(ranked.into_iter().map(|(name, _)| name).collect())
    }
}

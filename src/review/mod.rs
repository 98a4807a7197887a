//! The repository analysis pipeline: select, fetch, prompt, complete, parse, assemble.

pub mod parser;
pub mod prompt;
pub mod report;
pub mod selector;

use crate::config::Config;
use crate::error::{ProviderError, Result, ReviewError};
use crate::github::{FetchedContent, RepositoryProvider};
use crate::llm::ModelClient;
use crate::models::{AnalysisContext, AnalysisResponse, CandidateFile, RepositoryRef};
use crate::parallel::{ParallelProcessor, TaskOutcome};
use crate::utils::validate_github_url;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Reviews one repository per call; holds no per-run state
#[derive(Clone)]
pub struct ReviewPipeline {
    config: Arc<Config>,
    provider: Arc<dyn RepositoryProvider>,
    model: Arc<dyn ModelClient>,
}

impl ReviewPipeline {
    pub fn new(
        config: Arc<Config>,
        provider: Arc<dyn RepositoryProvider>,
        model: Arc<dyn ModelClient>,
    ) -> Self {
        Self {
            config,
            provider,
            model,
        }
    }

    /// Checks the model provider without running a review
    pub async fn check_model(&self) -> std::result::Result<(), ProviderError> {
        self.model.health_check().await
    }

    /// Runs the full review for `url`
    ///
    /// Input errors are reported before any upstream call. Dropping the returned future
    /// abandons in-flight fetches and the model call.
    pub async fn analyze(&self, url: &str, context: AnalysisContext) -> Result<AnalysisResponse> {
        let repo = validate_github_url(url)?;
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("review", %run_id, repo = %repo);

        self.run(repo, context).instrument(span).await
    }

    async fn run(&self, repo: RepositoryRef, context: AnalysisContext) -> Result<AnalysisResponse> {
        info!("Starting review of {}", repo.url);

        let entries = self.provider.list_paths(&repo).await?;
        let selection = &self.config.selection;
        let candidates = selector::select(
            &entries,
            selection.effective_max_files(),
            selection.max_bytes_per_file,
            selection.large_file_threshold,
        )?;
        info!(
            "Selected {} of {} files for review",
            candidates.len(),
            entries.len()
        );

        let files = self.fetch_contents(&repo, candidates).await?;

        let prompt = prompt::build(
            &files,
            &context,
            &repo.full_name(),
            self.config.prompt.max_chars,
        )?;

        info!(
            "Requesting review from {} ({} files, {} chars{})",
            self.model.name(),
            prompt.files.len(),
            prompt.text.chars().count(),
            if prompt.truncated { ", content cut to fit" } else { "" }
        );
        let raw = self.model.complete(&prompt.text).await?;
        let analysis = parser::parse(&raw);

        let languages = self.languages(&repo, &files, &prompt.files).await;
        let response = report::assemble(&repo, languages, prompt.files.len(), analysis, raw);

        info!(
            "Review of {} finished with score {}",
            repo,
            response.analysis.overall_score
        );
        Ok(response)
    }

    /// Loads content for each candidate, dropping files that fail, time out or are binary
    async fn fetch_contents(
        &self,
        repo: &RepositoryRef,
        candidates: Vec<CandidateFile>,
    ) -> Result<Vec<CandidateFile>> {
        let processing = &self.config.processing;
        let processor =
            ParallelProcessor::new(processing.fetch_concurrency, processing.fetch_timeout());

        let tasks: Vec<_> = candidates
            .iter()
            .map(|file| self.provider.fetch_content(repo, &file.path))
            .collect();
        let outcomes = processor.process(tasks).await;

        let mut files = Vec::with_capacity(candidates.len());
        for (file, outcome) in candidates.into_iter().zip(outcomes) {
            match outcome {
                TaskOutcome::Done(FetchedContent::Text(content)) => {
                    files.push(file.with_content(content))
                }
                TaskOutcome::Done(FetchedContent::Binary) => {
                    warn!("Skipping {}: binary content", file.path)
                }
                TaskOutcome::Failed(e) => warn!("Skipping {}: {}", file.path, e),
                TaskOutcome::TimedOut => warn!("Skipping {}: fetch timed out", file.path),
            }
        }

        if files.is_empty() {
            return Err(ReviewError::NoAnalyzableFiles);
        }
        debug!("Fetched {} files", files.len());
        Ok(files)
    }

    /// Provider language listing, or the distinct tags of the analysed files
    async fn languages(
        &self,
        repo: &RepositoryRef,
        files: &[CandidateFile],
        analyzed: &[String],
    ) -> Vec<String> {
        match self.provider.languages(repo).await {
            Ok(languages) if !languages.is_empty() => return languages,
            Ok(_) => {}
            Err(e) => debug!("Language listing unavailable: {}", e),
        }

        let mut tags: Vec<String> = Vec::new();
        for file in files.iter().filter(|f| analyzed.contains(&f.path)) {
            if !tags.contains(&file.language) {
                tags.push(file.language.clone());
            }
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::github::MockRepositoryProvider;
    use crate::llm::MockModelClient;
    use crate::models::RepoEntry;
    use std::time::Duration;

    const ANSWER: &str = "SUMMARY: Good code.\nSCORE: 85/100\nSTRENGTHS:\n- Clear naming: variables are descriptive\nIMPROVEMENTS:\n1. Error handling - score: 6/10 - issue: missing try/catch - action: add error handling";

    fn fast_config() -> Arc<Config> {
        let mut config = Config::default();
        config.processing.fetch_timeout_secs = 1;
        Arc::new(config)
    }

    fn pipeline(provider: MockRepositoryProvider, model: MockModelClient) -> ReviewPipeline {
        ReviewPipeline::new(fast_config(), Arc::new(provider), Arc::new(model))
    }

    fn answering_model() -> MockModelClient {
        let mut model = MockModelClient::new();
        model.expect_name().return_const("mock".to_string());
        model
            .expect_complete()
            .times(1)
            .returning(|_| Ok(ANSWER.to_string()));
        model
    }

    #[tokio::test]
    async fn test_invalid_url_makes_no_upstream_calls() {
        let mut provider = MockRepositoryProvider::new();
        provider.expect_list_paths().never();
        let mut model = MockModelClient::new();
        model.expect_complete().never();

        let err = pipeline(provider, model)
            .analyze("https://gitlab.com/owner/repo", AnalysisContext::default())
            .await
            .unwrap_err();
        assert!(err.is_input_error());
    }

    #[tokio::test]
    async fn test_happy_path() {
        let mut provider = MockRepositoryProvider::new();
        provider.expect_list_paths().returning(|_| {
            Ok(vec![
                RepoEntry::new("src/app.py", 100),
                RepoEntry::new("logo.png", 100),
            ])
        });
        provider
            .expect_fetch_content()
            .returning(|_, _| Ok(FetchedContent::Text("print('hi')".into())));
        provider
            .expect_languages()
            .returning(|_| Ok(vec!["Python".to_string()]));

        let response = pipeline(provider, answering_model())
            .analyze("https://github.com/octocat/app", AnalysisContext::default())
            .await
            .unwrap();

        assert_eq!(response.repository.name, "octocat/app");
        assert_eq!(response.repository.total_files_analyzed, 1);
        assert_eq!(response.repository.languages, vec!["Python"]);
        assert_eq!(response.analysis.overall_score, 85);
        assert_eq!(response.raw_review, ANSWER);
    }

    #[tokio::test]
    async fn test_no_analyzable_files_skips_model() {
        let mut provider = MockRepositoryProvider::new();
        provider
            .expect_list_paths()
            .returning(|_| Ok(vec![RepoEntry::new("assets/logo.png", 100)]));
        let mut model = MockModelClient::new();
        model.expect_complete().never();

        let err = pipeline(provider, model)
            .analyze("https://github.com/octocat/app", AnalysisContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::NoAnalyzableFiles));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_all_fetches_failing_is_no_analyzable_files() {
        let mut provider = MockRepositoryProvider::new();
        provider
            .expect_list_paths()
            .returning(|_| Ok(vec![RepoEntry::new("main.go", 100)]));
        provider
            .expect_fetch_content()
            .returning(|_, _| Ok(FetchedContent::Binary));
        let mut model = MockModelClient::new();
        model.expect_complete().never();

        let err = pipeline(provider, model)
            .analyze("https://github.com/octocat/app", AnalysisContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::NoAnalyzableFiles));
    }

    #[tokio::test]
    async fn test_listing_errors_propagate() {
        let mut provider = MockRepositoryProvider::new();
        provider
            .expect_list_paths()
            .returning(|_| Err(ReviewError::NotFound("octocat/missing".into())));

        let err = pipeline(provider, MockModelClient::new())
            .analyze("https://github.com/octocat/missing", AnalysisContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "repository_not_found");
    }

    #[tokio::test]
    async fn test_provider_failure_is_terminal() {
        let mut provider = MockRepositoryProvider::new();
        provider
            .expect_list_paths()
            .returning(|_| Ok(vec![RepoEntry::new("main.py", 10)]));
        provider
            .expect_fetch_content()
            .returning(|_, _| Ok(FetchedContent::Text("pass".into())));
        let mut model = MockModelClient::new();
        model.expect_name().return_const("mock".to_string());
        model
            .expect_complete()
            .returning(|_| Err(ProviderError::Timeout));

        let err = pipeline(provider, model)
            .analyze("https://github.com/octocat/app", AnalysisContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Provider(ProviderError::Timeout)));
        assert!(err.is_retryable());
    }

    /// Serves 30 files; the listed ones never answer within the fetch timeout
    struct SlowProvider {
        slow: Vec<String>,
    }

    #[async_trait::async_trait]
    impl RepositoryProvider for SlowProvider {
        async fn list_paths(&self, _repo: &RepositoryRef) -> Result<Vec<RepoEntry>> {
            Ok((0..30)
                .map(|i| RepoEntry::new(format!("src/m{:02}.rs", i), 100))
                .collect())
        }

        async fn fetch_content(&self, _repo: &RepositoryRef, path: &str) -> Result<FetchedContent> {
            if self.slow.iter().any(|p| p == path) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok(FetchedContent::Text(format!("// {}", path)))
        }
    }

    #[tokio::test]
    async fn test_timed_out_fetches_are_dropped() {
        let slow: Vec<String> = [3, 7, 11, 19, 28]
            .iter()
            .map(|i| format!("src/m{:02}.rs", i))
            .collect();
        let pipeline = ReviewPipeline::new(
            fast_config(),
            Arc::new(SlowProvider { slow }),
            Arc::new(answering_model()),
        );

        let response = pipeline
            .analyze("https://github.com/octocat/app", AnalysisContext::default())
            .await
            .unwrap();

        assert_eq!(response.repository.total_files_analyzed, 25);
        assert_eq!(response.repository.languages, vec!["rust"]);
        assert_eq!(response.analysis.overall_score, 85);
    }

    #[tokio::test]
    async fn test_check_model_skips_repository_and_review() {
        let mut provider = MockRepositoryProvider::new();
        provider.expect_list_paths().never();
        let mut model = MockModelClient::new();
        model.expect_complete().never();
        model
            .expect_health_check()
            .times(1)
            .returning(|| Err(ProviderError::Auth("revoked".into())));

        let err = pipeline(provider, model).check_model().await.unwrap_err();
        assert_eq!(err, ProviderError::Auth("revoked".into()));
    }
}

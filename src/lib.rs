#![warn(clippy::all)]

//! LlamaReview - AI-assisted code quality reviews for public GitHub repositories
//!
//! Given a repository URL and optional project context, the library selects the most relevant
//! source files, builds a single prompt, asks a language model for a review and parses the
//! labeled answer into a structured [`models::AnalysisRecord`].
//!
//! ## Pipeline
//! - [`review::selector`] ranks and caps the repository listing
//! - [`github`] lists the tree and fetches file contents with bounded concurrency
//! - [`review::prompt`] assembles the prompt within a character budget
//! - [`llm`] calls Anthropic or OpenAI with retries and timeouts
//! - [`review::parser`] turns the raw review into structured fields
//! - [`review::report`] attaches repository metadata and a timestamp
//!
//! ## Usage
//! ```rust,no_run
//! use llamareview::{github::GitHubClient, llm::client_from_config, Config, ReviewPipeline};
//! use llamareview::models::AnalysisContext;
//! use std::sync::Arc;
//!
//! async fn example() -> llamareview::Result<()> {
//!     let config = Arc::new(Config::load()?);
//!     let provider = Arc::new(GitHubClient::new(&config.github)?);
//!     let model = client_from_config(&config.llm)?;
//!     let pipeline = ReviewPipeline::new(Arc::clone(&config), provider, model);
//!
//!     let review = pipeline
//!         .analyze("https://github.com/rust-lang/log", AnalysisContext::default())
//!         .await?;
//!     println!("{}: {}/100", review.repository.name, review.analysis.overall_score);
//!     Ok(())
//! }
//! ```

/// REST API for the web service
pub mod api;
/// Command-line arguments and report rendering
pub mod cli;
/// Configuration loading and environment overrides
pub mod config;
/// Error handling types and utilities
pub mod error;
/// GitHub repository provider
pub mod github;
/// Language model clients
pub mod llm;
/// Logging configuration and utilities
pub mod logging;
/// Shared data types
pub mod models;
/// Parallel processing utilities
pub mod parallel;
/// Prompt text and section labels
pub mod prompts;
/// The review pipeline
pub mod review;
/// Terminal progress feedback
pub mod ui;
/// Utilities (URL validation, language detection, retry helpers, sanitising)
pub mod utils;

// Re-export common types
pub use config::Config;
pub use error::{ProviderError, Result, ReviewError};
pub use models::{AnalysisContext, AnalysisRecord, AnalysisResponse, RepositoryRef};
pub use review::ReviewPipeline;

pub mod language;
pub mod retry;
pub mod sanitize;
pub mod validators;

pub use language::{detect_language, is_primary_language};
pub use retry::{with_retry, RetryPolicy};
pub use sanitize::{sanitize_api_response, truncate_chars};
pub use validators::{normalize_user_input, validate_github_url};

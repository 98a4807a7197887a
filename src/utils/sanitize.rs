const MAX_LOGGED_BODY: usize = 300;

const SECRET_PATTERNS: &[&str] = &[
    "api_key",
    "apikey",
    "x-api-key",
    "secret",
    "password",
    "credential",
    "bearer",
    "sk-",
    "ghp_",
];

/// Truncates an upstream response body for logging, redacting it if it looks sensitive
pub fn sanitize_api_response(content: &str) -> String {
    let truncated = truncate_chars(content, MAX_LOGGED_BODY);

    let lower = truncated.to_lowercase();
    if SECRET_PATTERNS.iter().any(|pattern| lower.contains(pattern)) {
        return "(response details redacted)".to_string();
    }
    truncated.to_string()
}

/// Cuts `s` to at most `max` characters, respecting char boundaries
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_redacts_secret_looking_bodies() {
        let body = r#"{"error":"invalid x-api-key: sk-ant-abc"}"#;
        assert_eq!(sanitize_api_response(body), "(response details redacted)");

        let body = r#"{"error":{"type":"overloaded_error"}}"#;
        assert_eq!(sanitize_api_response(body), body);
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        assert_eq!(sanitize_api_response(&body).len(), MAX_LOGGED_BODY);
    }
}

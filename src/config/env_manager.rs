use super::{Config, LlmProvider};
use crate::error::{Result, ReviewError};
use console::Term;
use dialoguer::Password;

/// Reads an environment variable, treating empty values as unset
pub fn get_env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Prompts for the model API key when it is missing and a terminal is attached
///
/// Returns `Ok(false)` without prompting when stdin/stdout are not interactive.
pub fn prompt_missing_api_key(config: &mut Config) -> Result<bool> {
    if config.has_api_key() || !Term::stdout().is_term() || !Term::stderr().is_term() {
        return Ok(false);
    }

    let env_name = match config.llm.provider {
        LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        LlmProvider::OpenAi => "OPENAI_API_KEY",
    };

    let key: String = Password::new()
        .with_prompt(format!("Enter your {} API key ({})", config.llm.provider, env_name))
        .allow_empty_password(true)
        .interact()
        .map_err(|e| ReviewError::Config(e.to_string()))?;

    if key.trim().is_empty() {
        return Ok(false);
    }
    config.llm.api_key = Some(key.trim().to_string());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_is_none() {
        assert_eq!(get_env_value("LLAMAREVIEW_SURELY_UNSET_VARIABLE"), None);
    }

    #[test]
    fn test_no_prompt_when_key_present() -> Result<()> {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-ant-test".into());
        assert!(!prompt_missing_api_key(&mut config)?);
        Ok(())
    }
}

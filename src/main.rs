use anyhow::{Context, Result};
use clap::Parser;
use llamareview::{
    cli::{self, Cli},
    config::prompt_missing_api_key,
    github::GitHubClient,
    llm::client_from_config,
    logging,
    ui::ProgressManager,
    utils::validate_github_url,
    Config, ReviewPipeline,
};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        cli::print_error(&format!("{:#}", e));
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    logging::init(&cli.log_level)?;

    let context = cli.context()?;
    validate_github_url(&cli.url)?;
    let mut config = Config::load().context("failed to load configuration")?;
    if prompt_missing_api_key(&mut config)? {
        log::debug!("API key entered interactively");
    }
    config.validate()?;

    let machine_output = cli.json || cli.output.is_some();
    if !cli.quiet && !machine_output {
        cli::print_banner();
    }

    if config.github.token.is_none() && !machine_output {
        cli::print_warning("GITHUB_TOKEN is not set; unauthenticated GitHub requests are limited to 60 per hour");
    }

    let config = Arc::new(config);
    let provider = Arc::new(GitHubClient::new(&config.github)?);
    let model = client_from_config(&config.llm)?;
    let pipeline = ReviewPipeline::new(Arc::clone(&config), provider, model);

    let spinner = ProgressManager::new(!cli.json).create_spinner(&format!(
        "Reviewing {} with {}...",
        cli.url, config.llm.model
    ));
    let result = pipeline.analyze(&cli.url, context).await;
    spinner.finish_and_clear();
    let response = result?;

    match &cli.output {
        Some(path) => {
            let body = if cli.json {
                serde_json::to_string_pretty(&response)?
            } else {
                colored::control::set_override(false);
                cli::render_report(&response)
            };
            tokio::fs::write(path, body)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            if !cli.json {
                cli::print_info(&format!("Review written to {}", path.display()));
            }
        }
        None if cli.json => println!("{}", serde_json::to_string_pretty(&response)?),
        None => println!("{}", cli::render_report(&response)),
    }

    Ok(())
}

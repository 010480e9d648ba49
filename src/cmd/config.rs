use clap::{Args, Subcommand};

use crate::config::{AppConfig, validate_environment};
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Validate the environment; exits non-zero when required variables are missing.
    Check,
    /// Show the effective configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Check => run_check(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_check() -> AppResult<()> {
    let report = validate_environment();
    report.print();
    report.into_result()
}

fn run_show() -> AppResult<()> {
    let cfg = AppConfig::from_env()?;

    println!("Database URL: {}", cfg.database_url);
    println!("LLM provider: {}", cfg.llm_provider.as_str());
    println!("LLM API key: {}", mask_secret(&cfg.llm_api_key));
    println!("LLM model: {}", display_value(&cfg.llm_model));
    if cfg.llm_api_key.is_some() && cfg.usable_api_key().is_none() {
        println!("Note: the LLM API key is still the placeholder; classification will use defaults.");
    }

    Ok(())
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<provider default>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.chars().count() > 6 => {
            let prefix: String = token.chars().take(3).collect();
            let suffix: String = token.chars().skip(token.chars().count() - 3).collect();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}

use std::env;

use crate::error::{AppError, AppResult};

pub const PLACEHOLDER_API_KEY: &str = "your-api-key-here";

const REQUIRED_VARS: &[(&str, &str)] = &[("DATABASE_URL", "Database connection string is required")];

const OPTIONAL_VARS: &[(&str, &str)] = &[
    ("LLM_API_KEY", "LLM API key not set - using default classification"),
    ("LLM_PROVIDER", "LLM provider not set - defaulting to openai"),
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub llm_api_key: Option<String>,
    pub llm_provider: LlmProvider,
    pub llm_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Custom(String),
}

impl LlmProvider {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "openai" => LlmProvider::OpenAi,
            "anthropic" => LlmProvider::Anthropic,
            other => LlmProvider::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::Custom(name) => name,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| AppError::Configuration("DATABASE_URL is not set".to_string()))?;
        let llm_provider = get("LLM_PROVIDER")
            .map(|provider| LlmProvider::parse(&provider))
            .unwrap_or(LlmProvider::OpenAi);

        Ok(Self {
            database_url,
            llm_api_key: get("LLM_API_KEY"),
            llm_provider,
            llm_model: get("LLM_MODEL"),
        })
    }

    /// The API key, unless it is missing or still the template placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.llm_api_key
            .as_deref()
            .filter(|key| *key != PLACEHOLDER_API_KEY)
    }
}

/// Outcome of checking the process environment before startup.
#[derive(Debug, Default)]
pub struct EnvReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl EnvReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn print(&self) {
        if !self.errors.is_empty() {
            eprintln!("\nEnvironment configuration errors:");
            for error in &self.errors {
                eprintln!("  {error}");
            }
        }
        if !self.warnings.is_empty() {
            eprintln!("\nEnvironment configuration warnings:");
            for warning in &self.warnings {
                eprintln!("  {warning}");
            }
        }
        if self.is_ok() {
            eprintln!("\nEnvironment validation passed.");
        }
    }

    pub fn into_result(self) -> AppResult<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(AppError::Configuration(format!(
                "environment validation failed ({} error(s))",
                self.errors.len()
            )))
        }
    }
}

pub fn validate_environment() -> EnvReport {
    check_environment(|name| env::var(name).ok())
}

pub fn check_environment<F>(lookup: F) -> EnvReport
where
    F: Fn(&str) -> Option<String>,
{
    let is_missing = |name: &str| lookup(name).is_none_or(|value| value.is_empty());
    let mut report = EnvReport::default();

    for &(name, message) in REQUIRED_VARS {
        if is_missing(name) {
            report.errors.push(format!("{name}: {message}"));
        }
    }
    for &(name, message) in OPTIONAL_VARS {
        if is_missing(name) {
            report.warnings.push(format!("{name}: {message}"));
        }
    }

    report
}

use serde_json::Value;

use crate::domain::classification::Classification;
use crate::domain::ticket::{Category, Priority};
use crate::error::{AppError, AppResult};
use crate::services::LanguageModelService;

pub fn classification_prompt(description: &str) -> String {
    format!(
        r#"Analyze this support ticket description and classify it.

Description: {description}

Respond with ONLY a JSON object in this exact format:
{{"category": "one of: billing, technical, account, general", "priority": "one of: low, medium, high, critical"}}

Classification guidelines:
- billing: payment issues, invoices, refunds, pricing questions
- technical: bugs, errors, performance issues, technical problems
- account: login, password, profile, account settings
- general: everything else

Priority guidelines:
- critical: system down, data loss, security breach, blocking all work
- high: major feature broken, affecting multiple users, urgent business impact
- medium: feature partially working, workarounds available, moderate impact
- low: minor issues, cosmetic problems, feature requests, questions

Respond with ONLY the JSON, no other text."#
    )
}

/// Suggests a category and priority for `description`.
///
/// Never fails: without a model, or when the model call or its reply is
/// unusable, the default classification is returned.
pub async fn classify_description(
    model: Option<&dyn LanguageModelService>,
    description: &str,
) -> Classification {
    let Some(model) = model else {
        return Classification::default();
    };

    let prompt = classification_prompt(description);
    let outcome = match model.complete(&prompt).await {
        Ok(reply) => parse_classification(&reply),
        Err(err) => Err(err),
    };

    outcome.unwrap_or_else(|err| {
        tracing::error!(error = %err, "LLM classification error");
        Classification::default()
    })
}

/// Reads `{"category": .., "priority": ..}` from a model reply. Missing or
/// unrecognised fields fall back individually to the defaults.
pub fn parse_classification(reply: &str) -> AppResult<Classification> {
    let value: Value = serde_json::from_str(reply.trim()).map_err(|err| {
        AppError::LanguageModel(format!("model reply is not valid JSON: {err}"))
    })?;
    let defaults = Classification::default();

    let suggested_category = value
        .get("category")
        .and_then(Value::as_str)
        .and_then(Category::parse)
        .unwrap_or(defaults.suggested_category);
    let suggested_priority = value
        .get("priority")
        .and_then(Value::as_str)
        .and_then(Priority::parse)
        .unwrap_or(defaults.suggested_priority);

    Ok(Classification {
        suggested_category,
        suggested_priority,
    })
}

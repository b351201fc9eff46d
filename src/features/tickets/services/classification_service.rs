use std::collections::HashMap;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::config::ClassifierConfig;
use crate::core::error::{AppError, Result};
use crate::features::tickets::models::{TicketCategory, TicketPriority};
use crate::shared::llm::{parse_with_fallback, LlmResponse};
use crate::shared::prompts::render_template;

const CLASSIFICATION_TEMPLATE: &str = "ticket_classification.jinja";

fn default_true() -> bool {
    true
}

/// Structured classification returned by the model
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
#[schemars(title = "TicketClassification")]
pub struct TicketClassification {
    #[schemars(description = "Ticket category: billing, technical, account, or general")]
    pub suggested_category: TicketCategory,

    #[schemars(description = "Ticket priority: low, medium, high, or critical")]
    pub suggested_priority: TicketPriority,

    /// Whether the LLM classification was successful
    #[serde(default = "default_true")]
    #[schemars(skip)]
    pub is_llm_success: bool,

    /// Error message if LLM classification failed
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

impl LlmResponse for TicketClassification {
    fn mark_as_fallback(&mut self, error_message: String) {
        self.is_llm_success = false;
        self.llm_error_message = Some(error_message);
    }

    fn is_success(&self) -> bool {
        self.is_llm_success
    }
}

/// Outcome of a classification attempt. `Unavailable` covers every failure
/// mode: missing credential, network error, upstream error, unparseable
/// output. Callers decide the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationOutcome {
    Suggested {
        category: TicketCategory,
        priority: TicketPriority,
    },
    Unavailable,
}

/// Service for suggesting a category and priority from free-text
/// descriptions via an OpenAI-compatible chat-completions API
pub struct ClassificationService {
    client: reqwest::Client,
    config: ClassifierConfig,
}

impl ClassificationService {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to create classifier HTTP client: {:?}", e);
                AppError::Internal(format!("Failed to create classifier HTTP client: {}", e))
            })?;

        if config.api_key.is_none() {
            tracing::warn!("No classifier credential configured; classification is disabled");
        }

        Ok(Self { client, config })
    }

    /// Classify a ticket description. Never returns an error: any failure
    /// along the way degrades to `Unavailable`.
    pub async fn classify(&self, description: &str) -> ClassificationOutcome {
        let Some(api_key) = &self.config.api_key else {
            tracing::debug!("Classification skipped: no credential");
            return ClassificationOutcome::Unavailable;
        };

        let prompt = match self.build_prompt(description) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!("Failed to render classification prompt: {}", e);
                return ClassificationOutcome::Unavailable;
            }
        };

        let content = match self.request_completion(api_key, &prompt).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Classification request failed: {}", e);
                return ClassificationOutcome::Unavailable;
            }
        };

        tracing::debug!(
            "Raw classifier response (first 500 chars): {}",
            content.chars().take(500).collect::<String>()
        );

        let classification: TicketClassification = parse_with_fallback(&content);

        if classification.is_success() {
            ClassificationOutcome::Suggested {
                category: classification.suggested_category,
                priority: classification.suggested_priority,
            }
        } else {
            tracing::warn!(
                "Classifier output was unparseable: {:?}",
                classification.llm_error_message
            );
            ClassificationOutcome::Unavailable
        }
    }

    fn build_prompt(&self, description: &str) -> Result<String> {
        let mut context: HashMap<&str, minijinja::Value> = HashMap::new();
        context.insert("description", minijinja::Value::from(description));
        context.insert(
            "categories",
            minijinja::Value::from("billing, technical, account, general"),
        );
        context.insert(
            "priorities",
            minijinja::Value::from("low, medium, high, critical"),
        );
        context.insert(
            "schema",
            minijinja::Value::from(TicketClassification::json_schema_string()),
        );

        render_template(CLASSIFICATION_TEMPLATE, &context)
            .map_err(|e| AppError::Internal(format!("Template error: {}", e)))
    }

    async fn request_completion(&self, api_key: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let body = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.3,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Classifier request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Internal(format!(
                "Classifier returned status {}",
                status
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid classifier response body: {}", e)))?;

        payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::Internal("Classifier response missing message content".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::disabled_classifier_config;

    #[test]
    fn test_classification_deserialize() {
        let json = r#"{"suggested_category": "billing", "suggested_priority": "high"}"#;

        let data: TicketClassification = serde_json::from_str(json).unwrap();
        assert_eq!(data.suggested_category, TicketCategory::Billing);
        assert_eq!(data.suggested_priority, TicketPriority::High);
        assert!(data.is_success());
    }

    #[test]
    fn test_parse_with_fallback_markdown_code_block() {
        let input = r#"Sure, here is the classification:

```json
{
    "suggested_category": "technical",
    "suggested_priority": "critical"
}
```"#;

        let result: TicketClassification = parse_with_fallback(input);

        assert!(result.is_success());
        assert_eq!(result.suggested_category, TicketCategory::Technical);
        assert_eq!(result.suggested_priority, TicketPriority::Critical);
    }

    #[test]
    fn test_parse_with_fallback_invalid_marks_failure() {
        let result: TicketClassification = parse_with_fallback("I cannot classify this ticket.");

        assert!(!result.is_success());
        assert!(result.llm_error_message.is_some());
    }

    #[test]
    fn test_json_schema_string_skips_internal_fields() {
        let schema = TicketClassification::json_schema_string();

        assert!(schema.contains("suggested_category"));
        assert!(schema.contains("suggested_priority"));
        assert!(!schema.contains("is_llm_success"));
        assert!(!schema.contains("llm_error_message"));
    }

    #[tokio::test]
    async fn test_classify_without_credential_is_unavailable() {
        let service = ClassificationService::new(disabled_classifier_config()).unwrap();

        let outcome = service.classify("My invoice is wrong").await;
        assert_eq!(outcome, ClassificationOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_classify_with_unreachable_upstream_is_unavailable() {
        let mut config = disabled_classifier_config();
        config.api_key = Some("test-key".to_string());
        // Unroutable port; the request fails before any network round trip
        config.base_url = "http://127.0.0.1:1".to_string();

        let service = ClassificationService::new(config).unwrap();
        let outcome = service.classify("My invoice is wrong").await;
        assert_eq!(outcome, ClassificationOutcome::Unavailable);
    }

    #[test]
    fn test_build_prompt_contains_description_and_schema() {
        let service = ClassificationService::new(disabled_classifier_config()).unwrap();

        let prompt = service.build_prompt("Cannot reset my password").unwrap();
        assert!(prompt.contains("Cannot reset my password"));
        assert!(prompt.contains("billing, technical, account, general"));
        assert!(prompt.contains("suggested_category"));
        assert!(prompt.contains("suggested_priority"));
    }
}

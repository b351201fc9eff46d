//! Prompt template management using Jinja2 syntax.
//!
//! Templates live under `templates/prompts/` and are loaded once into a
//! process-wide environment on first use.

use minijinja::{Environment, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

/// Template directory relative to the project root
const TEMPLATE_DIR: &str = "templates/prompts";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();

    let template_path = Path::new(TEMPLATE_DIR);
    if let Ok(entries) = std::fs::read_dir(template_path) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "jinja") {
                let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
                    continue;
                };
                if let Ok(content) = std::fs::read_to_string(&path) {
                    // Leak into 'static: templates live for the whole process
                    let static_name: &'static str = Box::leak(name.clone().into_boxed_str());
                    let static_content: &'static str = Box::leak(content.into_boxed_str());
                    if let Err(e) = env.add_template(static_name, static_content) {
                        tracing::warn!("Failed to load template {}: {}", name, e);
                    } else {
                        tracing::debug!("Loaded template: {}", name);
                    }
                }
            }
        }
    }

    env
}

fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Render a template from `templates/prompts/` with the given context.
pub fn render_template(
    template_name: &str,
    ctx: &HashMap<&str, Value>,
) -> Result<String, TemplateError> {
    let env = get_environment();

    let template = env
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    let render_ctx = Value::from_iter(ctx.iter().map(|(k, v)| (*k, v.clone())));

    template
        .render(render_ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}

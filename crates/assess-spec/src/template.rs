use handlebars::Handlebars;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Error raised while piping answers into node text.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template render failed: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Renders node titles and detail text against the answers collected so far,
/// so later screens can reference earlier responses
/// (`"Thanks, {{answers.name}}."`).
pub struct TemplateEngine {
    registry: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        // Unanswered references render as empty rather than erroring.
        registry.set_strict_mode(false);
        Self { registry }
    }

    pub fn render_text(
        &self,
        text: &str,
        answers: &Map<String, Value>,
    ) -> Result<String, TemplateError> {
        if !text.contains("{{") {
            return Ok(text.to_string());
        }
        let ctx = json!({ "answers": answers });
        Ok(self.registry.render_template(text, &ctx)?)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pipes_recorded_answers_into_text() {
        let engine = TemplateEngine::new();
        let mut answers = Map::new();
        answers.insert("name".into(), json!("Ada"));
        let rendered = engine
            .render_text("Thanks, {{answers.name}}.", &answers)
            .expect("render");
        assert_eq!(rendered, "Thanks, Ada.");
    }

    #[test]
    fn plain_text_passes_through_untouched() {
        let engine = TemplateEngine::new();
        let rendered = engine.render_text("No placeholders here.", &Map::new()).expect("render");
        assert_eq!(rendered, "No placeholders here.");
    }

    #[test]
    fn missing_answers_render_empty() {
        let engine = TemplateEngine::new();
        let rendered = engine
            .render_text("Hello {{answers.name}}!", &Map::new())
            .expect("render");
        assert_eq!(rendered, "Hello !");
    }
}

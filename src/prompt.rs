use serde_json::{Map, Value};

use crate::error::CopilotResult;
use crate::host::{CompletionService, SchemaService, TemplateStore};
use crate::template::Template;

/// Builds model prompts from named templates and the host's schema.
pub struct PromptBuilder<'a> {
    schema: &'a dyn SchemaService,
    templates: &'a dyn TemplateStore,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(schema: &'a dyn SchemaService, templates: &'a dyn TemplateStore) -> Self {
        Self { schema, templates }
    }

    /// The default render context: `tables`, `userTable` and `userPrompt`.
    pub fn context(&self, user_prompt: &str) -> CopilotResult<Map<String, Value>> {
        let tables = self.schema.list_tables()?;
        let user_table = self.schema.find_user_table()?;

        let mut context = Map::new();
        context.insert("tables".to_string(), serde_json::to_value(&tables)?);
        context.insert("userTable".to_string(), serde_json::to_value(&user_table)?);
        context.insert("userPrompt".to_string(), Value::from(user_prompt));
        Ok(context)
    }

    /// Read template `name` and render it. Entries of `extra` override the
    /// default context.
    pub fn prompt_from_template(
        &self,
        name: &str,
        user_prompt: &str,
        extra: Map<String, Value>,
    ) -> CopilotResult<String> {
        let mut context = self.context(user_prompt)?;
        context.extend(extra);

        let source = self.templates.read_template(name)?;
        let template = Template::compile(name, &source)?;
        let prompt = template.render(&Value::Object(context));
        log::debug!("rendered prompt '{}' ({} bytes)", name, prompt.len());
        Ok(prompt)
    }
}

pub fn system_prompt(language: &str) -> String {
    format!(
        "You are a helpful code assistant. Your language of choice is {}. \
         Do not include any explanation, just generate the code block itself.",
        language
    )
}

/// Ask the model for code in `language`.
pub fn get_completion(
    service: &dyn CompletionService,
    language: &str,
    prompt: &str,
) -> CopilotResult<String> {
    service.generate(prompt, &system_prompt(language))
}

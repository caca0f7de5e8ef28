/*!
 * Prompt templates for batch document translation.
 *
 * The system prompt carries the translator role and the separator contract;
 * the user prompt repeats the separator instruction right next to the text,
 * which keeps models from merging blocks.
 */

use crate::translation::transport::BATCH_SEPARATOR;

/// System prompt template for document translation.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default system prompt for document translation.
    pub const DOCUMENT_TRANSLATOR: &'static str = r#"You are a professional translator specializing in academic and scientific documents.
Your task is to translate text extracted from documents from {source_language} to {target_language}.

CRITICAL RULES:
1. Translate the text content from {source_language} to {target_language} accurately.
2. Preserve any mathematical formulas, symbols, or special characters exactly as they are.
3. Use punctuation that is natural in {target_language}.
4. Do not add any explanations or notes - output only the translated text.
5. IMPORTANT: The input may contain multiple text blocks separated by "{separator}".
6. You MUST preserve these separators in your output exactly as they appear.
7. Each block should be translated independently but the separators must remain intact.
8. Do not merge blocks or remove separators."#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default document translator template.
    pub fn document_translator() -> Self {
        Self::new(Self::DOCUMENT_TRANSLATOR)
    }

    /// Render the template with the given variables.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
            .replace("{separator}", BATCH_SEPARATOR.trim())
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::document_translator()
    }
}

/// Builder for the system and user prompts of one batch call.
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    source_language: String,
    target_language: String,
    template: PromptTemplate,
}

impl TranslationPromptBuilder {
    /// Create a new prompt builder with the default template.
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            template: PromptTemplate::default(),
        }
    }

    /// Use a custom system prompt template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Build the system prompt.
    pub fn build_system_prompt(&self) -> String {
        self.template.render(&self.source_language, &self.target_language)
    }

    /// Build the user prompt around already joined batch text.
    pub fn build_user_prompt(&self, batch_text: &str) -> String {
        format!(
            "Translate the following text from {} to {}.\n\
             If there are multiple blocks separated by \"{}\", translate each block separately and keep the separators in your output.\n\n{}",
            self.source_language,
            self.target_language,
            BATCH_SEPARATOR.trim(),
            batch_text
        )
    }

    /// Build both system and user prompts.
    pub fn build(&self, batch_text: &str) -> (String, String) {
        (self.build_system_prompt(), self.build_user_prompt(batch_text))
    }
}

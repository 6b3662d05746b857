/*!
 * Instruction prompt for punctuation restoration.
 */

/// System prompt sent with every punctuation request
#[derive(Debug, Clone, PartialEq)]
pub struct PunctuationPrompt {
    /// The template string with an optional `{language}` placeholder
    template: String,
}

impl PunctuationPrompt {
    /// The default instruction prompt
    pub const DEFAULT: &'static str = r#"You restore punctuation in automatically generated {language} captions.

- Insert sentence punctuation (periods, commas, question marks, exclamation marks) into the text you receive
- Do not add, remove, reorder, translate or correct any word
- Keep bracketed markers such as [music] exactly as they are
- Return ONLY the punctuated text, without quotes, notes or explanations"#;

    /// Create a prompt from a template
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// The configured override when set and non-blank, the default otherwise
    pub fn from_override(custom: Option<&str>) -> Self {
        match custom.map(str::trim).filter(|p| !p.is_empty()) {
            Some(prompt) => Self::new(prompt),
            None => Self::default(),
        }
    }

    /// Render the prompt for the caption language
    pub fn render(&self, language: &str) -> String {
        self.template.replace("{language}", language)
    }
}

impl Default for PunctuationPrompt {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

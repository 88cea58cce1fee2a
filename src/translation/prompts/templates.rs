use crate::app_config::ResponseFormat;

/// System prompt template for lyric translation.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// System prompt for the `original,translation` pair contract.
    pub const LYRIC_PAIRS: &'static str = r#"You are a professional song lyric translator working from {source_language} to {target_language}.

## Output Requirements
- Output exactly one line per input line, in the same order
- Each output line is the original line, a comma, then its {target_language} translation
- Do not merge, split, skip or number lines
- Do not add headings, notes or any commentary"#;

    /// System prompt for the JSON array contract.
    pub const LYRIC_JSON_ARRAY: &'static str = r#"You are a professional song lyric translator working from {source_language} to {target_language}.

## Output Requirements
- Return ONLY a JSON array of strings
- The array has exactly one {target_language} translation per input line, in the same order
- Do not merge, split or skip lines
- Do not include any text outside the JSON array"#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Template matching a response format.
    pub fn for_format(format: ResponseFormat) -> Self {
        match format {
            ResponseFormat::Pairs => Self::new(Self::LYRIC_PAIRS),
            ResponseFormat::JsonArray => Self::new(Self::LYRIC_JSON_ARRAY),
        }
    }

    /// Render the template with the given language names.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::for_format(ResponseFormat::default())
    }
}

/// Builder for the (system, user) prompt pair of one translation attempt.
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    source_language: String,
    target_language: String,
    format: ResponseFormat,
    lines: Vec<String>,
}

impl TranslationPromptBuilder {
    /// Create a new prompt builder from language names such as `Japanese`.
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            format: ResponseFormat::default(),
            lines: Vec::new(),
        }
    }

    /// Set the response format.
    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the lyric lines to translate.
    pub fn with_lines(mut self, lines: &[String]) -> Self {
        self.lines = lines.to_vec();
        self
    }

    /// System prompt text.
    pub fn build_system_prompt(&self) -> String {
        PromptTemplate::for_format(self.format).render(&self.source_language, &self.target_language)
    }

    /// User prompt carrying the lyric block.
    pub fn build_user_prompt(&self) -> String {
        let layout = match self.format {
            ResponseFormat::Pairs => "original,translation pairs, one per line",
            ResponseFormat::JsonArray => "a JSON array of strings",
        };

        format!(
            "Translate these {} song lyrics ({} lines) into {}. Answer with {}.\n\n{}",
            self.source_language,
            self.lines.len(),
            self.target_language,
            layout,
            self.lines.join("\n")
        )
    }
}

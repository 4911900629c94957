use crate::error::DefineError;
use std::fmt;

const SYSTEM_MESSAGE: &str = include_str!("prompts/system.txt");
const DEFINITION_TEMPLATE: &str = include_str!("prompts/definition.txt");
const WORD_PLACEHOLDER: &str = "{word}";

/// A trimmed, non-empty query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Word(String);

impl Word {
    pub fn parse(raw: &str) -> Result<Self, DefineError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DefineError::Validation(
                "Word is required and must be a string".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The instruction document sent with every lookup.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system: &'static str,
    user: &'static str,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system: SYSTEM_MESSAGE,
            user: DEFINITION_TEMPLATE,
        }
    }
}

impl PromptTemplate {
    pub fn system_message(&self) -> &str {
        self.system.trim()
    }

    pub fn render(&self, word: &Word) -> String {
        self.user
            .trim_end()
            .replace(WORD_PLACEHOLDER, word.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_is_trimmed() {
        assert_eq!(Word::parse("  cat \n").unwrap().as_str(), "cat");
    }

    #[test]
    fn blank_word_is_rejected() {
        for raw in ["", "   ", "\t\n"] {
            assert!(matches!(Word::parse(raw), Err(DefineError::Validation(_))));
        }
    }

    #[test]
    fn template_embeds_word_everywhere() {
        let prompt = PromptTemplate::default().render(&Word::parse("gravity").unwrap());
        assert!(!prompt.contains(WORD_PLACEHOLDER));
        assert_eq!(prompt.matches("\"gravity\"").count(), 2);
    }

    #[test]
    fn template_requests_the_display_layout() {
        let prompt = PromptTemplate::default().render(&Word::parse("cat").unwrap());
        assert!(prompt.contains("**Examples:**"));
        assert!(prompt.contains("**Synonyms:**"));
        assert!(prompt.contains("**Antonyms:**"));
        assert!(prompt.contains("**Similar words:**"));
        assert!(prompt.contains("IPA"));
    }

    #[test]
    fn system_message_is_single_line() {
        let template = PromptTemplate::default();
        assert!(!template.system_message().contains('\n'));
    }
}

//! Example questions and submission resolution.

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// One user action on the page.
///
/// An event carries either a typed question or the index of a selected
/// example question, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Submission {
    FreeText(String),
    Example(usize),
}

/// The fixed list of canned questions offered as pills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleQuestions {
    questions: Vec<String>,
}

impl ExampleQuestions {
    pub fn new(questions: Vec<String>) -> Self {
        Self { questions }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.questions
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.questions.get(index).map(String::as_str)
    }

    /// Turn a submission into question text.
    ///
    /// Selecting an example yields its literal text, so it behaves exactly
    /// like typing that text. Blank questions are rejected.
    pub fn resolve(&self, submission: &Submission) -> Result<String, ChatError> {
        let question = match submission {
            Submission::FreeText(text) => text.clone(),
            Submission::Example(index) => self
                .get(*index)
                .ok_or(ChatError::UnknownExample(*index))?
                .to_string(),
        };
        if question.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        Ok(question)
    }
}

impl Default for ExampleQuestions {
    fn default() -> Self {
        Self::new(wikichat_core::config::PageConfig::default().examples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_examples_are_the_four_questions() {
        let examples = ExampleQuestions::default();
        assert_eq!(
            examples.as_slice(),
            &[
                "What is Snowflake?",
                "What company did Snowflake announce they would acquire in October 2023?",
                "What company did Snowflake acquire in March 2022?",
                "When did Snowflake IPO?",
            ]
        );
    }

    #[test]
    fn test_example_resolves_to_literal_text() {
        let examples = ExampleQuestions::default();
        let resolved = examples.resolve(&Submission::Example(3)).unwrap();
        assert_eq!(resolved, "When did Snowflake IPO?");
        assert_eq!(
            resolved,
            examples
                .resolve(&Submission::FreeText("When did Snowflake IPO?".to_string()))
                .unwrap()
        );
    }

    #[test]
    fn test_unknown_example() {
        let examples = ExampleQuestions::default();
        assert!(matches!(
            examples.resolve(&Submission::Example(4)),
            Err(ChatError::UnknownExample(4))
        ));
    }

    #[test]
    fn test_blank_free_text_rejected() {
        let examples = ExampleQuestions::default();
        for text in ["", "   ", "\n\t"] {
            assert!(matches!(
                examples.resolve(&Submission::FreeText(text.to_string())),
                Err(ChatError::EmptyMessage)
            ));
        }
    }

    #[test]
    fn test_free_text_is_kept_verbatim() {
        let examples = ExampleQuestions::default();
        let resolved = examples
            .resolve(&Submission::FreeText("  Who is the CEO? ".to_string()))
            .unwrap();
        assert_eq!(resolved, "  Who is the CEO? ");
    }

    #[test]
    fn test_submission_json_shape() {
        let json = serde_json::to_value(Submission::Example(1)).unwrap();
        assert_eq!(json, serde_json::json!({ "example": 1 }));
        let json = serde_json::to_value(Submission::FreeText("hi".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({ "free_text": "hi" }));
    }
}

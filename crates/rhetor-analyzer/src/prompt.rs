//! Request construction and prompt engineering for fallacy detection

use crate::error::InvalidInputError;
use rhetor_domain::{now_millis, AnalysisRequest, CompletionPrompt, FallacyFinding, FallacyKind};

/// Turns raw input text into an analysis request and its prompt
///
/// Pure: no I/O, no state beyond the length limit.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    max_text_length: usize,
}

impl RequestBuilder {
    /// Create a builder enforcing `max_text_length` characters
    pub fn new(max_text_length: usize) -> Self {
        Self { max_text_length }
    }

    /// Configured maximum length (characters)
    pub fn max_text_length(&self) -> usize {
        self.max_text_length
    }

    /// Validate the text and stamp it into a request
    ///
    /// Any non-empty text within the limit is accepted verbatim, whitespace
    /// included.
    pub fn build(&self, text: &str) -> Result<AnalysisRequest, InvalidInputError> {
        if text.is_empty() {
            return Err(InvalidInputError::Empty);
        }

        let len = text.chars().count();
        if len > self.max_text_length {
            return Err(InvalidInputError::TooLong {
                len,
                max: self.max_text_length,
            });
        }

        Ok(AnalysisRequest {
            text: text.to_string(),
            requested_at: now_millis(),
        })
    }

    /// Render the completion prompt for a request
    pub fn prompt(&self, request: &AnalysisRequest) -> CompletionPrompt {
        let mut system = String::new();

        // 1. Role and taxonomy
        system.push_str(DETECTION_INSTRUCTIONS);
        system.push_str("\n\nFallacy types (use these exact names, and no others):\n");
        for kind in FallacyKind::ALL {
            system.push_str(&format!("- {}: {}\n", kind.as_str(), kind.description()));
        }
        system.push('\n');

        // 2. Worked example
        system.push_str(EXAMPLE_ANALYSIS);
        system.push_str("\n\n");

        // 3. Output format
        system.push_str(OUTPUT_FORMAT_REMINDER);

        let mut user = String::new();
        user.push_str("Text to analyze:\n");
        user.push_str("---\n");
        user.push_str(&request.text);
        user.push_str("\n---\n\n");
        user.push_str("Your analysis in JSON format:");

        CompletionPrompt { system, user }
    }
}

/// Render the prompt asking for a friendly explanation of `findings`
///
/// `None` when there is nothing to explain.
pub fn response_prompt(text: &str, findings: &[FallacyFinding]) -> Option<CompletionPrompt> {
    if findings.is_empty() {
        return None;
    }

    let mut user = String::new();
    user.push_str("Write a friendly response explaining these logical fallacies found in a post:\n\n");
    user.push_str(&format!("Post: \"{}\"\n\n", text));
    user.push_str("Fallacies found:\n");
    for finding in findings {
        let explanation: &str = if finding.explanation.is_empty() {
            finding.kind.description()
        } else {
            &finding.explanation
        };
        user.push_str(&format!("- {}: {}\n", finding.kind.label(), explanation));
    }
    user.push('\n');
    user.push_str(RESPONSE_GUIDELINES);

    Some(CompletionPrompt {
        system: RESPONSE_ROLE.to_string(),
        user,
    })
}

const RESPONSE_ROLE: &str = "You are a helpful assistant that explains logical fallacies.";

const RESPONSE_GUIDELINES: &str = r#"Write a response that:
1. Acknowledges their argument
2. Explains the fallacies found
3. Suggests how to make the argument stronger
4. Maintains a helpful and educational tone

Your response:"#;

const DETECTION_INSTRUCTIONS: &str = r#"You are an expert at detecting logical fallacies.
Analyze the text you are given and list ALL logical fallacies you find.

Rules:
- Only report fallacies from the list below; never invent other categories
- Quote the exact words from the text that commit the fallacy
- Explain briefly why the quoted words are fallacious
- Give a confidence between 0.0 and 1.0 for each finding
- List findings in the order they occur in the text
- Return [] ONLY if you are certain there are no fallacies"#;

const EXAMPLE_ANALYSIS: &str = r#"Example:
Text: "Everyone knows that video games cause violence. My neighbor's kid played violent games and got into a fight at school, so that proves it!"
[
  {"type": "bandwagon", "quote": "Everyone knows", "explanation": "Appeals to popular belief rather than evidence", "confidence": 0.95},
  {"type": "anecdotal", "quote": "My neighbor's kid played violent games", "explanation": "Uses one child's case as proof", "confidence": 0.9},
  {"type": "hasty_generalization", "quote": "so that proves it", "explanation": "Draws a general conclusion from a single incident", "confidence": 0.85}
]"#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON array only, no additional text):
[
  {"type": "fallacy_type", "quote": "exact words", "explanation": "why", "confidence": 0.0-1.0}
]

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_prompt_lists_findings() {
        let findings = vec![
            FallacyFinding::new(FallacyKind::Bandwagon, "Everyone knows", "Appeals to popularity"),
            FallacyFinding::new(FallacyKind::Anecdotal, "my neighbor", ""),
        ];
        let prompt = response_prompt("Everyone knows it. Ask my neighbor.", &findings).unwrap();

        assert!(prompt.system.contains("explains logical fallacies"));
        assert!(prompt.user.contains("Post: \"Everyone knows it. Ask my neighbor.\""));
        assert!(prompt.user.contains("- Bandwagon: Appeals to popularity"));
        assert!(prompt.user.contains(&format!("- Anecdotal: {}", FallacyKind::Anecdotal.description())));
        assert!(prompt.user.ends_with("Your response:"));
    }

    #[test]
    fn test_response_prompt_none_without_findings() {
        assert!(response_prompt("Fine text.", &[]).is_none());
    }

    #[test]
    fn test_build_keeps_text_exactly() {
        let builder = RequestBuilder::new(100);
        let request = builder.build("  Everyone knows it.\n").unwrap();
        assert_eq!(request.text, "  Everyone knows it.\n");
        assert!(request.requested_at > 0);
    }

    #[test]
    fn test_build_rejects_empty() {
        let builder = RequestBuilder::new(100);
        assert_eq!(builder.build(""), Err(InvalidInputError::Empty));
    }

    #[test]
    fn test_build_accepts_whitespace_only() {
        let builder = RequestBuilder::new(100);
        assert!(builder.build("   ").is_ok());
    }

    #[test]
    fn test_build_length_limit_in_chars() {
        let builder = RequestBuilder::new(5);
        assert!(builder.build("ééééé").is_ok());
        assert_eq!(
            builder.build("éééééé"),
            Err(InvalidInputError::TooLong { len: 6, max: 5 })
        );
    }

    #[test]
    fn test_prompt_includes_every_kind() {
        let builder = RequestBuilder::new(100);
        let prompt = builder.prompt(&builder.build("Test text").unwrap());
        for kind in FallacyKind::ALL {
            assert!(prompt.system.contains(kind.as_str()), "missing {}", kind);
        }
    }

    #[test]
    fn test_prompt_includes_text() {
        let builder = RequestBuilder::new(100);
        let prompt = builder.prompt(&builder.build("Alice is wrong because she is rude").unwrap());
        assert!(prompt.user.contains("Alice is wrong because she is rude"));
        assert!(!prompt.system.contains("Alice"));
    }

    #[test]
    fn test_prompt_includes_format_instructions() {
        let builder = RequestBuilder::new(100);
        let prompt = builder.prompt(&builder.build("x").unwrap());
        assert!(prompt.system.contains("JSON array"));
        assert!(prompt.system.contains("\"quote\""));
        assert!(prompt.system.contains("Return [] ONLY"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: non-empty text within the limit always builds, unchanged
        #[test]
        fn test_build_never_fails_within_limit(text in "\\PC{1,200}") {
            let builder = RequestBuilder::new(200);
            let request = builder.build(&text).unwrap();
            prop_assert_eq!(request.text, text);
        }

        /// Property: text over the limit is always rejected
        #[test]
        fn test_build_rejects_over_limit(text in "\\PC{51,120}") {
            let builder = RequestBuilder::new(50);
            let rejected = matches!(builder.build(&text), Err(InvalidInputError::TooLong { .. }));
            prop_assert!(rejected);
        }
    }
}

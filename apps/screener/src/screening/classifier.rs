//! Resume classification: pluggable, trait-based screening of a saved attachment.
//!
//! Default: `LlmClassifier` (Gemini structured output via `llm_client`).
//! `AppState` holds an `Arc<dyn Classifier>` so tests can swap in a fake.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::llm_client::{Document, LlmClient, LlmError};
use crate::models::candidate::Verdict;
use crate::screening::criteria::{screening_prompt, verdict_schema, ScreeningRole};

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, path: &Path) -> Result<Verdict, LlmError>;
}

pub struct LlmClassifier {
    llm: LlmClient,
    prompt: String,
    schema: Value,
}

impl LlmClassifier {
    pub fn new(llm: LlmClient, role: ScreeningRole) -> Self {
        Self {
            llm,
            prompt: screening_prompt(role),
            schema: verdict_schema(),
        }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, path: &Path) -> Result<Verdict, LlmError> {
        let bytes = tokio::fs::read(path).await?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        info!(
            "Classifying {} ({}, {} bytes)",
            path.display(),
            mime.essence_str(),
            bytes.len()
        );

        let verdicts: Vec<Verdict> = self
            .llm
            .generate_json(
                &self.prompt,
                Some(Document {
                    mime_type: mime.essence_str(),
                    bytes: &bytes,
                }),
                &self.schema,
            )
            .await?;

        first_verdict(verdicts)
    }
}

/// The endpoint answers with an array; the first element is authoritative.
fn first_verdict(verdicts: Vec<Verdict>) -> Result<Verdict, LlmError> {
    verdicts.into_iter().next().ok_or(LlmError::EmptyContent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_verdict_of_many() {
        let json = r#"[
            {"qualified": true, "name": "Ada", "currentRole": "Intern",
             "summary": "s", "experience": ["Intern @ Lab (2024-Present)"], "skills": "Rust"},
            {"qualified": false, "name": "Other", "currentRole": "x",
             "summary": "s", "experience": [], "skills": ""}
        ]"#;
        let verdicts: Vec<Verdict> = serde_json::from_str(json).unwrap();
        let verdict = first_verdict(verdicts).unwrap();
        assert!(verdict.qualified);
        assert_eq!(verdict.name, "Ada");
    }

    #[test]
    fn test_empty_array_is_an_error() {
        assert!(matches!(first_verdict(vec![]), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_mime_guess_for_allowed_extensions() {
        let essence = |name: &str| {
            mime_guess::from_path(name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        };
        assert_eq!(essence("m1-cv.pdf"), "application/pdf");
        assert_eq!(essence("m1-cv.txt"), "text/plain");
        assert_eq!(essence("m1-cv.doc"), "application/msword");
    }
}

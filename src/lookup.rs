// One-shot `define` command: JSON request in, JSON response out.

use crate::error::DefineError;
use crate::openai::OpenAIClient;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DefineResponse {
    Definition { definition: String },
    Error { error: String, status: u16 },
}

impl From<Result<String, DefineError>> for DefineResponse {
    fn from(outcome: Result<String, DefineError>) -> Self {
        match outcome {
            Ok(definition) => DefineResponse::Definition { definition },
            Err(e) => DefineResponse::Error {
                error: e.to_string(),
                status: e.status(),
            },
        }
    }
}

impl DefineResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, DefineResponse::Definition { .. })
    }
}

/// Pulls the word out of a `{"word": ...}` request body.
pub fn word_from_request(body: &str) -> Result<String, DefineError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| DefineError::Validation(format!("Request body is not JSON: {}", e)))?;

    match value.get("word") {
        Some(Value::String(word)) if !word.trim().is_empty() => Ok(word.clone()),
        _ => Err(DefineError::Validation(
            "Word is required and must be a string".to_string(),
        )),
    }
}

pub async fn run(client: &OpenAIClient, request: Result<String, DefineError>) -> DefineResponse {
    let outcome = match request {
        Ok(word) => client.define(&word).await,
        Err(e) => Err(e),
    };
    DefineResponse::from(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiConfig;

    #[test]
    fn request_word_must_be_a_string() {
        assert_eq!(word_from_request(r#"{"word": "cat"}"#).unwrap(), "cat");
        for body in [r#"{"word": 3}"#, r#"{"word": "  "}"#, r#"{}"#, "word=cat"] {
            assert!(matches!(
                word_from_request(body),
                Err(DefineError::Validation(_))
            ));
        }
    }

    #[test]
    fn responses_serialize_to_boundary_shape() {
        let ok = DefineResponse::from(Ok("A pet.".to_string()));
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"definition":"A pet."}"#);
        assert!(ok.is_success());

        let err = DefineResponse::from(Err(DefineError::Auth("401".to_string())));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], 401);
        assert!(json["error"].as_str().unwrap().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn bad_request_skips_the_client() {
        let client = OpenAIClient::new(OpenAiConfig::default()).unwrap();
        let response = run(&client, word_from_request("{}")).await;
        assert!(matches!(response, DefineResponse::Error { status: 400, .. }));

        let response = run(&client, Ok("cat".to_string())).await;
        assert!(matches!(response, DefineResponse::Error { status: 500, .. }));
    }
}

use crate::config::OpenAiConfig;
use crate::error::DefineError;
use crate::prompt::{PromptTemplate, Word};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("jrdict/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAIClient {
    client: Client,
    config: OpenAiConfig,
    template: PromptTemplate,
}

impl OpenAIClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, DefineError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DefineError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            template: PromptTemplate::default(),
        })
    }

    /// Looks up a simplified definition for `word`.
    ///
    /// Validation and missing-credential failures return before any request is sent.
    pub async fn define(&self, word: &str) -> Result<String, DefineError> {
        let word = Word::parse(word)?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| DefineError::Config("OpenAI API key is not configured".to_string()))?;

        let request = self.build_request(&word);
        debug!(word = %word, model = %self.config.model, "Requesting definition");

        let response = self
            .client
            .post(self.config.api_url.clone())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DefineError::Upstream(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(%status, body = %error_text, "OpenAI API returned an error");
            return Err(classify_status(status, &error_text));
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| DefineError::Upstream(format!("Failed to parse response: {}", e)))?;

        extract_definition(openai_response)
    }

    fn build_request(&self, word: &Word) -> OpenAIRequest<'_> {
        OpenAIRequest {
            model: &self.config.model,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: self.template.system_message().to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: self.template.render(word),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

fn classify_status(status: StatusCode, body: &str) -> DefineError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DefineError::Auth(format!("{} {}", status, body))
        }
        _ => DefineError::Upstream(format!("OpenAI API error {}: {}", status, body)),
    }
}

fn extract_definition(response: OpenAIResponse) -> Result<String, DefineError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(DefineError::EmptyResponse)
}

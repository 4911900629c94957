use std::fmt;

/// Text shown in place of a definition whenever a lookup fails.
pub const FALLBACK_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

/// Failures of a single definition lookup.
#[derive(Debug)]
pub enum DefineError {
    /// The requested word was missing, empty or not a string.
    Validation(String),
    /// No credential for the language model is configured.
    Config(String),
    /// The language model rejected the credential.
    Auth(String),
    /// The language model answered without any usable text.
    EmptyResponse,
    /// Transport failures and any other unsuccessful reply.
    Upstream(String),
}

impl DefineError {
    /// HTTP-like status class of the failure.
    pub fn status(&self) -> u16 {
        match self {
            DefineError::Validation(_) => 400,
            DefineError::Auth(_) => 401,
            DefineError::Config(_) | DefineError::EmptyResponse | DefineError::Upstream(_) => 500,
        }
    }

    /// True for failures detected before any request left the process.
    pub fn is_local(&self) -> bool {
        matches!(self, DefineError::Validation(_) | DefineError::Config(_))
    }
}

impl fmt::Display for DefineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefineError::Validation(msg) => write!(f, "Invalid word: {}", msg),
            DefineError::Config(msg) => write!(f, "Configuration error: {}", msg),
            DefineError::Auth(msg) => write!(f, "Invalid API key: {}", msg),
            DefineError::EmptyResponse => write!(f, "Failed to generate definition"),
            DefineError::Upstream(msg) => write!(f, "Language model error: {}", msg),
        }
    }
}

impl std::error::Error for DefineError {}

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_GUEST_LIMIT: u32 = 2;
pub const DEFAULT_RECENT_LIMIT: usize = 10;

const APP_DIR: &str = "jrdict";
const LOG_FILE: &str = "jrdict.log";

#[derive(Parser, Debug)]
#[command(name = "jrdict")]
#[command(version, about = "A simple English-English dictionary for junior high students")]
pub struct Cli {
    #[arg(help = "Word to look up on startup")]
    pub word: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "JRDICT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "JRDICT_API_URL", default_value = DEFAULT_API_URL, value_parser = parse_url)]
    pub api_url: Url,

    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Searches allowed before signing in
    #[arg(long, default_value_t = DEFAULT_GUEST_LIMIT)]
    pub guest_limit: u32,

    /// Number of recent searches to keep
    #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
    pub recent_limit: usize,

    #[arg(long, env = "JRDICT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep all state in memory
    #[arg(long)]
    pub ephemeral: bool,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print one definition as JSON and exit
    Define {
        word: Option<String>,

        /// Read a `{"word": ...}` request body from stdin
        #[arg(long, conflicts_with = "word")]
        stdin: bool,
    },
}

fn parse_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid url '{}': {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: Url,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_url: Url::parse(DEFAULT_API_URL).expect("default api url is valid"),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub guest_searches: u32,
    pub recent_searches: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            guest_searches: DEFAULT_GUEST_LIMIT,
            recent_searches: DEFAULT_RECENT_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub limits: Limits,
    /// `None` keeps persisted state in memory only.
    pub data_dir: Option<PathBuf>,
    pub log_file: PathBuf,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        let api_key = cli
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        let default_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
        let log_file = cli
            .log_file
            .clone()
            .unwrap_or_else(|| default_dir.join(LOG_FILE));

        Self {
            openai: OpenAiConfig {
                api_key,
                model: cli.model.clone(),
                api_url: cli.api_url.clone(),
                max_tokens: cli.max_tokens,
                temperature: cli.temperature,
            },
            limits: Limits {
                guest_searches: cli.guest_limit,
                recent_searches: cli.recent_limit,
            },
            data_dir: if cli.ephemeral { None } else { Some(default_dir) },
            log_file,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["jrdict"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_match_constants() {
        let cli = parse(&["--data-dir", "/tmp/jrdict-test"]);
        let config = Config::from_cli(&cli);
        assert_eq!(config.openai.model, DEFAULT_MODEL);
        assert_eq!(config.openai.api_url.as_str(), DEFAULT_API_URL);
        assert_eq!(config.openai.max_tokens, 300);
        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/jrdict-test")));
        assert_eq!(config.log_file, PathBuf::from("/tmp/jrdict-test/jrdict.log"));
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let cli = parse(&["--api-key", "   "]);
        assert!(Config::from_cli(&cli).openai.api_key.is_none());
    }

    #[test]
    fn ephemeral_drops_data_dir() {
        let cli = parse(&["--ephemeral"]);
        assert!(Config::from_cli(&cli).data_dir.is_none());
    }

    #[test]
    fn rejects_non_http_api_url() {
        let argv = ["jrdict", "--api-url", "ftp://example.com/v1"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn define_subcommand_takes_word_or_stdin() {
        let cli = parse(&["define", "cat"]);
        assert!(matches!(
            cli.command,
            Some(Command::Define { word: Some(ref w), stdin: false }) if w == "cat"
        ));

        let cli = parse(&["define", "--stdin"]);
        assert!(matches!(cli.command, Some(Command::Define { word: None, stdin: true })));
    }

    #[test]
    fn startup_word_is_positional() {
        let cli = parse(&["apple", "--guest-limit", "5"]);
        assert_eq!(cli.word.as_deref(), Some("apple"));
        assert_eq!(Config::from_cli(&cli).limits.guest_searches, 5);
    }
}

// src/config.rs
use crate::cli::args::Args;
use crate::error::{ChatError, Result};
use anyhow::Context;
use chrono::{DateTime, Local, TimeZone};
use clap::ValueEnum;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::{env, fmt, fs};
use tracing::{debug, warn};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo-instruct";
pub const DEFAULT_MEMORY: usize = 3000;

const DATA_DIR_NAME: &str = ".ai";
const CONTEXT_FILE: &str = "context.txt";
const LOG_DIR_NAME: &str = "log";
const HISTORY_FILE: &str = "history.txt";
const CONTEXT_TIME_FORMAT: &str = "%a, %b %d %Y %I:%M %p %Z";

/// Which request shape the session sends to the completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PromptStyle {
    /// Role-tagged message list against `/chat/completions`.
    #[default]
    Chat,
    /// Flat prompt with a trimmed history window against `/completions`.
    Completion,
}

impl PromptStyle {
    pub fn get_style_name(&self) -> &str {
        match self {
            PromptStyle::Chat => "chat",
            PromptStyle::Completion => "completion",
        }
    }

    pub fn default_model(&self) -> &str {
        match self {
            PromptStyle::Chat => DEFAULT_CHAT_MODEL,
            PromptStyle::Completion => DEFAULT_COMPLETION_MODEL,
        }
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get_style_name())
    }
}

/// Sampling parameters sent with every request.
///
/// The value is never mutated in place; the `with_*` methods return a copy
/// with one field replaced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestParams {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub n: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub logit_bias: HashMap<String, f32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl Default for RequestParams {
    fn default() -> Self {
        RequestParams {
            model: DEFAULT_CHAT_MODEL.to_string(),
            max_tokens: 1000,
            temperature: Some(1.0),
            top_p: None,
            n: 1,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            logit_bias: HashMap::new(),
            user: String::new(),
            stop: Vec::new(),
        }
    }
}

impl RequestParams {
    pub fn with_model(self, model: impl Into<String>) -> Self {
        Self { model: model.into(), ..self }
    }

    pub fn with_max_tokens(self, max_tokens: u32) -> Self {
        Self { max_tokens, ..self }
    }

    pub fn with_temperature(self, temperature: Option<f32>) -> Self {
        Self { temperature, ..self }
    }

    pub fn with_top_p(self, top_p: Option<f32>) -> Self {
        Self { top_p, ..self }
    }

    pub fn with_stop(self, stop: Vec<String>) -> Self {
        Self { stop, ..self }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base_url: String,
    pub style: PromptStyle,
    /// Trailing characters of the rendered log included in a completion prompt.
    pub memory: usize,
    pub context: String,
    pub params: RequestParams,
    pub data_dir: PathBuf,
}

impl Config {
    /// Gather environment inputs (`.env` is already loaded by `main`).
    pub fn load(args: &Args) -> Result<Self> {
        let api_key = env::var(API_KEY_VAR).ok().filter(|key| !key.trim().is_empty());
        let base_url = env::var(BASE_URL_VAR).ok();
        let data_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DATA_DIR_NAME);

        Self::build(args, api_key, base_url, data_dir, Local::now())
    }

    /// Assemble a config from already-resolved environment inputs.
    pub fn build(
        args: &Args,
        api_key: Option<String>,
        base_url: Option<String>,
        data_dir: PathBuf,
        now: DateTime<Local>,
    ) -> Result<Self> {
        let api_key = api_key.ok_or(ChatError::MissingApiKey(API_KEY_VAR))?;

        let context_path = args
            .context
            .clone()
            .unwrap_or_else(|| data_dir.join(CONTEXT_FILE));
        let context = load_context(&context_path, now)?;

        let model = args
            .model
            .clone()
            .unwrap_or_else(|| args.style.default_model().to_string());
        let defaults = RequestParams::default();
        let params = defaults
            .clone()
            .with_model(model)
            .with_max_tokens(args.max_tokens.unwrap_or(defaults.max_tokens))
            .with_temperature(args.temperature.or(defaults.temperature))
            .with_top_p(args.top_p.or(defaults.top_p))
            .with_stop(args.stop.clone());

        let config = Config {
            api_key,
            api_base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            style: args.style,
            memory: args.memory,
            context,
            params,
            data_dir,
        };
        debug!(
            style = %config.style,
            model = %config.params.model,
            memory = config.memory,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(HISTORY_FILE)
    }
}

/// Build the context preamble: a current-time header followed by the
/// trimmed contents of `path`, if that file exists.
///
/// The zone is written as a numeric UTC offset (`+09:00`).
pub fn load_context<Tz>(path: &Path, now: DateTime<Tz>) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut context = format!("Current time: {}\n\n", now.format(CONTEXT_TIME_FORMAT));

    if path.exists() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read context file {}", path.display()))?;
        context.push_str(text.trim());
    } else {
        warn!("Context file {} not found, using time header only", path.display());
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn parse(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("ai").chain(argv.iter().copied()))
    }

    #[test]
    fn params_derive_copies_with_one_field_changed() {
        let base = RequestParams::default();
        let tuned = base.clone().with_max_tokens(64);

        assert_eq!(base.max_tokens, 1000);
        assert_eq!(tuned.max_tokens, 64);
        assert_eq!(tuned.model, base.model);
        assert_eq!(tuned.temperature, base.temperature);
    }

    #[test]
    fn params_serialize_skips_unset_fields() {
        let json = serde_json::to_value(RequestParams::default()).unwrap();

        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["max_tokens"], 1000);
        assert!(json.get("top_p").is_none());
        assert!(json.get("stop").is_none());
        assert!(json.get("user").is_none());
        assert!(json.get("logit_bias").is_none());
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = Config::build(&parse(&[]), None, None, dir.path().to_path_buf(), Local::now())
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ChatError>(),
            Some(ChatError::MissingApiKey(API_KEY_VAR))
        ));
    }

    #[test]
    fn flags_override_defaults() {
        let dir = TempDir::new().unwrap();
        let args = parse(&["-m", "gpt-4o", "-M", "250", "-t", "0.2", "--memory", "42"]);
        let config = Config::build(
            &args,
            Some("sk-test".to_string()),
            Some("http://localhost:8080/v1".to_string()),
            dir.path().to_path_buf(),
            Local::now(),
        )
        .unwrap();

        assert_eq!(config.params.model, "gpt-4o");
        assert_eq!(config.params.max_tokens, 250);
        assert_eq!(config.params.temperature, Some(0.2));
        assert_eq!(config.memory, 42);
        assert_eq!(config.api_base_url, "http://localhost:8080/v1");
        assert_eq!(config.log_dir(), dir.path().join("log"));
    }

    #[test]
    fn completion_style_picks_completion_model() {
        let dir = TempDir::new().unwrap();
        let config = Config::build(
            &parse(&["--style", "completion"]),
            Some("sk-test".to_string()),
            None,
            dir.path().to_path_buf(),
            Local::now(),
        )
        .unwrap();

        assert_eq!(config.style, PromptStyle::Completion);
        assert_eq!(config.params.model, DEFAULT_COMPLETION_MODEL);
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn context_appends_file_after_time_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.txt");
        fs::write(&path, "  You are a bot.\n\n").unwrap();

        let context = load_context(&path, Local::now()).unwrap();

        assert!(context.starts_with("Current time: "));
        assert!(context.ends_with("\n\nYou are a bot."));
    }

    #[test]
    fn time_header_uses_numeric_offset() {
        let dir = TempDir::new().unwrap();
        let tokyo = chrono::FixedOffset::east_opt(9 * 3600).unwrap();
        let now = tokyo.with_ymd_and_hms(2026, 10, 16, 13, 11, 0).unwrap();

        let context = load_context(&dir.path().join("absent.txt"), now).unwrap();

        assert_eq!(context, "Current time: Fri, Oct 16 2026 01:11 PM +09:00\n\n");
    }

    #[test]
    fn missing_context_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let context = load_context(&dir.path().join("absent.txt"), Local::now()).unwrap();

        assert!(context.starts_with("Current time: "));
        assert!(context.ends_with("\n\n"));
    }
}

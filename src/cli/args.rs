// src/cli/args.rs
use crate::config::{PromptStyle, DEFAULT_MEMORY};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ai",
    version,
    about = "Chat with an OpenAI-compatible model from the terminal"
)]
pub struct Args {
    /// Model identifier (defaults depend on --style)
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Maximum tokens generated per response
    #[arg(short = 'M', long = "max-tokens", alias = "max_tokens")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(short = 't', long)]
    pub temperature: Option<f32>,

    /// Nucleus sampling probability mass
    #[arg(short = 'p', long = "top-p")]
    pub top_p: Option<f32>,

    /// Stop sequence (repeatable)
    #[arg(long, value_name = "SEQ")]
    pub stop: Vec<String>,

    /// Request shape sent to the service
    #[arg(short = 's', long, value_enum, default_value_t = PromptStyle::Chat)]
    pub style: PromptStyle,

    /// Trailing characters of history included in completion-style prompts
    #[arg(long, default_value_t = DEFAULT_MEMORY)]
    pub memory: usize,

    /// Context file to read instead of ~/.ai/context.txt
    #[arg(long, value_name = "PATH")]
    pub context: Option<PathBuf>,
}

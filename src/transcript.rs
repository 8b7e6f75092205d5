// src/transcript.rs
//
// In-memory conversation history owned by the chat session.

use crate::error::Result;
use anyhow::Context;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const USER_MARKER: &str = ">>> ";
const TURN_SEPARATOR: &str = "\n\n";
const LOG_FILE_FORMAT: &str = "%Y%m%d%H%M%S";
const LOG_FILE_EXT: &str = "jsonl";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// One finished exchange: the user's line and the model's full response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub prompt: String,
    pub completion: String,
}

impl Turn {
    pub fn new(prompt: impl Into<String>, completion: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), completion: completion.into() }
    }

    pub fn messages(&self) -> [ChatMessage; 2] {
        [
            ChatMessage::new(Role::User, self.prompt.as_str()),
            ChatMessage::new(Role::Assistant, self.completion.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub count: usize,
    pub char_length: usize,
    pub byte_length: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    context: String,
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new(context: impl Into<String>) -> Self {
        Self { context: context.into(), turns: Vec::new() }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn remove_last_turn(&mut self) {
        self.turns.pop();
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Chat-style view of every turn, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.turns.iter().flat_map(Turn::messages).collect()
    }

    pub fn render_log(&self) -> String {
        let mut log = String::new();
        for turn in &self.turns {
            log.push_str(USER_MARKER);
            log.push_str(turn.prompt.trim());
            log.push_str(TURN_SEPARATOR);
            log.push_str(turn.completion.trim());
            log.push_str(TURN_SEPARATOR);
        }
        log.trim().to_string()
    }

    pub fn stats(&self) -> Stats {
        let log = self.render_log();
        Stats {
            count: self.turns.len(),
            char_length: log.chars().count(),
            byte_length: log.len(),
        }
    }

    /// Write the transcript as JSON Lines under `log_dir`: a system record
    /// holding the context, then one record per message.
    pub fn persist(&self, log_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

        let file_name = format!("{}.{}", Local::now().format(LOG_FILE_FORMAT), LOG_FILE_EXT);
        let path = log_dir.join(file_name);

        let records = std::iter::once(ChatMessage::new(Role::System, self.context.as_str()))
            .chain(self.messages())
            .map(|message| serde_json::to_string(&message))
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to serialize transcript")?;
        debug!(records = records.len(), "Serialized transcript");

        fs::write(&path, records.join("\n"))
            .with_context(|| format!("Failed to write log file {}", path.display()))?;
        info!("Saved transcript to {}", path.display());
        Ok(path)
    }
}

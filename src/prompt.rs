// src/prompt.rs
//
// Request payload assembly for both prompt styles.

use crate::config::PromptStyle;
use crate::transcript::{ChatMessage, Role, Transcript};

const SECTION_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPayload {
    Prompt(String),
    Messages(Vec<ChatMessage>),
}

impl PromptStyle {
    pub fn build_payload(&self, transcript: &Transcript, memory: usize, line: &str) -> RequestPayload {
        match self {
            PromptStyle::Chat => RequestPayload::Messages(build_messages(transcript, line)),
            PromptStyle::Completion => RequestPayload::Prompt(build_prompt(
                transcript.context(),
                &transcript.render_log(),
                memory,
                line,
            )),
        }
    }
}

/// Flat completion prompt: context, the last `memory` characters of the log,
/// then the new line.
///
/// The history cut is a raw character count from the end and may land in the
/// middle of a turn.
pub fn build_prompt(context: &str, log: &str, memory: usize, line: &str) -> String {
    let mut prompt = String::new();

    let context = context.trim();
    if !context.is_empty() {
        prompt.push_str(context);
        prompt.push_str(SECTION_SEPARATOR);
    }

    let history = tail_chars(log, memory);
    if !history.is_empty() {
        prompt.push_str(history);
        prompt.push_str(SECTION_SEPARATOR);
    }

    prompt.push('\n');
    prompt.push_str(line);
    prompt.push('\n');
    prompt
}

/// Chat message list: system context, every recorded turn, then the new line.
pub fn build_messages(transcript: &Transcript, line: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(transcript.turns().len() * 2 + 2);

    let context = transcript.context().trim();
    if !context.is_empty() {
        messages.push(ChatMessage::new(Role::System, context));
    }
    messages.extend(transcript.messages());
    messages.push(ChatMessage::new(Role::User, line));
    messages
}

/// The trailing `n` characters of `s` (all of it when shorter).
pub fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Turn;

    #[test]
    fn first_turn_has_no_history_section() {
        let prompt = build_prompt("You are a bot.", "", 3000, "Hi");
        assert_eq!(prompt, "You are a bot.\n\n\nHi\n");
    }

    #[test]
    fn blank_context_is_omitted() {
        assert_eq!(build_prompt("  \n", "", 3000, "Hi"), "\nHi\n");
    }

    #[test]
    fn history_section_is_trailing_window() {
        let log = ">>> Hi\n\nHello there";
        for memory in [0, 1, 5, log.len(), log.len() + 10] {
            let prompt = build_prompt("", log, memory, "next");
            let take = memory.min(log.chars().count());
            let expected_history = &log[log.len() - take..];

            if take == 0 {
                assert_eq!(prompt, "\nnext\n");
            } else {
                assert_eq!(prompt, format!("{expected_history}\n\n\nnext\n"));
            }
        }
    }

    #[test]
    fn tail_chars_counts_characters_not_bytes() {
        let log = "héllo wörld";
        assert_eq!(tail_chars(log, 5), "wörld");
        assert_eq!(tail_chars(log, 100), log);
        assert_eq!(tail_chars(log, 0), "");
        assert_eq!(tail_chars("", 3), "");
    }

    #[test]
    fn completion_style_uses_rendered_log() {
        let mut transcript = Transcript::new("You are a bot.");
        transcript.append(Turn::new("Hi", "Hello!"));

        let payload = PromptStyle::Completion.build_payload(&transcript, 6, "Bye");

        assert_eq!(
            payload,
            RequestPayload::Prompt("You are a bot.\n\nHello!\n\n\nBye\n".to_string())
        );
    }

    #[test]
    fn chat_style_lists_context_history_and_new_line() {
        let mut transcript = Transcript::new("  You are a bot.\n");
        transcript.append(Turn::new("Hi", "Hello!"));

        let payload = PromptStyle::Chat.build_payload(&transcript, 0, "Bye");

        assert_eq!(
            payload,
            RequestPayload::Messages(vec![
                ChatMessage::new(Role::System, "You are a bot."),
                ChatMessage::new(Role::User, "Hi"),
                ChatMessage::new(Role::Assistant, "Hello!"),
                ChatMessage::new(Role::User, "Bye"),
            ])
        );
        // The new line is sent but not recorded until its response completes.
        assert_eq!(transcript.turns().len(), 1);
    }
}

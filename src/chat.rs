// src/chat.rs

use crate::config::{Config, PromptStyle, RequestParams};
use crate::error::Result;
use crate::llm::stream::render_stream;
use crate::llm::CompletionService;
use crate::transcript::{Transcript, Turn};
use std::io::Write;
use tracing::{debug, info};

/// One conversation: the transcript plus everything needed to extend it.
pub struct ChatSession<S> {
    service: S,
    style: PromptStyle,
    memory: usize,
    params: RequestParams,
    transcript: Transcript,
}

impl<S: CompletionService> ChatSession<S> {
    pub fn new(service: S, config: &Config) -> Self {
        Self {
            service,
            style: config.style,
            memory: config.memory,
            params: config.params.clone(),
            transcript: Transcript::new(config.context.as_str()),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    pub fn style(&self) -> PromptStyle {
        self.style
    }

    /// Send `line`, stream the reply into `out`, and record the turn.
    ///
    /// The turn is appended only once the stream has finished; on any error
    /// the transcript is left untouched and the partial reply is dropped.
    pub async fn send<W: Write>(&mut self, line: &str, out: &mut W) -> Result<()> {
        let payload = self.style.build_payload(&self.transcript, self.memory, line);
        debug!(style = %self.style, turns = self.transcript.turns().len(), "Built request payload");

        let fragments = self.service.stream(&payload, &self.params).await?;
        let completion = render_stream(fragments, out).await?;

        info!(chars = completion.chars().count(), "Response complete");
        self.transcript.append(Turn::new(line, completion));
        Ok(())
    }
}

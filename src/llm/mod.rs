// src/llm/mod.rs
pub mod openai;
pub mod stream;

use crate::config::RequestParams;
use crate::error::Result;
use crate::prompt::RequestPayload;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Incremental text deltas of one response, ending when the service is done.
pub type FragmentStream = BoxStream<'static, Result<String>>;

#[async_trait]
pub trait CompletionService {
    async fn stream(&self, payload: &RequestPayload, params: &RequestParams) -> Result<FragmentStream>;
}

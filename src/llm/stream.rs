// src/llm/stream.rs

use crate::error::Result;
use anyhow::Context;
use futures::{Stream, StreamExt};
use std::io::Write;

/// Write fragments to `out` as they arrive and return the full response.
///
/// Whitespace-only fragments before the first visible text are dropped. The
/// returned text is trimmed; an error fragment aborts and is returned as is.
pub async fn render_stream<S, W>(mut fragments: S, out: &mut W) -> Result<String>
where
    S: Stream<Item = Result<String>> + Unpin,
    W: Write,
{
    let mut buf = String::new();

    while let Some(fragment) = fragments.next().await {
        let fragment = fragment?;
        if fragment.is_empty() || (buf.is_empty() && fragment.trim().is_empty()) {
            continue;
        }
        out.write_all(fragment.as_bytes())
            .context("Failed to write response fragment")?;
        out.flush().context("Failed to flush stdout")?;
        buf.push_str(&fragment);
    }

    Ok(buf.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use futures::stream;

    fn fragments(parts: &[&str]) -> impl Stream<Item = Result<String>> + Unpin {
        stream::iter(parts.iter().map(|p| Ok(p.to_string())).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn leading_whitespace_fragments_are_suppressed() {
        let mut out = Vec::new();
        let text = render_stream(fragments(&["", "  \n", "Hello", " world"]), &mut out)
            .await
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Hello world");
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn internal_whitespace_is_kept_and_result_trimmed() {
        let mut out = Vec::new();
        let text = render_stream(fragments(&["A", "\n\n", "B", "  \n"]), &mut out)
            .await
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "A\n\nB  \n");
        assert_eq!(text, "A\n\nB");
    }

    #[tokio::test]
    async fn empty_stream_yields_empty_text() {
        let mut out = Vec::new();
        let text = render_stream(fragments(&[]), &mut out).await.unwrap();

        assert!(out.is_empty());
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn error_fragment_aborts() {
        let parts = vec![Ok("partial".to_string()), Err(anyhow!("connection reset"))];
        let mut out = Vec::new();

        let err = render_stream(stream::iter(parts), &mut out).await.unwrap_err();

        assert_eq!(err.to_string(), "connection reset");
        assert_eq!(String::from_utf8(out).unwrap(), "partial");
    }
}

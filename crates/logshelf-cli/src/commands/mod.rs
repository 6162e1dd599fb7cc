pub mod export;
pub mod patterns;
pub mod redact;
pub mod scan;

use anyhow::Result;
use logshelf_config::Config;
use logshelf_engine::{DebugSink, RedactionPipeline};
use logshelf_security::{Redactor, Stats};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// How a command copies file contents.
#[derive(Clone)]
pub struct RedactOptions {
    /// `None` copies bytes through untouched.
    pipeline: Option<RedactionPipeline>,
    debug: bool,
}

impl RedactOptions {
    /// Always redact, whatever the config says.
    pub fn redacting(max_line_bytes: usize, debug: bool) -> Self {
        let pipeline = RedactionPipeline::new(Arc::new(Redactor::builtin()))
            .with_max_line_bytes(max_line_bytes);
        Self {
            pipeline: Some(pipeline),
            debug,
        }
    }

    pub fn passthrough() -> Self {
        Self {
            pipeline: None,
            debug: false,
        }
    }

    /// Combine `[redaction]` settings with the `--no-redact` and `--debug` flags.
    pub fn from_config(config: &Config, no_redact: bool, debug: bool) -> Self {
        if no_redact || !config.redaction.enabled {
            return Self::passthrough();
        }
        Self::redacting(
            config.redaction.max_line_bytes,
            debug || config.redaction.debug,
        )
    }

    pub fn is_redacting(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Copy `source` into `sink`. Stats are `None` when redaction is off.
    pub async fn copy<R, W>(&self, mut source: R, sink: &mut W) -> Result<Option<Stats>>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin,
    {
        let Some(pipeline) = &self.pipeline else {
            tokio::io::copy(&mut source, sink).await?;
            sink.flush().await?;
            return Ok(None);
        };

        let debug_sink = self
            .debug
            .then(|| Box::new(std::io::stderr()) as DebugSink);
        let (mut stream, handle) = pipeline.stream_with_stats_debug(source, debug_sink);
        tokio::io::copy(&mut stream, sink).await?;
        sink.flush().await?;

        Ok(Some(handle.wait().await?))
    }
}

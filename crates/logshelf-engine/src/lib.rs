//! Streaming redaction for logshelf
//!
//! A producer task reads a JSONL source line by line, redacts each line and
//! hands it to a [`RedactedStream`] through a one-slot channel, so memory use
//! stays at about one line regardless of file size or consumer speed.
//!
//! Everything here spawns onto the current tokio runtime.

mod debug;
mod stream;

use std::io;
use std::sync::Arc;

use logshelf_security::{RedactError, Redactor, Result, Stats, Tee};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub use debug::{DebugLog, DebugSink};
pub use stream::{RedactedStream, StatsHandle};

use stream::Chunk;

/// Longest accepted line, separator excluded.
pub const DEFAULT_MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// Lines at least this long are redacted on the blocking pool instead of the
/// producer task.
const BLOCKING_LINE_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct RedactionPipeline {
    redactor: Arc<Redactor>,
    max_line_bytes: usize,
}

impl RedactionPipeline {
    pub fn new(redactor: Arc<Redactor>) -> Self {
        Self {
            redactor,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Fail streams containing a line longer than `max_line_bytes`.
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Redact `source` without collecting stats.
    pub fn stream<R>(&self, source: R) -> RedactedStream
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        self.spawn(source, None).0
    }

    /// Redact `source`; stats arrive on the handle once the stream ends.
    pub fn stream_with_stats<R>(&self, source: R) -> (RedactedStream, StatsHandle)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        self.stream_with_stats_debug(source, None)
    }

    /// Like [`stream_with_stats`](Self::stream_with_stats), also writing
    /// every match to `debug_sink` in clear text.
    pub fn stream_with_stats_debug<R>(
        &self,
        source: R,
        debug_sink: Option<DebugSink>,
    ) -> (RedactedStream, StatsHandle)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        self.spawn(source, debug_sink)
    }

    fn spawn<R>(&self, source: R, debug_sink: Option<DebugSink>) -> (RedactedStream, StatsHandle)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Chunk>(1);
        let (stats_tx, stats_rx) = oneshot::channel();
        let redactor = Arc::clone(&self.redactor);
        let max_line_bytes = self.max_line_bytes;

        tokio::spawn(async move {
            let mut stats = Stats::new();
            let mut debug_log = debug_sink.map(DebugLog::new);

            let result = pump(
                &redactor,
                max_line_bytes,
                source,
                &tx,
                &mut stats,
                &mut debug_log,
            )
            .await;

            match &result {
                Ok(()) => debug!(
                    "Redacted {} lines, {} matches ({} -> {} bytes)",
                    stats.lines_processed,
                    stats.total_matches,
                    stats.original_bytes,
                    stats.redacted_bytes
                ),
                Err(RedactError::ConsumerClosed) => debug!(
                    "Redacted stream dropped after {} lines",
                    stats.lines_processed
                ),
                Err(e) => warn!(
                    "Redaction failed after {} lines: {}",
                    stats.lines_processed, e
                ),
            }

            let _ = stats_tx.send(stats);

            match result {
                Ok(()) | Err(RedactError::ConsumerClosed) => {}
                Err(e) => {
                    let _ = tx.send(Err(into_io_error(e))).await;
                }
            }
        });

        (RedactedStream::new(rx), StatsHandle::new(stats_rx))
    }
}

async fn pump<R>(
    redactor: &Arc<Redactor>,
    max_line_bytes: usize,
    source: R,
    tx: &mpsc::Sender<Chunk>,
    stats: &mut Stats,
    debug_log: &mut Option<DebugLog>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(source);
    // Room for a "\r\n" after a line of exactly the maximum length.
    let limit = max_line_bytes as u64 + 2;
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = (&mut reader)
            .take(limit)
            .read_until(b'\n', &mut line)
            .await?;
        if read == 0 {
            return Ok(());
        }

        if line.ends_with(b"\n") {
            line.pop();
            if line.ends_with(b"\r") {
                line.pop();
            }
        }
        if line.len() > max_line_bytes {
            return Err(RedactError::LineTooLong {
                line: stats.lines_processed + 1,
                limit: max_line_bytes,
            });
        }

        let mut redacted = if line.len() >= BLOCKING_LINE_BYTES {
            let (redacted, found, returned, log) = redact_blocking(
                Arc::clone(redactor),
                std::mem::take(&mut line),
                debug_log.take(),
            )
            .await?;
            line = returned;
            *debug_log = log;
            stats.merge(&found);
            redacted
        } else {
            redact_one(redactor, &line, stats, debug_log.as_mut())?
        };
        stats.record_line(line.len(), redacted.len());
        redacted.push(b'\n');

        tx.send(Ok(redacted))
            .await
            .map_err(|_| RedactError::ConsumerClosed)?;
    }
}

fn redact_one(
    redactor: &Redactor,
    line: &[u8],
    stats: &mut Stats,
    debug_log: Option<&mut DebugLog>,
) -> Result<Vec<u8>> {
    match debug_log {
        Some(log) => redactor.redact_line(line, &mut Tee::new(stats, log)),
        None => redactor.redact_line(line, stats),
    }
}

/// Redact one long line on the blocking pool, handing the buffer and the
/// debug log back along with the matches it found.
async fn redact_blocking(
    redactor: Arc<Redactor>,
    line: Vec<u8>,
    mut debug_log: Option<DebugLog>,
) -> Result<(Vec<u8>, Stats, Vec<u8>, Option<DebugLog>)> {
    tokio::task::spawn_blocking(move || {
        let mut found = Stats::new();
        let redacted = redact_one(&redactor, &line, &mut found, debug_log.as_mut())?;
        Ok((redacted, found, line, debug_log))
    })
    .await
    .map_err(|e| RedactError::Io(io::Error::other(e)))?
}

fn into_io_error(err: RedactError) -> io::Error {
    match err {
        RedactError::Io(e) => e,
        other => io::Error::other(other),
    }
}

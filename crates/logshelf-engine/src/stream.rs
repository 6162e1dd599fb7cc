use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use logshelf_security::{RedactError, Result, Stats};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::{mpsc, oneshot};

/// One redacted line with its separator, or the error that ended the stream.
pub(crate) type Chunk = io::Result<Vec<u8>>;

/// Reading side of a redaction pipeline.
///
/// Yields redacted JSONL as the producer task emits it. A producer failure
/// surfaces as an `io::Error` from the read that would have returned the
/// next line. Dropping the stream stops the producer.
pub struct RedactedStream {
    rx: mpsc::Receiver<Chunk>,
    chunk: Vec<u8>,
    pos: usize,
    done: bool,
}

impl RedactedStream {
    pub(crate) fn new(rx: mpsc::Receiver<Chunk>) -> Self {
        Self {
            rx,
            chunk: Vec::new(),
            pos: 0,
            done: false,
        }
    }
}

impl AsyncRead for RedactedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        loop {
            if this.pos < this.chunk.len() {
                let n = buf.remaining().min(this.chunk.len() - this.pos);
                buf.put_slice(&this.chunk[this.pos..this.pos + n]);
                this.pos += n;
                return Poll::Ready(Ok(()));
            }
            if this.done {
                return Poll::Ready(Ok(()));
            }

            match ready!(this.rx.poll_recv(cx)) {
                Some(Ok(chunk)) => {
                    this.chunk = chunk;
                    this.pos = 0;
                }
                Some(Err(err)) => {
                    this.done = true;
                    return Poll::Ready(Err(err));
                }
                None => {
                    this.done = true;
                    return Poll::Ready(Ok(()));
                }
            }
        }
    }
}

/// Delivers the stats of one stream, once, after its producer finishes.
///
/// Stats are delivered whether or not the stream failed. After a failure
/// they cover only the lines handled before it; the stream's own error is
/// what reports the failure.
pub struct StatsHandle {
    rx: oneshot::Receiver<Stats>,
}

impl StatsHandle {
    pub(crate) fn new(rx: oneshot::Receiver<Stats>) -> Self {
        Self { rx }
    }

    /// Wait for the producer to finish.
    ///
    /// Waiting before the stream is drained can deadlock: the producer only
    /// finishes once its last line has been taken.
    pub async fn wait(self) -> Result<Stats> {
        self.rx.await.map_err(|_| RedactError::StatsUnavailable)
    }
}

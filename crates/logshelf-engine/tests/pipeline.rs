use std::io::{self, Write};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use logshelf_engine::RedactionPipeline;
use logshelf_security::Redactor;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

fn pipeline() -> RedactionPipeline {
    RedactionPipeline::new(Arc::new(Redactor::builtin()))
}

/// Serves `data`, then fails every read.
struct FailingSource {
    data: &'static [u8],
}

impl AsyncRead for FailingSource {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.data;
        if data.is_empty() {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "source went away",
            )));
        }
        let n = buf.remaining().min(data.len());
        buf.put_slice(&data[..n]);
        self.data = &data[n..];
        Poll::Ready(Ok(()))
    }
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_stats_for_mixed_lines() {
    let input = "contact a@b.com\n{\"host\":\"10.0.0.1\"}\nnothing to see\n";
    let (mut stream, handle) = pipeline().stream_with_stats(input.as_bytes());

    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();
    let stats = handle.wait().await.unwrap();

    assert_eq!(stats.lines_processed, 3);
    assert_eq!(stats.total_matches, 2);
    assert_eq!(stats.by_pattern["EMAIL"], 1);
    assert_eq!(stats.by_pattern["IP"], 1);
    assert_eq!(stats.original_bytes, input.len() as u64);
    assert_eq!(stats.redacted_bytes, out.len() as u64);

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("contact <EMAIL-"));
    assert!(lines[1].starts_with("{\"host\":\"<IP-"));
    assert_eq!(lines[2], "nothing to see");
}

#[tokio::test]
async fn test_json_record_stays_valid() {
    let (mut stream, _) = pipeline().stream_with_stats(&b"{\"email\":\"a@b.com\",\"count\":3}\n"[..]);
    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();

    let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
    assert_eq!(value["count"], 3);
    assert!(value["email"].as_str().unwrap().starts_with("<EMAIL-"));
}

#[tokio::test]
async fn test_last_line_without_newline() {
    let input = "first\nlast";
    let (mut stream, handle) = pipeline().stream_with_stats(input.as_bytes());
    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();

    assert_eq!(out, "first\nlast\n");
    let stats = handle.wait().await.unwrap();
    assert_eq!(stats.lines_processed, 2);
    // One separator byte is counted per line, present or not.
    assert_eq!(stats.original_bytes, 11);
}

#[tokio::test]
async fn test_empty_lines_pass_through() {
    let (mut stream, handle) = pipeline().stream_with_stats(&b"\n\nx\n"[..]);
    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();

    assert_eq!(out, "\n\nx\n");
    assert_eq!(handle.wait().await.unwrap().lines_processed, 3);
}

#[tokio::test]
async fn test_empty_source() {
    let (mut stream, handle) = pipeline().stream_with_stats(&b""[..]);
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();

    assert!(out.is_empty());
    let stats = handle.wait().await.unwrap();
    assert_eq!(stats.lines_processed, 0);
    assert_eq!(stats.percent_reduction(), 0.0);
}

#[tokio::test]
async fn test_oversized_line_fails_stream() {
    let mut input = "ok\n".to_string();
    input.push_str(&"x".repeat(100));
    input.push('\n');

    let p = pipeline().with_max_line_bytes(64);
    let (mut stream, handle) = p.stream_with_stats(io::Cursor::new(input.into_bytes()));

    let mut out = Vec::new();
    let err = stream.read_to_end(&mut out).await.unwrap_err();
    assert!(err.to_string().contains("Line 2"), "got {}", err);

    let stats = handle.wait().await.unwrap();
    assert_eq!(stats.lines_processed, 1);
}

#[tokio::test]
async fn test_source_error_propagates() {
    let source = FailingSource {
        data: b"first a@b.com\nsecond",
    };
    let (mut stream, handle) = pipeline().stream_with_stats(source);

    let mut out = Vec::new();
    let err = stream.read_to_end(&mut out).await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);

    let stats = handle.wait().await.unwrap();
    assert_eq!(stats.lines_processed, 1);
    assert_eq!(stats.total_matches, 1);
}

#[tokio::test]
async fn test_dropped_stream_stops_producer() {
    let input: String = (0..1000).map(|i| format!("line {} a@b.com\n", i)).collect();
    let (mut stream, handle) = pipeline().stream_with_stats(io::Cursor::new(input.into_bytes()));

    let mut first = [0u8; 1];
    stream.read_exact(&mut first).await.unwrap();
    drop(stream);

    let stats = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("producer hung after the consumer went away")
        .unwrap();
    // One line taken, one in the channel, one waiting to be sent.
    assert!(stats.lines_processed <= 3, "read ahead {} lines", stats.lines_processed);
}

#[tokio::test]
async fn test_debug_sink_sees_every_match() {
    let debug = SharedBuf::default();
    let (mut stream, handle) = pipeline().stream_with_stats_debug(
        &b"a@b.com and 10.0.0.1\n"[..],
        Some(Box::new(debug.clone())),
    );
    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();
    let stats = handle.wait().await.unwrap();

    let log = String::from_utf8(debug.0.lock().unwrap().clone()).unwrap();
    assert_eq!(log.lines().count(), 2);
    assert!(log.contains("[DEBUG] EMAIL: \"a@b.com\" → \"<EMAIL-"));
    assert!(log.contains("[DEBUG] IP: \"10.0.0.1\" → \"<IP-"));
    assert_eq!(stats.total_matches, 2);
    assert!(!out.contains("a@b.com"));
}

#[tokio::test]
async fn test_file_byte_accounting() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for i in 0..5000 {
        writeln!(file, "{{\"seq\":{},\"user\":\"user{}@example.com\"}}", i, i).unwrap();
    }
    file.flush().unwrap();
    let size = std::fs::metadata(file.path()).unwrap().len();

    let source = tokio::fs::File::open(file.path()).await.unwrap();
    let (mut stream, handle) = pipeline().stream_with_stats(source);

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    let stats = handle.wait().await.unwrap();

    assert_eq!(stats.lines_processed, 5000);
    assert_eq!(stats.original_bytes, size);
    assert_eq!(stats.redacted_bytes, out.len() as u64);
    assert_eq!(stats.by_pattern["EMAIL"], 5000);
    assert_eq!(out.iter().filter(|&&b| b == b'\n').count(), 5000);
}

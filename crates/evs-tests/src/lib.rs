//! Shared support for the evs integration tests and benches.
//!
//! - [`golden`] loads a byte-exact fixture from `tests/golden/`.
//! - [`ChunkedReader`] is an `AsyncRead` that hands out its bytes in
//!   fixed-size pieces and can fail with an injected error once drained,
//!   so tests can place chunk boundaries and I/O failures exactly.
//! - [`decode_all`] / [`render`] turn a stream into a stable textual form
//!   for snapshot assertions.

use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use evs_decoder::{DecodeError, DecoderConfig, Event, EventDecoder};
use tokio::io::{AsyncRead, ReadBuf};

/// Read a fixture from `tests/golden/<name>`.
///
/// # Panics
///
/// Panics if the fixture does not exist.
#[must_use]
pub fn golden(name: &str) -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/golden").join(name);
    std::fs::read(&path)
        .unwrap_or_else(|e| panic!("failed to read golden fixture {}: {e}", path.display()))
}

/// An in-memory source that yields at most `chunk` bytes per read.
#[derive(Debug)]
pub struct ChunkedReader {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
    fail_with: Option<io::ErrorKind>,
}

impl ChunkedReader {
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>, chunk: usize) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            chunk: chunk.max(1),
            fail_with: None,
        }
    }

    /// Fail the first read after all data has been handed out.
    #[must_use]
    pub fn then_fail(mut self, kind: io::ErrorKind) -> Self {
        self.fail_with = Some(kind);
        self
    }
}

impl AsyncRead for ChunkedReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let remaining = &this.data[this.pos..];

        if remaining.is_empty() {
            if let Some(kind) = this.fail_with.take() {
                return Poll::Ready(Err(io::Error::new(kind, "injected read failure")));
            }
            return Poll::Ready(Ok(()));
        }

        let n = remaining.len().min(this.chunk).min(buf.remaining());
        buf.put_slice(&remaining[..n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

/// Decode `source` to the end, collecting events up to the terminal
/// condition. A non-terminal error stops collection and is returned
/// alongside the events decoded before it.
///
/// # Panics
///
/// Panics if the reader task panicked, which `close` reports as
/// [`DecodeError::ReaderPanicked`].
pub async fn decode_all<R>(source: R, config: DecoderConfig) -> (Vec<Event>, Option<DecodeError>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut decoder = EventDecoder::with_config(source, config);
    let mut events = Vec::new();
    let error = loop {
        match decoder.decode().await {
            Ok(event) => events.push(event),
            Err(DecodeError::Eof) => break None,
            Err(e) => break Some(e),
        }
    };
    if let Err(e) = decoder.close().await {
        panic!("decoder close failed: {e}");
    }
    (events, error)
}

/// One line per event: index, type, id, retry, and debug-escaped data.
#[must_use]
pub fn render(events: &[Event]) -> String {
    events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let retry = event
                .retry()
                .map_or_else(|| "-".to_string(), |r| format!("{}ms", r.as_millis()));
            format!(
                "[{i}] type={} id={} retry={retry} data={:?}",
                event.event_type(),
                event.id().unwrap_or("-"),
                event.data(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

//! Lifecycle and cancellation tests for `EventDecoder`.
//!
//! The decoder has one terminal condition, `DecodeError::Eof`, reached
//! either by exhausting the source or by closing. These tests pin down
//! that both paths look identical to the caller, that a close from
//! another OS thread unblocks a `decode` parked on a silent source, and
//! that errors are reported once before the decoder goes inert.

use std::io::{Cursor, ErrorKind};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use evs_decoder::{DecodeError, DecoderConfig, EventDecoder};
use evs_tests::{ChunkedReader, decode_all};
use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf};

/// How long a close may take to unblock a pending decode.
const UNBLOCK_BOUND: Duration = Duration::from_secs(2);

fn source(input: &str) -> Cursor<Vec<u8>> {
    Cursor::new(input.as_bytes().to_vec())
}

/// A source whose first read panics inside the reader task.
struct PanickingReader;

impl AsyncRead for PanickingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        panic!("source exploded");
    }
}

// ── Basic decode ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn decode_single_event() {
    let mut decoder = EventDecoder::new(source("data: test\n\n"));
    let event = decoder.decode().await.expect("first decode should succeed");
    assert_eq!(event.data(), "test");
    decoder.close().await.unwrap();
}

// ── Terminal condition ────────────────────────────────────────────────────────

#[tokio::test]
async fn close_then_decode_returns_eof() {
    let mut decoder = EventDecoder::new(source("data: test\n\n"));
    decoder.close().await.unwrap();

    let err = decoder.decode().await.unwrap_err();
    assert!(err.is_eof(), "expected Eof, got {err:?}");
}

#[tokio::test]
async fn close_from_other_thread_then_decode_returns_eof() {
    let mut decoder = EventDecoder::new(source("data: test\n\n"));
    let handle = decoder.close_handle();

    std::thread::spawn(move || handle.close())
        .join()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let err = decoder.decode().await.unwrap_err();
    assert!(err.is_eof(), "expected Eof, got {err:?}");
}

#[tokio::test]
async fn exhaustion_and_close_are_indistinguishable() {
    let mut exhausted = EventDecoder::new(source("data: test\n\n"));
    exhausted.decode().await.unwrap();
    let natural = exhausted.decode().await.unwrap_err();

    let mut closed = EventDecoder::new(source("data: test\n\n"));
    closed.close_handle().close();
    let cancelled = closed.decode().await.unwrap_err();

    assert!(natural.is_eof());
    assert!(cancelled.is_eof());
    assert_eq!(natural.to_string(), cancelled.to_string());
}

#[tokio::test]
async fn decode_after_termination_does_not_block() {
    let (silent, _peer) = tokio::io::duplex(16);
    let mut decoder = EventDecoder::new(silent);
    decoder.close().await.unwrap();

    for _ in 0..3 {
        let result = tokio::time::timeout(Duration::from_millis(50), decoder.decode()).await;
        assert!(result.expect("terminated decoder must not block").unwrap_err().is_eof());
    }
}

#[tokio::test]
async fn empty_source_is_immediately_eof() {
    let mut decoder = EventDecoder::new(source(""));
    assert!(decoder.decode().await.unwrap_err().is_eof());
}

#[tokio::test]
async fn comment_only_source_is_eof() {
    let mut decoder = EventDecoder::new(source(": hello\n\n: still here\n\n"));
    assert!(decoder.decode().await.unwrap_err().is_eof());
}

// ── Concurrent close ──────────────────────────────────────────────────────────

#[tokio::test]
async fn close_from_os_thread_unblocks_pending_decode() {
    // The peer half stays alive and never writes, so the read never completes
    let (silent, _peer) = tokio::io::duplex(64);
    let mut decoder = EventDecoder::new(silent);
    let handle = decoder.close_handle();

    let closer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        handle.close();
    });

    let result = tokio::time::timeout(UNBLOCK_BOUND, decoder.decode()).await;
    let err = result.expect("decode should unblock after close").unwrap_err();
    assert!(err.is_eof(), "expected Eof, got {err:?}");

    closer.join().unwrap();
    decoder.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_from_task_unblocks_pending_decode_multi_thread() {
    let (silent, _peer) = tokio::io::duplex(64);
    let mut decoder = EventDecoder::new(silent);
    let handle = decoder.close_handle();

    let closer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.close();
    });

    let result = tokio::time::timeout(UNBLOCK_BOUND, decoder.decode()).await;
    assert!(result.expect("decode should unblock").unwrap_err().is_eof());
    closer.await.unwrap();
}

#[tokio::test]
async fn cancellation_is_permanent_even_with_data_pending() {
    let (stream, mut peer) = tokio::io::duplex(1024);
    let mut decoder = EventDecoder::new(stream);

    peer.write_all(b"data: first\n\ndata: second\n\n").await.unwrap();
    assert_eq!(decoder.decode().await.unwrap().data(), "first");

    // "second" is already buffered or in flight, but must never be returned
    decoder.close_handle().close();
    assert!(decoder.decode().await.unwrap_err().is_eof());
    let _ = peer.write_all(b"data: third\n\n").await;
    assert!(decoder.decode().await.unwrap_err().is_eof());
}

#[tokio::test]
async fn close_while_source_idle_between_events() {
    let (silent, mut peer) = tokio::io::duplex(1024);
    let mut decoder = EventDecoder::new(silent);

    peer.write_all(b"data: a\n\ndata: partial").await.unwrap();
    assert_eq!(decoder.decode().await.unwrap().data(), "a");

    // The half-built record must not surface after close
    decoder.close().await.unwrap();
    assert!(decoder.decode().await.unwrap_err().is_eof());
    assert!(decoder.is_closed());
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn io_error_surfaces_once_then_eof() {
    let source = ChunkedReader::new(&b"data: a\n\ndata: partial"[..], 4)
        .then_fail(ErrorKind::ConnectionReset);
    let mut decoder = EventDecoder::new(source);

    assert_eq!(decoder.decode().await.unwrap().data(), "a");
    match decoder.decode().await {
        Err(DecodeError::Io(err)) => assert_eq!(err.kind(), ErrorKind::ConnectionReset),
        other => panic!("expected Io error, got {other:?}"),
    }
    assert!(decoder.decode().await.unwrap_err().is_eof());
    decoder.close().await.unwrap();
}

#[tokio::test]
async fn oversized_event_is_rejected() {
    let config = DecoderConfig::default().with_max_event_bytes(10);
    let mut decoder =
        EventDecoder::with_config(source("data: 12345\ndata: 67890\n\n"), config);

    let err = decoder.decode().await.unwrap_err();
    assert!(
        matches!(err, DecodeError::EventTooLarge { size: 11, limit: 10 }),
        "got {err:?}"
    );
    assert!(decoder.decode().await.unwrap_err().is_eof());
}

#[tokio::test]
async fn events_before_an_error_are_delivered() {
    let config = DecoderConfig::default().with_max_line_bytes(16);
    let input = "data: ok\n\ndata: this line is far too long\n\n";
    let mut decoder = EventDecoder::with_config(source(input), config);

    assert_eq!(decoder.decode().await.unwrap().data(), "ok");
    assert!(matches!(decoder.decode().await, Err(DecodeError::Wire(_))));
}

#[tokio::test]
async fn reader_panic_is_reported_by_close() {
    let mut decoder = EventDecoder::new(PanickingReader);
    assert!(decoder.decode().await.unwrap_err().is_eof());
    assert!(matches!(decoder.close().await, Err(DecodeError::ReaderPanicked)));
    decoder.close().await.unwrap();
}

#[tokio::test]
#[should_panic(expected = "event reader task panicked")]
async fn decode_all_does_not_hide_reader_panic() {
    decode_all(PanickingReader, DecoderConfig::default()).await;
}

// ── Read-ahead ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn small_channel_still_delivers_every_event() {
    let input: String = (0..50).map(|i| format!("id: {i}\ndata: {i}\n\n")).collect();
    let config = DecoderConfig::default().with_channel_capacity(1);
    let mut decoder = EventDecoder::with_config(source(&input), config);

    let mut count = 0;
    while let Some(event) = decoder.next().await {
        assert_eq!(event.unwrap().data(), count.to_string());
        count += 1;
    }
    assert_eq!(count, 50);
    assert_eq!(decoder.last_event_id(), Some("49"));
}

#[tokio::test]
async fn id_only_heartbeat_updates_last_event_id() {
    let mut decoder = EventDecoder::new(source("data: a\n\nid: 7\n\n"));
    assert_eq!(decoder.decode().await.unwrap().data(), "a");
    assert_eq!(decoder.last_event_id(), None);

    assert!(decoder.decode().await.unwrap_err().is_eof());
    assert_eq!(decoder.last_event_id(), Some("7"));
}

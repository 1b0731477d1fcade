use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::event::Event;
use crate::reader::{self, ReadResult, Update};

/// Cancellable server-sent events decoder.
///
/// Wraps any `AsyncRead` byte source (an HTTP response body, a socket,
/// a file, stdin) and yields one [`Event`] per call to
/// [`decode`](Self::decode). The decoder can be closed at any time, from
/// any thread, through a [`CloseHandle`], even while a `decode` is
/// suspended waiting for bytes that may never arrive.
///
/// Termination is observed the same way whatever caused it: source
/// exhaustion and explicit close both surface as [`DecodeError::Eof`],
/// and every call after that returns `Eof` again without touching the
/// source.
///
/// # Lifecycle
///
/// ```text
///        new()          first decode()
///   ──────────▶ Idle ──────────────────▶ Streaming
///                 │                          │
///                 │ close / handle close     │ close / handle close /
///                 │                          │ exhaustion / error
///                 ▼                          ▼
///               Closed ◀─────────────────────┘   (terminal)
/// ```
///
/// Nothing happens at construction: the source is not read and no task
/// is spawned until the first `decode`. While streaming, a background
/// task owns the source and reads ahead (bounded by
/// [`DecoderConfig::channel_capacity`]). [`close`](Self::close) joins
/// that task before returning; [`CloseHandle::close`] only signals it,
/// and the task exits on its own within moments.
///
/// # Example
///
/// ```rust
/// use evs_decoder::EventDecoder;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let source = std::io::Cursor::new(b"data: test\n\n".to_vec());
/// let mut decoder = EventDecoder::new(source);
///
/// let event = decoder.decode().await.unwrap();
/// assert_eq!(event.data(), "test");
///
/// assert!(decoder.decode().await.unwrap_err().is_eof());
/// decoder.close().await.unwrap();
/// # }
/// ```
pub struct EventDecoder<R> {
  state: State<R>,
  task: Option<JoinHandle<()>>,
  token: CancellationToken,
  config: DecoderConfig,
  last_event_id: Option<String>,
}

enum State<R> {
  Idle(R),
  Streaming(mpsc::Receiver<ReadResult>),
  Closed,
}

/// A cloneable, thread-safe handle that closes an [`EventDecoder`].
///
/// Closing through the handle never blocks. A `decode` in flight on
/// another task or thread returns [`DecodeError::Eof`] promptly, without
/// waiting for the source to produce data.
#[derive(Clone, Debug)]
pub struct CloseHandle {
  token: CancellationToken,
}

impl CloseHandle {
  /// Request that the decoder close. Safe to call any number of times.
  pub fn close(&self) {
    if !self.token.is_cancelled() {
      debug!("event decoder close requested");
    }
    self.token.cancel();
  }

  #[must_use]
  pub fn is_closed(&self) -> bool {
    self.token.is_cancelled()
  }
}

impl<R> EventDecoder<R>
where
  R: AsyncRead + Unpin + Send + 'static,
{
  /// Create a decoder over `source` with the default configuration.
  #[must_use]
  pub fn new(source: R) -> Self {
    Self::with_config(source, DecoderConfig::default())
  }

  #[must_use]
  pub fn with_config(source: R, config: DecoderConfig) -> Self {
    Self {
      state: State::Idle(source),
      task: None,
      token: CancellationToken::new(),
      config,
      last_event_id: None,
    }
  }

  /// Decode the next event.
  ///
  /// Suspends until a complete event is available, the source is
  /// exhausted, or the decoder is closed.
  ///
  /// A record still missing its terminating blank line when the source
  /// ends is dispatched as a final event. Browsers' `EventSource` drops
  /// such a record instead. A close, by contrast, always discards the
  /// partial record.
  ///
  /// Records without data produce no event but may still move
  /// [`last_event_id`](Self::last_event_id).
  ///
  /// This method is cancel-safe: dropping the returned future loses no
  /// data, since buffered bytes live in the reader task.
  ///
  /// # Errors
  ///
  /// - [`DecodeError::Eof`] once the stream has ended or the decoder
  ///   was closed. Returned again on every later call.
  /// - [`DecodeError::Io`] if the source failed a read.
  /// - [`DecodeError::Wire`] if a line exceeded `max_line_bytes`.
  /// - [`DecodeError::EventTooLarge`] if an event exceeded
  ///   `max_event_bytes`.
  ///
  /// Each non-`Eof` error is returned once and closes the decoder.
  ///
  /// # Panics
  ///
  /// The first call panics if it is not made from within a Tokio
  /// runtime, because it spawns the reader task.
  pub async fn decode(&mut self) -> Result<Event, DecodeError> {
    if self.token.is_cancelled() {
      self.terminate();
      return Err(DecodeError::Eof);
    }
    if matches!(self.state, State::Idle(_)) {
      self.start();
    }
    loop {
      let State::Streaming(updates) = &mut self.state else {
        return Err(DecodeError::Eof);
      };

      let received = tokio::select! {
        biased;
        () = self.token.cancelled() => None,
        item = updates.recv() => item,
      };

      match received {
        Some(Ok(Update::Event(event))) => {
          trace!(event_type = event.event_type(), bytes = event.data.len(), "event decoded");
          self.last_event_id.clone_from(&event.id);
          return Ok(event);
        }
        Some(Ok(Update::LastEventId(id))) => {
          trace!(id = id.as_deref(), "last event id changed");
          self.last_event_id = id;
        }
        Some(Err(err)) => {
          self.terminate();
          return Err(err);
        }
        None => {
          self.terminate();
          return Err(DecodeError::Eof);
        }
      }
    }
  }

  /// Decode the next event, mapping the terminal condition to `None`.
  ///
  /// ```rust,no_run
  /// # async fn run(mut decoder: evs_decoder::EventDecoder<tokio::io::Stdin>) {
  /// while let Some(event) = decoder.next().await {
  ///     println!("{}", event.unwrap().data());
  /// }
  /// # }
  /// ```
  pub async fn next(&mut self) -> Option<Result<Event, DecodeError>> {
    match self.decode().await {
      Ok(event) => Some(Ok(event)),
      Err(DecodeError::Eof) => None,
      Err(err) => Some(Err(err)),
    }
  }

  fn start(&mut self) {
    let State::Idle(source) = std::mem::replace(&mut self.state, State::Closed) else {
      return;
    };
    let (events, task) = reader::spawn(source, &self.config, self.token.clone());
    self.state = State::Streaming(events);
    self.task = Some(task);
  }
}

impl<R> EventDecoder<R> {
  /// Close the decoder, release the source, and wait for the reader
  /// task to exit.
  ///
  /// Idempotent: later calls return `Ok(())` immediately. Also valid
  /// after the stream ended on its own.
  ///
  /// # Errors
  ///
  /// Returns [`DecodeError::ReaderPanicked`] if the reader task
  /// panicked. The decoder is closed regardless.
  pub async fn close(&mut self) -> Result<(), DecodeError> {
    self.terminate();
    let Some(task) = self.task.take() else {
      return Ok(());
    };

    match task.await {
      Ok(()) => {
        debug!("event decoder closed");
        Ok(())
      }
      Err(err) if err.is_panic() => Err(DecodeError::ReaderPanicked),
      Err(_) => Ok(()),
    }
  }

  /// A handle that can close this decoder from another task or thread.
  #[must_use]
  pub fn close_handle(&self) -> CloseHandle {
    CloseHandle {
      token: self.token.clone(),
    }
  }

  /// Whether the decoder has reached its terminal state, or was asked to.
  #[must_use]
  pub fn is_closed(&self) -> bool {
    matches!(self.state, State::Closed) || self.token.is_cancelled()
  }

  /// The last event id seen so far, for `Last-Event-ID` on reconnect.
  ///
  /// Set by every `id:` field that reaches dispatch, including id-only
  /// records that carry no data. An empty `id:` resets it to `None`.
  #[must_use]
  pub fn last_event_id(&self) -> Option<&str> {
    self.last_event_id.as_deref()
  }

  #[must_use]
  pub fn config(&self) -> &DecoderConfig {
    &self.config
  }

  /// Enter `Closed`, dropping the source or the channel receiver. The
  /// reader task sees the cancelled token and exits.
  fn terminate(&mut self) {
    self.token.cancel();
    self.state = State::Closed;
  }
}

impl<R> Drop for EventDecoder<R> {
  fn drop(&mut self) {
    self.token.cancel();
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

use evs_wire::WireError;

/// Errors returned by [`EventDecoder`](crate::EventDecoder).
///
/// `Eof` is the single terminal condition. It is returned both when the
/// source is exhausted and when the decoder was closed, so a read loop
/// only ever has one thing to check:
///
/// ```text
///   DecodeError
///   ├── Eof                    ← exhausted or closed; no more events, ever
///   ├── Wire(WireError)        ← a line exceeded the configured limit
///   ├── EventTooLarge          ← accumulated data exceeded the limit
///   ├── Io(std::io::Error)     ← the source failed a read
///   └── ReaderPanicked         ← the reader task panicked (close only)
/// ```
///
/// Every variant except `Eof` is reported at most once. The decoder is
/// closed afterwards and further calls return `Eof`.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
  /// End of stream: the source is exhausted or the decoder was closed.
  #[error("end of event stream")]
  Eof,

  /// A line-level limit was violated by the source.
  #[error(transparent)]
  Wire(#[from] WireError),

  /// The `data` of a single event grew past `max_event_bytes`.
  #[error("event data of {size} bytes exceeds limit of {limit}")]
  EventTooLarge { size: usize, limit: usize },

  /// The underlying source returned an I/O error.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// The background reader task panicked.
  ///
  /// Only surfaced by [`EventDecoder::close`](crate::EventDecoder::close),
  /// which is the one place the task is joined.
  #[error("event reader task panicked")]
  ReaderPanicked,
}

impl DecodeError {
  /// Whether this is the terminal end-of-stream condition.
  #[must_use]
  pub fn is_eof(&self) -> bool {
    matches!(self, Self::Eof)
  }
}

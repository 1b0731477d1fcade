use evs_wire::line::DEFAULT_MAX_LINE_BYTES;

/// Configuration for an [`EventDecoder`](crate::EventDecoder).
///
/// ```text
/// ┌──────────────────┬─────────┬──────────────────────────────────────────┐
/// │ Field            │ Default │ Purpose                                  │
/// ├──────────────────┼─────────┼──────────────────────────────────────────┤
/// │ read_buffer_size │ 8 KiB   │ Bytes requested from the source per read │
/// │ max_line_bytes   │ 1 MiB   │ Longest accepted line                    │
/// │ max_event_bytes  │ 16 MiB  │ Largest accepted `data` per event        │
/// │ channel_capacity │ 16      │ Events the reader task may read ahead    │
/// └──────────────────┴─────────┴──────────────────────────────────────────┘
/// ```
///
/// The limits exist so a misbehaving server cannot make the decoder
/// buffer without bound. `channel_capacity` bounds read-ahead: the
/// reader task parks once that many events are waiting to be decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
  pub read_buffer_size: usize,
  pub max_line_bytes: usize,
  pub max_event_bytes: usize,
  pub channel_capacity: usize,
}

impl Default for DecoderConfig {
  fn default() -> Self {
    Self {
      read_buffer_size: 8 * 1024,
      max_line_bytes: DEFAULT_MAX_LINE_BYTES,
      max_event_bytes: 16 * 1024 * 1024,
      channel_capacity: 16,
    }
  }
}

impl DecoderConfig {
  #[must_use]
  pub fn with_read_buffer_size(mut self, size: usize) -> Self {
    self.read_buffer_size = size;
    self
  }

  #[must_use]
  pub fn with_max_line_bytes(mut self, limit: usize) -> Self {
    self.max_line_bytes = limit;
    self
  }

  #[must_use]
  pub fn with_max_event_bytes(mut self, limit: usize) -> Self {
    self.max_event_bytes = limit;
    self
  }

  #[must_use]
  pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
    self.channel_capacity = capacity;
    self
  }

  /// Read buffer size, never zero.
  pub(crate) fn effective_read_buffer_size(&self) -> usize {
    self.read_buffer_size.max(1)
  }

  /// Channel capacity, never zero (tokio rejects a zero-capacity channel).
  pub(crate) fn effective_channel_capacity(&self) -> usize {
    self.channel_capacity.max(1)
  }
}

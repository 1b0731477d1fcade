use std::time::Duration;

use evs_wire::Field;

use crate::error::DecodeError;

/// Event type reported when a record carries no `event:` field.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// A single dispatched server-sent event.
///
/// Events are immutable once dispatched. `data` is the concatenation of
/// every `data:` line in the record joined with `\n`:
///
/// ```text
///   event: update        ┐
///   id: 7                │  Event {
///   data: first          │    event: Some("update"),
///   data: second         │    id:    Some("7"),
///                        ┘    data:  "first\nsecond",
///                             retry: None }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
  pub(crate) data: String,
  pub(crate) event: Option<String>,
  pub(crate) id: Option<String>,
  pub(crate) retry: Option<Duration>,
}

impl Event {
  /// Create an event of the default type carrying `data`.
  pub fn new(data: impl Into<String>) -> Self {
    Self {
      data: data.into(),
      event: None,
      id: None,
      retry: None,
    }
  }

  #[must_use]
  pub fn with_event_type(mut self, event: impl Into<String>) -> Self {
    self.event = Some(event.into());
    self
  }

  #[must_use]
  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.id = Some(id.into());
    self
  }

  #[must_use]
  pub fn with_retry(mut self, retry: Duration) -> Self {
    self.retry = Some(retry);
    self
  }

  #[must_use]
  pub fn data(&self) -> &str {
    &self.data
  }

  /// The event type, `"message"` when the record did not name one.
  #[must_use]
  pub fn event_type(&self) -> &str {
    self.event.as_deref().unwrap_or(DEFAULT_EVENT_TYPE)
  }

  /// The last-event-id in effect when this event was dispatched.
  #[must_use]
  pub fn id(&self) -> Option<&str> {
    self.id.as_deref()
  }

  /// Reconnection delay requested by this record, if any.
  #[must_use]
  pub fn retry(&self) -> Option<Duration> {
    self.retry
  }

  #[must_use]
  pub fn into_data(self) -> String {
    self.data
  }
}

/// Accumulates parsed fields into events.
///
/// The builder holds the record currently being assembled plus the
/// last-event-id buffer, which outlives individual records: an `id:`
/// line applies to its own event and every later one until replaced.
///
/// A blank line dispatches the pending record. Records that never saw a
/// `data:` line are discarded on dispatch rather than producing an
/// empty event.
#[derive(Debug)]
pub struct EventBuilder {
  data: String,
  has_data: bool,
  event: Option<String>,
  retry: Option<Duration>,
  last_event_id: String,
  max_data_bytes: usize,
}

impl EventBuilder {
  #[must_use]
  pub fn new(max_data_bytes: usize) -> Self {
    Self {
      data: String::new(),
      has_data: false,
      event: None,
      retry: None,
      last_event_id: String::new(),
      max_data_bytes,
    }
  }

  /// Fold one field into the pending record.
  ///
  /// Returns `Ok(Some(event))` when the field was a blank line that
  /// completed a record with data.
  ///
  /// # Errors
  ///
  /// Returns [`DecodeError::EventTooLarge`] if appending a `data:` value
  /// would push the record past the configured limit.
  pub fn apply(&mut self, field: Field<'_>) -> Result<Option<Event>, DecodeError> {
    match field {
      Field::Blank => return Ok(self.dispatch()),
      Field::Data(value) => self.push_data(value)?,
      Field::Event(value) => self.event = Some(value.to_owned()),
      // Ids containing NUL are ignored outright
      Field::Id(value) if value.contains('\0') => {}
      Field::Id(value) => value.clone_into(&mut self.last_event_id),
      Field::Retry(Some(millis)) => self.retry = Some(Duration::from_millis(millis)),
      Field::Retry(None) | Field::Comment(_) | Field::Unknown { .. } => {}
    }
    Ok(None)
  }

  /// True when no `data:` line has been seen since the last dispatch.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    !self.has_data
  }

  #[must_use]
  pub fn last_event_id(&self) -> Option<&str> {
    (!self.last_event_id.is_empty()).then_some(self.last_event_id.as_str())
  }

  /// Complete the pending record and reset for the next one.
  ///
  /// Returns `None` (and still resets) when the record has no data.
  pub fn dispatch(&mut self) -> Option<Event> {
    let event = self.event.take();
    let retry = self.retry.take();
    if !std::mem::take(&mut self.has_data) {
      return None;
    }

    Some(Event {
      data: std::mem::take(&mut self.data),
      event,
      id: self.last_event_id().map(str::to_owned),
      retry,
    })
  }

  fn push_data(&mut self, value: &str) -> Result<(), DecodeError> {
    let separator = usize::from(self.has_data);
    let size = self.data.len() + separator + value.len();
    if size > self.max_data_bytes {
      return Err(DecodeError::EventTooLarge {
        size,
        limit: self.max_data_bytes,
      });
    }

    if self.has_data {
      self.data.push('\n');
    }
    self.data.push_str(value);
    self.has_data = true;
    Ok(())
  }
}

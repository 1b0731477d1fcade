use evs_wire::{Field, LineSplitter, parse_line};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::event::{Event, EventBuilder};

pub(crate) type ReadResult = Result<Update, DecodeError>;

/// What the reader task hands to the decoder.
#[derive(Debug)]
pub(crate) enum Update {
  Event(Event),
  /// A record without data changed the last event id. `None` means an
  /// empty `id:` reset it.
  LastEventId(Option<String>),
}

/// Background half of the decoder.
///
/// Owns the source, the line splitter and the event builder. It runs as
/// a spawned task so that a pending source read can be dropped the
/// moment the cancellation token fires, whatever the source is doing.
///
/// ```text
///   source ──read──▶ LineSplitter ──line──▶ EventBuilder ──Event──▶ mpsc ──▶ decode()
///                                                 ▲
///   CancellationToken ─── select! ────────────────┘  (drops the whole pipeline)
/// ```
///
/// The task ends on cancellation, on source exhaustion (dropping the
/// sender, which the decoder sees as end of stream), after forwarding
/// the first error, or when the receiving decoder is gone. In every case
/// the source is dropped together with the task.
struct Reader<R> {
  source: R,
  splitter: LineSplitter,
  builder: EventBuilder,
  /// Last event id the decoder has been told about.
  reported_id: Option<String>,
  read_buffer_size: usize,
}

/// Spawn the reader task for `source`.
///
/// # Panics
///
/// Panics when called outside a Tokio runtime.
pub(crate) fn spawn<R>(
  source: R,
  config: &DecoderConfig,
  token: CancellationToken,
) -> (mpsc::Receiver<ReadResult>, JoinHandle<()>)
where
  R: AsyncRead + Unpin + Send + 'static,
{
  let (tx, rx) = mpsc::channel(config.effective_channel_capacity());
  let reader = Reader {
    source,
    splitter: LineSplitter::new(config.max_line_bytes),
    builder: EventBuilder::new(config.max_event_bytes),
    reported_id: None,
    read_buffer_size: config.effective_read_buffer_size(),
  };
  let task = tokio::spawn(reader.run(tx, token));
  (rx, task)
}

impl<R: AsyncRead + Unpin> Reader<R> {
  async fn run(mut self, tx: mpsc::Sender<ReadResult>, token: CancellationToken) {
    debug!("event reader started");
    tokio::select! {
      biased;
      () = token.cancelled() => debug!("event reader cancelled"),
      () = self.forward(&tx) => debug!("event reader finished"),
    }
  }

  /// Decode events and push them to the channel until the stream ends.
  async fn forward(&mut self, tx: &mpsc::Sender<ReadResult>) {
    let mut chunk = vec![0u8; self.read_buffer_size];
    loop {
      let item = match self.next_update(&mut chunk).await {
        Ok(Some(update)) => Ok(update),
        Ok(None) => return,
        Err(err) => Err(err),
      };
      let failed = item.is_err();
      if tx.send(item).await.is_err() || failed {
        return;
      }
    }
  }

  async fn next_update(&mut self, chunk: &mut [u8]) -> Result<Option<Update>, DecodeError> {
    loop {
      while let Some(line) = self.splitter.next_line()? {
        let line = String::from_utf8_lossy(&line);
        let field = parse_line(&line);
        let blank = matches!(field, Field::Blank);
        if let Some(event) = self.builder.apply(field)? {
          self.reported_id.clone_from(&event.id);
          return Ok(Some(Update::Event(event)));
        }
        if blank {
          if let Some(update) = self.id_change() {
            return Ok(Some(update));
          }
        }
      }

      // Splitter drained after end of input: flush a record that was
      // still waiting for its blank line.
      if self.splitter.is_finished() {
        if let Some(event) = self.builder.dispatch() {
          self.reported_id.clone_from(&event.id);
          return Ok(Some(Update::Event(event)));
        }
        return Ok(self.id_change());
      }

      let n = self.source.read(chunk).await.map_err(|err| {
        warn!(error = %err, "event source read failed");
        DecodeError::Io(err)
      })?;
      if n == 0 {
        self.splitter.finish();
      } else {
        self.splitter.feed(&chunk[..n]);
      }
    }
  }

  /// Report a last event id that moved without an event carrying it.
  fn id_change(&mut self) -> Option<Update> {
    let current = self.builder.last_event_id();
    if current == self.reported_id.as_deref() {
      return None;
    }
    self.reported_id = current.map(str::to_owned);
    Some(Update::LastEventId(self.reported_id.clone()))
  }
}

/// Implementation of `evs decode`.
///
/// Streams events from a file or stdin and prints each one as soon as
/// it is decoded, so `evs decode -` on a live connection shows events
/// as they arrive.
///
/// # Output formats
///
/// ```text
/// ┌──────┬────────────────────────────────────────────────────────────┐
/// │ Mode │ Format                                                     │
/// ├──────┼────────────────────────────────────────────────────────────┤
/// │ text │ #1 update id=7                                             │
/// │      │ first data line                                            │
/// │      │ second data line                                           │
/// │      │ (blank line)                                               │
/// │ json │ {"event":"update","id":"7","data":"first\nsecond",...}     │
/// └──────┴────────────────────────────────────────────────────────────┘
/// ```
///
/// # Stopping early
///
/// `--timeout-ms` closes the decoder from a separate task through a
/// `CloseHandle`. A read that is still waiting on the source returns at
/// once and the command exits normally. `--max-events` closes the
/// decoder after the given number of events.
use std::io::{self, Write as _};
use std::time::Duration;

use anyhow::{Context, Result};
use evs_decoder::{Event, EventDecoder};
use serde::Serialize;
use tracing::debug;

use crate::DecodeArgs;
use crate::input;

/// JSON view of one event.
#[derive(Serialize)]
struct EventRecord<'a> {
    event: &'a str,
    id: Option<&'a str>,
    data: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_ms: Option<u64>,
}

/// Run the `evs decode` command.
///
/// # Errors
///
/// Returns an error if the source cannot be opened, the stream fails to
/// decode, or stdout cannot be written.
pub async fn run(args: &DecodeArgs) -> Result<()> {
    let source = input::open(&args.file).await?;
    let mut decoder = EventDecoder::with_config(source, args.limits.decoder_config());

    if let Some(ms) = args.timeout_ms {
        let handle = decoder.close_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            debug!(timeout_ms = ms, "decode timeout reached");
            handle.close();
        });
    }

    let mut out = io::stdout();
    let mut count = 0usize;

    while let Some(event) = decoder.next().await {
        let event = event.with_context(|| {
            format!("failed to decode {}", input::describe(&args.file))
        })?;
        count += 1;

        let rendered = if args.json {
            render_json(&event)?
        } else {
            render_text(count, &event)
        };
        out.write_all(rendered.as_bytes())?;
        out.flush()?;

        if args.max_events.is_some_and(|max| count >= max) {
            break;
        }
    }

    decoder.close().await?;
    debug!(events = count, "decode finished");
    Ok(())
}

fn render_text(index: usize, event: &Event) -> String {
    let mut header = format!("#{index} {}", event.event_type());
    if let Some(id) = event.id() {
        header.push_str(&format!(" id={id}"));
    }
    if let Some(retry) = event.retry() {
        header.push_str(&format!(" retry={}ms", retry.as_millis()));
    }
    format!("{header}\n{}\n\n", event.data())
}

fn render_json(event: &Event) -> Result<String> {
    let record = EventRecord {
        event: event.event_type(),
        id: event.id(),
        data: event.data(),
        retry_ms: event
            .retry()
            .map(|retry| u64::try_from(retry.as_millis()).unwrap_or(u64::MAX)),
    };
    let mut line = serde_json::to_string(&record)?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rendering() {
        let event = Event::new("a\nb")
            .with_event_type("update")
            .with_id("7")
            .with_retry(Duration::from_millis(500));
        assert_eq!(render_text(3, &event), "#3 update id=7 retry=500ms\na\nb\n\n");
    }

    #[test]
    fn text_rendering_default_type() {
        assert_eq!(render_text(1, &Event::new("x")), "#1 message\nx\n\n");
    }

    #[test]
    fn json_rendering() {
        let event = Event::new("line1\nline2").with_id("42");
        assert_eq!(
            render_json(&event).unwrap(),
            "{\"event\":\"message\",\"id\":\"42\",\"data\":\"line1\\nline2\"}\n"
        );
    }
}

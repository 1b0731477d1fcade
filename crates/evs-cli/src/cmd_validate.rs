/// Implementation of `evs validate`.
///
/// Decodes the entire stream and reports either success checkmarks
/// (`✓`) or a diagnostic failure line (`✗`). Exit code 0 on a clean
/// stream, 1 on any error (the dispatcher in `main.rs` maps `Err` to 1).
///
/// # Success output
///
/// ```text
/// ✓ Events: 4 events decoded
/// ✓ Termination: end of stream reached cleanly
/// ```
///
/// # Failure output
///
/// ```text
/// ✗ Error: after 2 events: line exceeds 1048576 bytes
/// ```
///
/// The SSE grammar has no syntax errors, so a stream fails only on a
/// size limit or an I/O error. A trailing record without its blank line
/// still counts as an event.
use anyhow::{Result, anyhow};
use evs_decoder::{DecodeError, EventDecoder};

use crate::ValidateArgs;
use crate::input;

/// Run the `evs validate` command.
///
/// # Errors
///
/// Returns an error if the source cannot be opened or the stream fails
/// to decode.
pub async fn run(args: &ValidateArgs) -> Result<()> {
    let source = input::open(&args.file).await?;
    let mut decoder = EventDecoder::with_config(source, args.limits.decoder_config());

    let mut count = 0usize;
    let outcome = loop {
        match decoder.decode().await {
            Ok(_) => count += 1,
            Err(DecodeError::Eof) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    decoder.close().await?;

    match outcome {
        Ok(()) => {
            println!("✓ Events: {count} {} decoded", plural(count));
            println!("✓ Termination: end of stream reached cleanly");
            Ok(())
        }
        Err(e) => {
            println!("✗ Error: after {count} {}: {}", plural(count), diagnostic(&e));
            Err(anyhow!("validation failed"))
        }
    }
}

// ── Error formatting ──────────────────────────────────────────────────────────

fn plural(count: usize) -> &'static str {
    if count == 1 { "event" } else { "events" }
}

fn diagnostic(e: &DecodeError) -> String {
    match e {
        DecodeError::Io(inner) => format!("read failed: {inner}"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_for_limits() {
        let err = DecodeError::EventTooLarge { size: 11, limit: 10 };
        assert_eq!(diagnostic(&err), "event data of 11 bytes exceeds limit of 10");
    }

    #[test]
    fn event_count_wording() {
        assert_eq!(plural(0), "events");
        assert_eq!(plural(1), "event");
        assert_eq!(plural(2), "events");
    }

    #[test]
    fn diagnostic_for_io() {
        let err = DecodeError::Io(std::io::Error::other("connection reset"));
        assert_eq!(diagnostic(&err), "read failed: connection reset");
    }
}

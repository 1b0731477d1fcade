/// Implementation of `evs stats`.
///
/// Decodes a stream and prints a summary of what it carried.
///
/// # Example output
///
/// ```text
/// Source:  events.sse
/// Events:  5 total, 61 data bytes (largest 24)
/// Last id: 7
///
/// Type              Count   Bytes
/// ──────────────────────────────────
/// message               3      37
/// update                2      24
/// ──────────────────────────────────
/// Total                 5      61
/// ```
use std::collections::BTreeMap;

use anyhow::{Context, Result};
use evs_decoder::{Event, EventDecoder};

use crate::StatsArgs;
use crate::input;

/// Aggregated figures for one stream.
#[derive(Debug, Default, PartialEq, Eq)]
struct StreamStats {
    /// Event type → (count, data bytes).
    by_type: BTreeMap<String, (usize, usize)>,
    largest: usize,
    last_id: Option<String>,
}

impl StreamStats {
    fn record(&mut self, event: &Event) {
        let size = event.data().len();
        let entry = self.by_type.entry(event.event_type().to_owned()).or_default();
        entry.0 += 1;
        entry.1 += size;
        self.largest = self.largest.max(size);
        // Events carry the stream's current id, so an empty `id:` shows up as None
        self.last_id = event.id().map(str::to_owned);
    }

    fn totals(&self) -> (usize, usize) {
        self.by_type
            .values()
            .fold((0, 0), |(count, bytes), (c, b)| (count + c, bytes + b))
    }

    fn render(&self, source: &str) -> String {
        let (count, bytes) = self.totals();
        let rule = "─".repeat(34);

        let mut out = format!("Source:  {source}\n");
        out.push_str(&format!(
            "Events:  {count} total, {bytes} data bytes (largest {})\n",
            self.largest
        ));
        out.push_str(&format!(
            "Last id: {}\n\n",
            self.last_id.as_deref().unwrap_or("-")
        ));
        out.push_str(&format!("{:<16}{:>7}{:>8}\n{rule}\n", "Type", "Count", "Bytes"));
        for (event_type, (c, b)) in &self.by_type {
            out.push_str(&format!("{event_type:<16}{c:>7}{b:>8}\n"));
        }
        out.push_str(&format!("{rule}\n{:<16}{count:>7}{bytes:>8}\n", "Total"));
        out
    }
}

/// Run the `evs stats` command.
///
/// # Errors
///
/// Returns an error if the source cannot be opened or the stream fails
/// to decode.
pub async fn run(args: &StatsArgs) -> Result<()> {
    let source = input::open(&args.file).await?;
    let mut decoder = EventDecoder::with_config(source, args.limits.decoder_config());
    let name = input::describe(&args.file);

    let mut stats = StreamStats::default();
    while let Some(event) = decoder.next().await {
        let event = event.with_context(|| format!("failed to decode {name}"))?;
        stats.record(&event);
    }
    // Picks up id-only records after the last event
    stats.last_id = decoder.last_event_id().map(str::to_owned);
    decoder.close().await?;

    print!("{}", stats.render(&name));
    Ok(())
}

/// Errors raised while splitting an event stream into lines.
///
/// The SSE grammar itself has no fatal conditions: unknown fields,
/// comments and invalid UTF-8 are all tolerated further up. The only
/// thing the wire layer refuses is unbounded buffering.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A single line grew past the configured limit without a terminator.
    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

use bytes::{Buf, Bytes, BytesMut};

use crate::error::WireError;

/// UTF-8 byte order mark. Stripped once if it opens the stream.
const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Default upper bound for a single line (1 MiB).
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Incremental line splitter for event-stream bytes.
///
/// Bytes arrive in arbitrary chunks from the transport; the splitter
/// buffers them and hands back complete lines with the terminator
/// removed. All three SSE line endings are recognised:
///
/// ```text
///   "data: a\n"      → "data: a"
///   "data: a\r\n"    → "data: a"
///   "data: a\r"      → "data: a"
/// ```
///
/// A `\r` that is the last buffered byte is held back until the next
/// byte arrives, since it may be the first half of a `\r\n` pair split
/// across two reads. Calling [`finish`](Self::finish) releases it.
///
/// The splitter is sans-I/O: it never reads from anything. The caller
/// feeds chunks and drains lines until [`next_line`](Self::next_line)
/// returns `Ok(None)`.
#[derive(Debug)]
pub struct LineSplitter {
    buf: BytesMut,
    /// Offset up to which `buf` is known not to contain a terminator.
    scanned: usize,
    max_line_bytes: usize,
    bom_checked: bool,
    finished: bool,
}

impl Default for LineSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

impl LineSplitter {
    /// Create a splitter that rejects lines longer than `max_line_bytes`.
    #[must_use]
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            scanned: 0,
            max_line_bytes,
            bom_checked: false,
            finished: false,
        }
    }

    /// Append a chunk of stream bytes.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Mark the end of input.
    ///
    /// After this, an unterminated trailing line is returned as a final
    /// line and a held-back `\r` is treated as a terminator.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of bytes buffered but not yet returned as lines.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Return the next complete line, without its terminator.
    ///
    /// Returns `Ok(None)` when more input is needed (or, after
    /// [`finish`](Self::finish), when the input is fully drained).
    ///
    /// # Errors
    ///
    /// Returns [`WireError::LineTooLong`] if a line exceeds the
    /// configured limit, whether or not its terminator has arrived.
    pub fn next_line(&mut self) -> Result<Option<Bytes>, WireError> {
        if !self.bom_checked && !self.strip_bom() {
            return Ok(None);
        }

        let found = self.buf[self.scanned..]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
            .map(|offset| self.scanned + offset);

        let Some(pos) = found else {
            self.scanned = self.buf.len();
            if self.buf.len() > self.max_line_bytes {
                return Err(self.too_long());
            }
            if self.finished && !self.buf.is_empty() {
                self.scanned = 0;
                return Ok(Some(self.buf.split().freeze()));
            }
            return Ok(None);
        };

        if pos > self.max_line_bytes {
            return Err(self.too_long());
        }

        let terminator_len = match (self.buf[pos], self.buf.get(pos + 1).copied()) {
            (b'\n', _) => 1,
            (_, Some(b'\n')) => 2,
            (_, Some(_)) => 1,
            (_, None) if self.finished => 1,
            (_, None) => {
                self.scanned = pos;
                return Ok(None);
            }
        };

        let line = self.buf.split_to(pos).freeze();
        self.buf.advance(terminator_len);
        self.scanned = 0;
        Ok(Some(line))
    }

    /// Strip a leading BOM. Returns `false` while the buffered bytes are
    /// still a strict prefix of the BOM and more input may follow.
    fn strip_bom(&mut self) -> bool {
        let n = self.buf.len().min(BOM.len());
        if self.buf[..n] != BOM[..n] {
            self.bom_checked = true;
            return true;
        }
        if n == BOM.len() {
            self.buf.advance(BOM.len());
            self.bom_checked = true;
            return true;
        }
        if self.finished {
            self.bom_checked = true;
            return true;
        }
        false
    }

    fn too_long(&self) -> WireError {
        WireError::LineTooLong {
            limit: self.max_line_bytes,
        }
    }
}

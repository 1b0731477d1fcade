#![no_main]

use evs_wire::{parse_line, Field};
use libfuzzer_sys::fuzz_target;

// Fuzz target: single-line field parsing.
//
// Any line must classify without panicking, and a line with no colon
// never yields a comment.
fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    let field = parse_line(&line);
    if !line.contains(':') {
        assert!(!matches!(field, Field::Comment(_)));
    }
});

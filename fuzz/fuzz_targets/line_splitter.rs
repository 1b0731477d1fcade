#![no_main]

use arbitrary::Arbitrary;
use evs_wire::LineSplitter;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    data: Vec<u8>,
    chunk: u8,
    max_line: u16,
}

fn split(data: &[u8], chunk: usize, max_line: usize) -> Result<Vec<Vec<u8>>, ()> {
    let mut splitter = LineSplitter::new(max_line);
    let mut lines = Vec::new();
    for piece in data.chunks(chunk) {
        splitter.feed(piece);
        while let Some(line) = splitter.next_line().map_err(|_| ())? {
            lines.push(line.to_vec());
        }
    }
    splitter.finish();
    while let Some(line) = splitter.next_line().map_err(|_| ())? {
        lines.push(line.to_vec());
    }
    Ok(lines)
}

// Fuzz target: incremental line splitting.
//
// Feeding the same bytes in arbitrary chunk sizes must produce the same
// lines as feeding them whole, and no emitted line may carry a
// terminator byte.
fuzz_target!(|input: Input| {
    let chunk = usize::from(input.chunk).max(1);
    let max_line = usize::from(input.max_line).max(1);

    let whole = split(&input.data, input.data.len().max(1), max_line);
    let chunked = split(&input.data, chunk, max_line);

    if let (Ok(whole), Ok(chunked)) = (&whole, &chunked) {
        assert_eq!(whole, chunked);
        for line in whole {
            assert!(!line.contains(&b'\n') && !line.contains(&b'\r'));
        }
    }
});

#![no_main]

use std::io::Cursor;

use evs_decoder::{DecodeError, DecoderConfig, EventDecoder};
use libfuzzer_sys::fuzz_target;

// Fuzz target: the full decoder over an in-memory source.
//
// Runs the reader task on a current-thread runtime and drains it. Every
// run must end in exactly one terminal Eof, stay Eof afterwards, and
// close without a panicked reader.
fuzz_target!(|data: &[u8]| {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    rt.block_on(async {
        let config = DecoderConfig::default()
            .with_max_line_bytes(256)
            .with_max_event_bytes(1024)
            .with_read_buffer_size(7);
        let mut decoder = EventDecoder::with_config(Cursor::new(data.to_vec()), config);

        loop {
            match decoder.decode().await {
                Ok(event) => assert!(event.data().len() <= 1024),
                Err(DecodeError::Eof) => break,
                Err(_) => {}
            }
        }
        assert!(decoder.decode().await.unwrap_err().is_eof());
        decoder.close().await.unwrap();
    });
});

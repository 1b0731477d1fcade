#![warn(clippy::pedantic)]

pub mod config;
pub mod decoder;
pub mod error;
pub mod event;

mod reader;

pub use config::DecoderConfig;
pub use decoder::{CloseHandle, EventDecoder};
pub use error::DecodeError;
pub use event::{DEFAULT_EVENT_TYPE, Event, EventBuilder};

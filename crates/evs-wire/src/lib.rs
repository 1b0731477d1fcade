#![warn(clippy::pedantic)]

pub mod error;
pub mod field;
pub mod line;

pub use error::WireError;
pub use field::{Field, parse_line};
pub use line::LineSplitter;

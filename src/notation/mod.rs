//! Text notation parsing
//!
//! Converts one flat voice of compact pitch/duration notation (Lilypond
//! style: `c4. dis'8~ <c e g>2 | ...`) directly into canonical note
//! events in absolute seconds.

pub mod parser;
pub mod token;

pub use parser::NotationParser;
pub use token::{tokenize, Token};

//! Triplet-frequency extraction engine.
//!
//! This crate scans text for contiguous three-letter sequences and reports
//! the most frequent ones:
//! - **Scanner**: Walks bytes with a rolling letter-run window, tallying
//!   case-folded triplets into a frequency table
//! - **Chunker**: Partitions input into overlapping spans so chunks can be
//!   scanned in parallel without losing boundary triplets
//! - **Selector**: Keeps the top K entries in a fixed set of slots
//! - **Extractor**: Ties source, sink, and formatting together, with a
//!   sequential and a fork-join parallel entry point
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::io::Cursor;
//! use triad_core::TripletExtractor;
//!
//! let input = Cursor::new("the theory of everything".as_bytes());
//! let mut output = Vec::new();
//!
//! let mut extractor = TripletExtractor::new(
//!     input,
//!     &mut output,
//!     3,
//!     |a, b, c, n| format!("{}{}{} {}\n", a, b, c, n),
//! )?;
//! extractor.extract()?;
//! drop(extractor);
//!
//! let report = String::from_utf8(output)?;
//! assert!(report.starts_with("the 2"));
//! # Ok(())
//! # }
//! ```

pub mod chunk;
pub mod extract;
pub mod scan;
pub mod selector;

pub use extract::{TripletExtractor, TripletExtractorBuilder};
pub use scan::FreqTable;
pub use selector::TopSelector;

pub use triad_types::{Count, ExtractConfig, ExtractError, SelectorError, Triplet};

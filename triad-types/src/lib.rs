//! Shared types for the triad triplet-frequency workspace.
//!
//! Everything the engine and its tooling exchange lives here: the packed
//! triplet key, the error taxonomy, and the extraction tuning options.
//! The crate is deliberately dependency-free so downstream crates can
//! name these types without pulling in the engine.

#![warn(missing_docs)]

use std::fmt;

/// Occurrence count for one triplet.
///
/// `u64` rather than `u32`: a multi-gigabyte input of a single repeated
/// letter run would overflow 32 bits.
pub type Count = u64;

/// Three normalized letter bytes packed into the low 24 bits of a `u32`.
///
/// Layout: `(first << 16) | (second << 8) | third`. The scanner produces
/// millions of these per second, so the key must be `Copy`, compare in one
/// instruction, and hash without touching the heap; a packed integer gives
/// all three.
///
/// The all-zero value is the `Default` and stands for an empty selector
/// slot; it can never be produced by scanning, since 0x00 is not a letter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Triplet(pub u32);

impl Triplet {
    /// Largest packed value: all three letter bytes set to 0xFF.
    pub const MAX: u32 = 0xFFFFFF;

    /// Packs three letter bytes, first letter in the high bits.
    #[inline(always)]
    pub const fn from_bytes(b0: u8, b1: u8, b2: u8) -> Self {
        Self(((b0 as u32) << 16) | ((b1 as u32) << 8) | (b2 as u32))
    }

    /// Unpacks into the three letter bytes, first letter first.
    #[inline(always)]
    pub const fn to_bytes(self) -> [u8; 3] {
        [
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        ]
    }

    /// Returns the three bytes widened to `char` (Latin-1 maps to U+00XX).
    #[inline(always)]
    pub const fn to_chars(self) -> [char; 3] {
        let [b0, b1, b2] = self.to_bytes();
        [b0 as char, b1 as char, b2 as char]
    }

    /// Raw packed value.
    #[inline(always)]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<u32> for Triplet {
    #[inline(always)]
    fn from(value: u32) -> Self {
        Self(value & Self::MAX)
    }
}

impl From<Triplet> for u32 {
    #[inline(always)]
    fn from(t: Triplet) -> Self {
        t.0
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.to_chars();
        write!(f, "{}{}{}", a, b, c)
    }
}

/// Errors raised when constructing a top-K selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorError {
    /// Requested capacity was zero; the selector must hold at least one slot.
    InvalidCapacity,
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorError::InvalidCapacity => write!(f, "selector capacity must be positive"),
        }
    }
}

impl std::error::Error for SelectorError {}

/// Errors raised by extractor construction and extraction runs.
///
/// Configuration variants are raised synchronously at build time, never
/// during a scan. I/O and worker failures abort the whole extraction; no
/// partial output is written.
#[derive(Debug)]
pub enum ExtractError {
    /// Requested result count was zero.
    InvalidCount,
    /// Processor-usage coefficient was outside the (0.0, 0.9] range.
    InvalidCoefficient {
        /// The rejected coefficient value.
        given: f32,
    },
    /// A required builder field was never set.
    NotConfigured {
        /// Name of the first missing field.
        missing: &'static str,
    },
    /// The input or output handle failed mid-extraction.
    Io(std::io::Error),
    /// A scan worker panicked; the parallel extraction was aborted.
    WorkerFailed {
        /// Zero-based index of the chunk whose worker failed.
        chunk: usize,
    },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::InvalidCount => {
                write!(f, "result count must be positive")
            }
            ExtractError::InvalidCoefficient { given } => {
                write!(
                    f,
                    "processor usage coefficient must be in (0.0, {}], got {}",
                    ExtractConfig::MAX_COEFFICIENT,
                    given
                )
            }
            ExtractError::NotConfigured { missing } => {
                write!(f, "extractor is not configured: missing {}", missing)
            }
            ExtractError::Io(err) => write!(f, "extraction i/o failed: {}", err),
            ExtractError::WorkerFailed { chunk } => {
                write!(f, "scan worker for chunk {} failed", chunk)
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(err: std::io::Error) -> Self {
        ExtractError::Io(err)
    }
}

/// Tuning options for parallel extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractConfig {
    /// Fraction of available parallelism used to derive the chunk length.
    /// Lower values produce fewer, larger chunks. Default: 0.6.
    pub coefficient: f32,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            coefficient: Self::DEFAULT_COEFFICIENT,
        }
    }
}

impl ExtractConfig {
    /// Default processor-usage coefficient.
    pub const DEFAULT_COEFFICIENT: f32 = 0.6;

    /// Upper bound (inclusive) of the valid coefficient range.
    pub const MAX_COEFFICIENT: f32 = 0.9;

    /// Inputs shorter than this are always scanned sequentially; spawning
    /// workers costs more than the scan itself at this size.
    pub const MIN_PARALLEL_INPUT: usize = 100;

    /// Creates a configuration with a custom coefficient.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::InvalidCoefficient` if the coefficient is not
    /// in (0.0, 0.9].
    pub fn with_coefficient(coefficient: f32) -> Result<Self, ExtractError> {
        if !(coefficient > 0.0 && coefficient <= Self::MAX_COEFFICIENT) {
            return Err(ExtractError::InvalidCoefficient { given: coefficient });
        }
        Ok(Self { coefficient })
    }
}

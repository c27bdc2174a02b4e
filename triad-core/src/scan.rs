//! Letter-run scanning and frequency tallying.
//!
//! The scanner walks raw bytes and counts every contiguous triplet of
//! letters, case-insensitively. Non-letter bytes are separators: they end
//! the current run, and triplets never span a separator.
//!
//! Classification goes through a 256-entry lookup table mapping each byte
//! to its lower-case letter byte, or 0 for non-letters. Besides ASCII, the
//! Latin-1 letter range participates (`à`, `é`, `Þ`, ...), matching the
//! byte-level letter test of the system this engine replaces. Bytes
//! outside both ranges, including UTF-8 continuation bytes, separate runs.

use rustc_hash::FxHashMap;
use triad_types::{Count, Triplet};

/// Per-scan-unit frequency table. Every key present has count >= 1.
pub type FreqTable = FxHashMap<Triplet, Count>;

const fn classify(b: u8) -> u8 {
    match b {
        b'A'..=b'Z' => b + 0x20,
        b'a'..=b'z' => b,
        // Latin-1: ª µ º, capitals À-Þ (× excluded), lowercase à-ÿ (÷ excluded)
        0xAA | 0xB5 | 0xBA => b,
        0xC0..=0xD6 | 0xD8..=0xDE => b + 0x20,
        0xDF..=0xF6 | 0xF8..=0xFF => b,
        _ => 0,
    }
}

const fn build_letter_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut b = 0usize;
    while b < 256 {
        table[b] = classify(b as u8);
        b += 1;
    }
    table
}

/// Byte -> lower-case letter byte, or 0 for separators.
const LETTER_TABLE: [u8; 256] = build_letter_table();

/// Rolling window over the current unbroken letter run.
///
/// Holds the last two normalized letters and the run-length counter. The
/// counter follows the progression 0 -> 1 -> 2 -> 3, sliding back to 2
/// after each recorded triplet, and snapping to 0 on any separator. The
/// state is a plain stack value created per scan unit; it never outlives
/// the unit that produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    first: u8,
    second: u8,
    letters_in_row: u8,
}

impl RunState {
    /// Fresh state: no letters seen yet.
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Scans one block of bytes, carrying `state` across calls.
///
/// Sequential extraction reads the input in fixed-size blocks and threads
/// a single `RunState` through every call, so runs and triplets crossing a
/// block boundary are formed exactly as if the input were one slice.
pub fn scan_block(bytes: &[u8], state: &mut RunState, table: &mut FreqTable) {
    for &b in bytes {
        let lower = LETTER_TABLE[b as usize];

        if lower == 0 {
            state.letters_in_row = 0;
            continue;
        }

        state.letters_in_row += 1;
        match state.letters_in_row {
            1 => state.first = lower,
            2 => state.second = lower,
            _ => {
                let triplet = Triplet::from_bytes(state.first, state.second, lower);
                *table.entry(triplet).or_insert(0) += 1;
                state.first = state.second;
                state.second = lower;
                state.letters_in_row = 2;
            }
        }
    }
}

/// Scans one self-contained slice with fresh state.
///
/// This is the per-chunk entry point for parallel extraction: each chunk
/// is scanned independently into its own private table.
pub fn scan_slice(bytes: &[u8], table: &mut FreqTable) {
    let mut state = RunState::new();
    scan_block(bytes, &mut state, table);
}

/// Merges `src` into `dst`, summing counts for shared keys.
///
/// Merging is commutative and associative as a key -> count mapping, so
/// partial tables can be folded in any order.
pub fn merge_into(dst: &mut FreqTable, src: FreqTable) {
    if dst.is_empty() {
        *dst = src;
        return;
    }
    for (key, count) in src {
        *dst.entry(key).or_insert(0) += count;
    }
}

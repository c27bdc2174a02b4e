//! Input partitioning for parallel scanning.
//!
//! The input is split into consecutive chunks, one per worker. Each chunk
//! is scanned with fresh run state, so a triplet straddling a boundary
//! would be lost. Stitching fixes that: every span except the first starts
//! two bytes before its chunk, which lets the chunk's own scan re-discover
//! any boundary-crossing triplet. Each triplet is counted by exactly one
//! span, the one containing its final byte.

use std::ops::Range;

use smallvec::SmallVec;

/// Bytes of the preceding chunk prepended to each subsequent span.
/// A triplet spans three bytes, so two bytes of lookback suffice.
pub const OVERLAP: usize = 2;

/// Spans up to this count stay on the stack; worker counts rarely exceed it.
const INLINE_SPANS: usize = 16;

/// Span list produced by [`chunk_spans`].
pub type SpanList = SmallVec<[Range<usize>; INLINE_SPANS]>;

/// Derives the chunk length from the input size, the worker count, and
/// the processor-usage coefficient. A lower coefficient yields fewer,
/// larger chunks. Never returns zero.
#[inline]
pub fn chunk_length(total: usize, workers: usize, coefficient: f32) -> usize {
    let target = total as f64 / (workers as f64 * coefficient as f64);
    (target as usize).max(1)
}

/// Partitions `total` bytes into scan spans of `chunk_len` bytes each
/// (the final span may be shorter), extending every span except the first
/// backwards by [`OVERLAP`] bytes.
pub fn chunk_spans(total: usize, chunk_len: usize) -> SpanList {
    let mut spans = SpanList::new();
    let mut start = 0usize;

    while start < total {
        let end = (start + chunk_len).min(total);
        let scan_start = if start == 0 {
            0
        } else {
            start.saturating_sub(OVERLAP)
        };
        spans.push(scan_start..end);
        start = end;
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{merge_into, scan_slice, FreqTable};
    use triad_types::Triplet;

    #[test]
    fn chunk_length_floors_and_clamps() {
        // 100 / (4 * 0.6) = 41.66.. -> 41
        assert_eq!(chunk_length(100, 4, 0.6), 41);
        // Tiny inputs with many workers still produce a usable length.
        assert_eq!(chunk_length(3, 16, 0.9), 1);
        assert_eq!(chunk_length(0, 4, 0.6), 1);
    }

    #[test]
    fn spans_cover_input_exactly() {
        let spans = chunk_spans(10, 4);
        assert_eq!(spans.as_slice(), &[0..4, 2..8, 6..10]);

        // Chunk ends tile the input with no gap and no trailing excess.
        assert_eq!(spans.last().unwrap().end, 10);
    }

    #[test]
    fn first_span_has_no_lookback() {
        let spans = chunk_spans(9, 3);
        assert_eq!(spans[0], 0..3);
        assert_eq!(spans[1], 1..6);
        assert_eq!(spans[2], 4..9);
    }

    #[test]
    fn exact_multiple_produces_even_chunks() {
        let spans = chunk_spans(12, 6);
        assert_eq!(spans.as_slice(), &[0..6, 4..12]);
    }

    #[test]
    fn single_chunk_when_length_covers_input() {
        let spans = chunk_spans(5, 100);
        assert_eq!(spans.as_slice(), &[0..5]);
    }

    #[test]
    fn empty_input_yields_no_spans() {
        assert!(chunk_spans(0, 8).is_empty());
    }

    #[test]
    fn unit_chunks_never_underflow() {
        let spans = chunk_spans(4, 1);
        assert_eq!(spans.as_slice(), &[0..1, 0..2, 0..3, 1..4]);
    }

    #[test]
    fn stitching_recovers_boundary_triplet_once() {
        let input = b"abcdef";
        let spans = chunk_spans(input.len(), 3);

        let mut merged = FreqTable::default();
        for span in &spans {
            let mut partial = FreqTable::default();
            scan_slice(&input[span.clone()], &mut partial);
            merge_into(&mut merged, partial);
        }

        let cde = Triplet::from_bytes(b'c', b'd', b'e');
        assert_eq!(merged.get(&cde), Some(&1), "boundary triplet counted once");

        // Whole-input scan agrees.
        let mut whole = FreqTable::default();
        scan_slice(input, &mut whole);
        assert_eq!(merged, whole);
    }

    #[test]
    fn stitched_scan_matches_whole_scan_with_separators() {
        let input = b"the rain, in spain; falls mainly on the plain";
        for chunk_len in 1..=input.len() {
            let mut merged = FreqTable::default();
            for span in chunk_spans(input.len(), chunk_len) {
                let mut partial = FreqTable::default();
                scan_slice(&input[span], &mut partial);
                merge_into(&mut merged, partial);
            }

            let mut whole = FreqTable::default();
            scan_slice(input, &mut whole);
            assert_eq!(merged, whole, "chunk_len {}", chunk_len);
        }
    }
}

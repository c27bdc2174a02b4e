//! Triplet extraction orchestration.
//!
//! [`TripletExtractor`] owns an input source and an output sink and
//! exposes the two extraction entry points: a single-pass sequential scan
//! and a chunked parallel scan. Both produce one frequency table, push it
//! through a bounded top-K selection, and write the formatted winners to
//! the sink.
//!
//! Construction goes through [`TripletExtractorBuilder`]; every
//! configuration error surfaces at build time, never mid-scan.

use std::io::{ErrorKind, Read, Write};
use std::ops::Range;
use std::thread;

use triad_types::{Count, ExtractConfig, ExtractError, Triplet};

use crate::chunk::{chunk_length, chunk_spans};
use crate::scan::{merge_into, scan_block, scan_slice, FreqTable, RunState};
use crate::selector::TopSelector;

/// Block size for sequential reads.
const READ_BLOCK: usize = 8 * 1024;

/// Extracts the most frequent letter triplets from a byte stream.
///
/// Generic over the input source, the output sink, and the formatting
/// function. The formatter receives the three triplet characters (Latin-1
/// widened to `char`) and the occurrence count; its result is treated as
/// opaque text and written to the sink as raw bytes.
pub struct TripletExtractor<R, W, F> {
    input: R,
    output: W,
    count: usize,
    format: F,
    config: ExtractConfig,
}

impl<R, W, F> TripletExtractor<R, W, F>
where
    R: Read,
    W: Write,
    F: Fn(char, char, char, Count) -> String,
{
    /// Creates an extractor with the default processor-usage coefficient.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::InvalidCount` if `count` is zero.
    pub fn new(input: R, output: W, count: usize, format: F) -> Result<Self, ExtractError> {
        Self::with_config(input, output, count, format, ExtractConfig::default())
    }

    /// Creates an extractor with explicit tuning options.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::InvalidCount` if `count` is zero, or
    /// `ExtractError::InvalidCoefficient` if the coefficient is outside
    /// (0.0, 0.9].
    pub fn with_config(
        input: R,
        output: W,
        count: usize,
        format: F,
        config: ExtractConfig,
    ) -> Result<Self, ExtractError> {
        if count == 0 {
            return Err(ExtractError::InvalidCount);
        }
        let config = ExtractConfig::with_coefficient(config.coefficient)?;

        Ok(Self {
            input,
            output,
            count,
            format,
            config,
        })
    }

    /// Requested number of result slots.
    #[inline(always)]
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Scans the whole input on the calling thread and writes the top
    /// triplets to the sink.
    ///
    /// The input is consumed in fixed-size blocks with one rolling scan
    /// state threaded across them, so runs crossing a block boundary are
    /// tallied exactly as in a single-slice scan.
    ///
    /// # Errors
    ///
    /// `ExtractError::Io` if the source or sink fails; nothing is written
    /// after a failure.
    pub fn extract(&mut self) -> Result<(), ExtractError> {
        let mut table = FreqTable::default();
        let mut state = RunState::new();
        let mut buf = [0u8; READ_BLOCK];

        loop {
            let n = match self.input.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            scan_block(&buf[..n], &mut state, &mut table);
        }

        self.write_top(&table)
    }

    /// Scans the input across parallel workers and writes the top triplets
    /// to the sink.
    ///
    /// The input is materialized first; one owner reads and slices it, so
    /// workers never touch the source handle. Inputs below
    /// `ExtractConfig::MIN_PARALLEL_INPUT` bytes are tallied on the calling
    /// thread instead, since worker dispatch costs more than the scan.
    ///
    /// # Errors
    ///
    /// `ExtractError::Io` for source/sink failures and
    /// `ExtractError::WorkerFailed` if any chunk worker panics. Either way
    /// the extraction aborts without partial output.
    pub fn extract_parallel(&mut self) -> Result<(), ExtractError> {
        let mut bytes = Vec::new();
        self.input.read_to_end(&mut bytes)?;

        if bytes.len() < ExtractConfig::MIN_PARALLEL_INPUT {
            let mut table = FreqTable::default();
            scan_slice(&bytes, &mut table);
            return self.write_top(&table);
        }

        let workers = num_cpus::get().max(1);
        let chunk_len = chunk_length(bytes.len(), workers, self.config.coefficient);
        let spans = chunk_spans(bytes.len(), chunk_len);

        let partials = scan_chunks(&bytes, &spans)?;

        let mut merged = FreqTable::default();
        for partial in partials {
            merge_into(&mut merged, partial);
        }

        self.write_top(&merged)
    }

    /// Selects the top `count` entries and writes them, most frequent
    /// first. Equal counts keep their slot order; when the table holds
    /// fewer than `count` keys, the remaining default slots are emitted
    /// as-is.
    fn write_top(&mut self, table: &FreqTable) -> Result<(), ExtractError> {
        let mut selector = TopSelector::new(self.count, |a: &Count, b: &Count| a.cmp(b))
            .map_err(|_| ExtractError::InvalidCount)?;

        for (&key, &count) in table {
            selector.insert(key, count);
        }

        let mut entries: Vec<(Triplet, Count)> =
            selector.snapshot().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));

        for (key, count) in entries {
            let [a, b, c] = key.to_chars();
            let rendered = (self.format)(a, b, c, count);
            self.output.write_all(rendered.as_bytes())?;
        }
        self.output.flush()?;

        Ok(())
    }
}

/// Scans every span on its own worker, each into a private table.
///
/// Fork-join over scoped threads: workers borrow disjoint (plus the
/// two-byte stitching overlap) slices of `bytes` and share no mutable
/// state. All workers are joined before returning; a panic in any of them
/// fails the whole batch.
fn scan_chunks(bytes: &[u8], spans: &[Range<usize>]) -> Result<Vec<FreqTable>, ExtractError> {
    scan_chunks_with(bytes, spans, scan_slice)
}

fn scan_chunks_with<F>(
    bytes: &[u8],
    spans: &[Range<usize>],
    scan: F,
) -> Result<Vec<FreqTable>, ExtractError>
where
    F: Fn(&[u8], &mut FreqTable) + Sync,
{
    thread::scope(|scope| {
        let scan = &scan;
        let mut handles = Vec::with_capacity(spans.len());
        for span in spans {
            let slice = &bytes[span.clone()];
            handles.push(scope.spawn(move || {
                let mut table = FreqTable::default();
                scan(slice, &mut table);
                table
            }));
        }

        // Join everything before reporting; leaving a panicked handle
        // unjoined would poison the scope itself.
        let mut partials = Vec::with_capacity(handles.len());
        let mut failed = None;
        for (chunk, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(table) => partials.push(table),
                Err(_) => {
                    if failed.is_none() {
                        failed = Some(chunk);
                    }
                }
            }
        }

        match failed {
            Some(chunk) => Err(ExtractError::WorkerFailed { chunk }),
            None => Ok(partials),
        }
    })
}

/// Fluent builder for [`TripletExtractor`].
///
/// All validation happens in [`build`](Self::build): missing handles,
/// a zero result count, or an out-of-range coefficient fail there with
/// the corresponding `ExtractError`.
pub struct TripletExtractorBuilder<R, W, F> {
    input: Option<R>,
    output: Option<W>,
    count: usize,
    format: Option<F>,
    coefficient: Option<f32>,
}

impl<R, W, F> Default for TripletExtractorBuilder<R, W, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W, F> TripletExtractorBuilder<R, W, F> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            input: None,
            output: None,
            count: 0,
            format: None,
            coefficient: None,
        }
    }
}

impl<R, W, F> TripletExtractorBuilder<R, W, F>
where
    R: Read,
    W: Write,
    F: Fn(char, char, char, Count) -> String,
{
    /// Sets the input source.
    pub fn input(mut self, input: R) -> Self {
        self.input = Some(input);
        self
    }

    /// Sets the output sink.
    pub fn output(mut self, output: W) -> Self {
        self.output = Some(output);
        self
    }

    /// Sets the number of triplets to report.
    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Sets the output formatting function.
    pub fn format(mut self, format: F) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the processor-usage coefficient for parallel extraction.
    pub fn coefficient(mut self, coefficient: f32) -> Self {
        self.coefficient = Some(coefficient);
        self
    }

    /// Builds the extractor.
    ///
    /// # Errors
    ///
    /// `ExtractError::NotConfigured` naming the first unset handle,
    /// `ExtractError::InvalidCount` for a zero count, or
    /// `ExtractError::InvalidCoefficient` for a coefficient outside
    /// (0.0, 0.9].
    pub fn build(self) -> Result<TripletExtractor<R, W, F>, ExtractError> {
        let input = self
            .input
            .ok_or(ExtractError::NotConfigured { missing: "input" })?;
        let output = self
            .output
            .ok_or(ExtractError::NotConfigured { missing: "output" })?;
        let format = self
            .format
            .ok_or(ExtractError::NotConfigured { missing: "format" })?;

        let config = match self.coefficient {
            Some(c) => ExtractConfig::with_coefficient(c)?,
            None => ExtractConfig::default(),
        };

        TripletExtractor::with_config(input, output, self.count, format, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn fmt_line(a: char, b: char, c: char, n: Count) -> String {
        format!("{}{}{} {}\n", a, b, c, n)
    }

    fn run_sequential(input: &[u8], count: usize) -> String {
        let mut out = Vec::new();
        let mut extractor =
            TripletExtractor::new(Cursor::new(input.to_vec()), &mut out, count, fmt_line)
                .expect("valid configuration");
        extractor.extract().expect("extraction succeeds");
        drop(extractor);
        String::from_utf8(out).expect("formatter output is utf-8 here")
    }

    fn run_parallel(input: &[u8], count: usize) -> String {
        let mut out = Vec::new();
        let mut extractor =
            TripletExtractor::new(Cursor::new(input.to_vec()), &mut out, count, fmt_line)
                .expect("valid configuration");
        extractor.extract_parallel().expect("extraction succeeds");
        drop(extractor);
        String::from_utf8(out).expect("formatter output is utf-8 here")
    }

    /// Parses formatter lines back into (triplet, count) pairs, dropping
    /// empty default slots.
    fn parse(output: &str) -> Vec<(String, u64)> {
        let mut pairs: Vec<(String, u64)> = output
            .lines()
            .map(|line| {
                let (triplet, count) = line.rsplit_once(' ').expect("line shape");
                (triplet.to_string(), count.parse().expect("count"))
            })
            .filter(|(_, n)| *n > 0)
            .collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn sequential_orders_by_descending_count() {
        // ccccc -> ccc x3, aaaa -> aaa x2, bbb -> bbb x1
        let output = run_sequential(b"ccccc aaaa bbb", 3);
        assert_eq!(output, "ccc 3\naaa 2\nbbb 1\n");
    }

    #[test]
    fn sequential_truncates_to_count() {
        let output = run_sequential(b"ccccc aaaa bbb", 2);
        assert_eq!(output, "ccc 3\naaa 2\n");
    }

    #[test]
    fn sequential_emits_default_slots_when_underfilled() {
        // Only two distinct triplets exist: aba and bab.
        let output = run_sequential(b"abab", 3);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "\0\0\0 0", "third slot stays default");

        let pairs = parse(&output);
        assert_eq!(
            pairs,
            vec![("aba".to_string(), 1), ("bab".to_string(), 1)]
        );
    }

    #[test]
    fn sequential_is_case_insensitive() {
        assert_eq!(
            run_sequential(b"AAAA bbb", 2),
            run_sequential(b"aaaa BBB", 2)
        );
        assert_eq!(run_sequential(b"AAAA bbb", 2), "aaa 2\nbbb 1\n");
    }

    #[test]
    fn sequential_carries_runs_across_read_blocks() {
        // One unbroken run longer than the 8 KiB read block; the rolling
        // state must survive the block boundary.
        let input = vec![b'a'; READ_BLOCK + 8];
        let output = run_sequential(&input, 1);
        assert_eq!(output, format!("aaa {}\n", READ_BLOCK + 8 - 2));
    }

    #[test]
    fn empty_input_yields_only_default_slots() {
        let output = run_sequential(b"", 2);
        assert_eq!(output, "\0\0\0 0\n\0\0\0 0\n");
    }

    #[test]
    fn parallel_small_input_falls_back_to_single_scan() {
        let input = b"abcdef";
        assert!(input.len() < ExtractConfig::MIN_PARALLEL_INPUT);
        assert_eq!(
            parse(&run_parallel(input, 10)),
            parse(&run_sequential(input, 10))
        );
    }

    #[test]
    fn parallel_matches_sequential_on_real_text() {
        let text = "the quick brown fox jumps over the lazy dog. ".repeat(5);
        let input = text.as_bytes();
        assert!(input.len() >= ExtractConfig::MIN_PARALLEL_INPUT);

        // K exceeds the distinct triplet count, so every entry is retained
        // in both modes and the tallies must agree exactly.
        assert_eq!(
            parse(&run_parallel(input, 200)),
            parse(&run_sequential(input, 200))
        );
    }

    #[test]
    fn parallel_exact_output_with_distinct_counts() {
        let text = "zzzz yyy xx ".repeat(10);
        let input = text.as_bytes();
        assert!(input.len() >= ExtractConfig::MIN_PARALLEL_INPUT);

        let output = run_parallel(input, 2);
        assert_eq!(output, "zzz 20\nyyy 10\n");
    }

    #[test]
    fn panicking_worker_reports_its_chunk() {
        // 300 bytes in chunks of 100: spans 0..100, 98..200, 198..300.
        // The marker at offset 150 lands only in the middle span.
        let mut bytes = vec![b'a'; 300];
        bytes[150] = b'!';
        let spans = chunk_spans(bytes.len(), 100);
        assert_eq!(spans.len(), 3);

        let result = scan_chunks_with(&bytes, &spans, |slice: &[u8], table: &mut FreqTable| {
            assert!(!slice.contains(&b'!'), "poisoned chunk");
            scan_slice(slice, table);
        });

        assert!(matches!(
            result,
            Err(ExtractError::WorkerFailed { chunk: 1 })
        ));
    }

    #[test]
    fn constructor_rejects_zero_count() {
        let result =
            TripletExtractor::new(Cursor::new(Vec::<u8>::new()), Vec::<u8>::new(), 0, fmt_line);
        assert!(matches!(result, Err(ExtractError::InvalidCount)));
    }

    #[test]
    fn constructor_rejects_bad_coefficient() {
        let result = TripletExtractor::with_config(
            Cursor::new(Vec::<u8>::new()),
            Vec::<u8>::new(),
            5,
            fmt_line,
            ExtractConfig { coefficient: 1.5 },
        );
        assert!(matches!(
            result,
            Err(ExtractError::InvalidCoefficient { .. })
        ));
    }

    #[test]
    fn builder_round_trip() {
        let mut out = Vec::new();
        let mut extractor = TripletExtractorBuilder::new()
            .input(Cursor::new(&b"aaaa bbb"[..]))
            .output(&mut out)
            .count(2)
            .format(fmt_line)
            .coefficient(0.5)
            .build()
            .expect("fully configured");
        assert_eq!(extractor.count(), 2);
        extractor.extract().expect("extraction succeeds");
        drop(extractor);

        assert_eq!(String::from_utf8(out).unwrap(), "aaa 2\nbbb 1\n");
    }

    #[test]
    fn builder_reports_first_missing_field() {
        let result = TripletExtractorBuilder::<Cursor<Vec<u8>>, Vec<u8>, _>::new()
            .count(3)
            .format(fmt_line)
            .build();
        assert!(matches!(
            result,
            Err(ExtractError::NotConfigured { missing: "input" })
        ));

        let result = TripletExtractorBuilder::<Cursor<Vec<u8>>, Vec<u8>, _>::new()
            .input(Cursor::new(Vec::<u8>::new()))
            .count(3)
            .format(fmt_line)
            .build();
        assert!(matches!(
            result,
            Err(ExtractError::NotConfigured { missing: "output" })
        ));
    }

    #[test]
    fn builder_validates_count_and_coefficient() {
        let result = TripletExtractorBuilder::new()
            .input(Cursor::new(Vec::<u8>::new()))
            .output(Vec::<u8>::new())
            .format(fmt_line)
            .build();
        assert!(matches!(result, Err(ExtractError::InvalidCount)));

        let result = TripletExtractorBuilder::new()
            .input(Cursor::new(Vec::<u8>::new()))
            .output(Vec::<u8>::new())
            .count(3)
            .format(fmt_line)
            .coefficient(0.95)
            .build();
        assert!(matches!(
            result,
            Err(ExtractError::InvalidCoefficient { .. })
        ));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::UnexpectedEof, "truncated"))
        }
    }

    #[test]
    fn io_failure_aborts_without_output() {
        let mut out = Vec::new();
        let mut extractor =
            TripletExtractor::new(FailingReader, &mut out, 3, fmt_line).expect("valid config");
        assert!(matches!(extractor.extract(), Err(ExtractError::Io(_))));
        drop(extractor);
        assert!(out.is_empty(), "no partial output on failure");

        let mut out = Vec::new();
        let mut extractor =
            TripletExtractor::new(FailingReader, &mut out, 3, fmt_line).expect("valid config");
        assert!(matches!(
            extractor.extract_parallel(),
            Err(ExtractError::Io(_))
        ));
        drop(extractor);
        assert!(out.is_empty());
    }
}

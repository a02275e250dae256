use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use std::thread;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::stopwords;
use crate::tokenize::{self, MIN_TOKEN_LEN};

/// At most this many entries are ranked in the result.
pub const TOP_WORDS_LIMIT: usize = 100;

/// Occurrence counts keyed by normalized token.
pub type WordCount = HashMap<String, u64>;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("failed to read corpus: {0}")]
    Io(#[from] std::io::Error),
}

/// Half-open byte interval of the source file owned by one scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub start: u64,
    pub end: u64,
}

/// What one scanner hands back: its private counts, and whether it
/// reached the end of its range without losing data to a read error.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub counts: WordCount,
    pub complete: bool,
}

/// One ranked entry of the final result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordFrequency {
    pub word: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub total_words: u64,
    pub unique_words: usize,
    pub top_words: Vec<WordFrequency>,
    pub processing_time_ms: u64,
    pub total_time_ms: u64,
    pub file_size: u64,
    pub words_per_second: f64,
    /// False when any chunk dropped data to a mid-scan read error.
    pub complete: bool,
}

pub fn default_workers() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Runs a full frequency analysis of the file at `path` with one
/// scanner per available hardware thread.
pub fn analyze(path: &Path) -> Result<AnalysisResult, AnalyzeError> {
    analyze_with_workers(path, default_workers())
}

pub fn analyze_with_workers(path: &Path, workers: usize) -> Result<AnalysisResult, AnalyzeError> {
    let started = Instant::now();

    if !path.exists() {
        return Err(AnalyzeError::NotFound(path.display().to_string()));
    }
    let file_size = std::fs::metadata(path)?.len();

    let ranges = plan(file_size, workers.max(1));
    info!(
        "analyzing {} ({} bytes) in {} chunks",
        path.display(),
        file_size,
        ranges.len()
    );

    let outcomes = ranges
        .into_par_iter()
        .map(|range| scan_range(path, range))
        .collect::<Result<Vec<_>, _>>()?;

    let complete = outcomes.iter().all(|outcome| outcome.complete);
    let merged = merge(outcomes.into_iter().map(|outcome| outcome.counts));
    let processing_time_ms = elapsed_ms(&started);

    let total_words: u64 = merged.values().sum();
    let mut filtered = merged;
    filtered.retain(|word, _| {
        word.chars().count() >= MIN_TOKEN_LEN && !stopwords::is_stopword(word)
    });
    let top_words = top_k(&filtered, TOP_WORDS_LIMIT);
    let unique_words = filtered.len();

    let total_time_ms = elapsed_ms(&started);
    let words_per_second = if total_time_ms > 0 {
        total_words as f64 / (total_time_ms as f64 / 1000.0)
    } else {
        0.0
    };

    info!(
        "analysis done: {} words, {} unique, {} ms",
        total_words, unique_words, total_time_ms
    );

    Ok(AnalysisResult {
        total_words,
        unique_words,
        top_words,
        processing_time_ms,
        total_time_ms,
        file_size,
        words_per_second,
        complete,
    })
}

/// Divides `[0, file_size)` into `workers` contiguous ranges. The last
/// range absorbs the integer-division remainder; a file smaller than
/// the worker count collapses to a single range, and an empty file
/// plans nothing.
pub fn plan(file_size: u64, workers: usize) -> Vec<ChunkRange> {
    if file_size == 0 {
        return Vec::new();
    }
    let slice = file_size / workers as u64;
    if slice == 0 {
        return vec![ChunkRange {
            start: 0,
            end: file_size,
        }];
    }
    (0..workers as u64)
        .map(|i| ChunkRange {
            start: i * slice,
            end: if i == workers as u64 - 1 {
                file_size
            } else {
                (i + 1) * slice
            },
        })
        .collect()
}

/// Counts the tokens of one byte range on an independent file handle.
///
/// A range that starts past byte 0 first discards up to and including
/// the next line terminator; the predecessor owns that line. The loop
/// then reads whole lines while the position has not passed `end`, so
/// the line beginning exactly at a boundary is counted by the chunk
/// owning the bytes before it and skipped by its successor.
///
/// Failing to open or seek is fatal; a read error after that aborts
/// only this chunk, which returns what it has with `complete` unset.
pub fn scan_range(path: &Path, range: ChunkRange) -> Result<ScanOutcome, AnalyzeError> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(range.start))?;
    let mut reader = BufReader::new(file);

    let mut counts = WordCount::new();
    let mut pos = range.start;
    let mut line = Vec::new();

    if range.start > 0 {
        match reader.read_until(b'\n', &mut line) {
            Ok(n) => pos += n as u64,
            Err(err) => {
                warn!(
                    "chunk [{}, {}) aborted while aligning to a line boundary: {err}",
                    range.start, range.end
                );
                return Ok(ScanOutcome {
                    counts,
                    complete: false,
                });
            }
        }
    }

    let mut complete = true;
    while pos <= range.end {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(n) => {
                pos += n as u64;
                for token in tokenize::tokenize(&String::from_utf8_lossy(&line)) {
                    *counts.entry(token).or_insert(0) += 1;
                }
            }
            Err(err) => {
                warn!(
                    "chunk [{}, {}) aborted at byte {pos}: {err}",
                    range.start, range.end
                );
                complete = false;
                break;
            }
        }
    }

    Ok(ScanOutcome { counts, complete })
}

/// Sums per-word counts across chunk-local maps. Commutative and
/// associative: any merge order equals a single scan of the whole
/// file.
pub fn merge<I>(chunks: I) -> WordCount
where
    I: IntoIterator<Item = WordCount>,
{
    let mut global = WordCount::new();
    for chunk in chunks {
        for (word, count) in chunk {
            *global.entry(word).or_insert(0) += count;
        }
    }
    global
}

/// Selects the `k` highest-count entries with a bounded min-heap,
/// O(n log k) instead of a full sort. Ties on count break
/// lexicographically, ascending, so the output is deterministic:
/// descending by count, then ascending by word.
pub fn top_k(counts: &WordCount, k: usize) -> Vec<WordFrequency> {
    if k == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<Reverse<(u64, Reverse<String>)>> = BinaryHeap::with_capacity(k + 1);
    for (word, &count) in counts {
        if heap.len() < k {
            heap.push(Reverse((count, Reverse(word.clone()))));
            continue;
        }
        let Some(Reverse((min_count, Reverse(min_word)))) = heap.peek() else {
            break;
        };
        if count > *min_count || (count == *min_count && word < min_word) {
            heap.pop();
            heap.push(Reverse((count, Reverse(word.clone()))));
        }
    }
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse((count, Reverse(word)))| WordFrequency { word, count })
        .collect()
}

fn elapsed_ms(started: &Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

//! Per-field example store: immutable seeds plus an append-only
//! feedback log.
//!
//! Each field owns one text file with two marked sections. The seed
//! section is author-curated and never mutated by the system; the
//! feedback section grows by exactly one line per successful generation
//! of that field and is never trimmed or reordered:
//!
//! ```text
//! <-- slice: seed-->
//! first seed example
//! second seed example
//! <-- slice: cache-->
//! first accepted output
//! ```
//!
//! Appends are durable before returning (write + fsync) and serialize
//! on a per-field lock — appends to different fields need no
//! coordination.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rand::seq::SliceRandom;
use tracing::debug;

use crate::PulseField;
use crate::error::Result;

/// Marker opening the author-curated seed section.
pub const SEED_MARKER: &str = "<-- slice: seed-->";
/// Marker opening the system-appended feedback section.
pub const CACHE_MARKER: &str = "<-- slice: cache-->";

/// Handle over a directory of per-field example files.
pub struct ExampleStore {
    dir: PathBuf,
    locks: [Mutex<()>; 7],
}

impl ExampleStore {
    /// Open (creating the directory if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            locks: Default::default(),
        })
    }

    /// Path of a field's store file.
    pub fn path(&self, field: PulseField) -> PathBuf {
        self.dir.join(field.store_file())
    }

    /// Load the `(seed, feedback)` sequences for a field.
    ///
    /// A missing file yields two empty sequences, not an error — a new
    /// field simply has nothing to offer yet.
    pub fn load(&self, field: PulseField) -> Result<(Vec<String>, Vec<String>)> {
        let content = match std::fs::read_to_string(self.path(field)) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok((Vec::new(), Vec::new()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(parse_sections(&content))
    }

    /// Draw up to `seed_count` distinct examples uniformly at random
    /// from the seed section plus up to `cache_count` from the feedback
    /// section. Short sections yield fewer; this never fails for lack
    /// of examples. Stateless between calls.
    pub fn sample(
        &self,
        field: PulseField,
        seed_count: usize,
        cache_count: usize,
    ) -> Result<Vec<String>> {
        let (seeds, feedback) = self.load(field)?;
        let mut rng = rand::thread_rng();

        let mut samples: Vec<String> = seeds
            .choose_multiple(&mut rng, seed_count.min(seeds.len()))
            .cloned()
            .collect();
        samples.extend(
            feedback
                .choose_multiple(&mut rng, cache_count.min(feedback.len()))
                .cloned(),
        );

        debug!(
            "sampled {} examples for {field} ({} seed, {} feedback available)",
            samples.len(),
            seeds.len(),
            feedback.len()
        );
        Ok(samples)
    }

    /// Append one accepted value to the end of a field's feedback
    /// section. The write is flushed and synced before returning, so a
    /// crash after `append` cannot lose the value.
    ///
    /// Creates the file (with both section markers) when missing and
    /// the cache marker when the file only has a seed section.
    pub fn append(&self, field: PulseField, value: &str) -> Result<()> {
        let _guard = self.locks[field.index()].lock().unwrap();

        let path = self.path(field);
        let existing = match std::fs::read_to_string(&path) {
            Ok(c) => Some(c),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let mut chunk = String::new();
        match &existing {
            None => {
                chunk.push_str(SEED_MARKER);
                chunk.push('\n');
                chunk.push_str(CACHE_MARKER);
                chunk.push('\n');
            }
            Some(content) => {
                if !content.is_empty() && !content.ends_with('\n') {
                    chunk.push('\n');
                }
                if !content.contains(CACHE_MARKER) {
                    chunk.push_str(CACHE_MARKER);
                    chunk.push('\n');
                }
            }
        }
        chunk.push_str(value.trim());
        chunk.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(chunk.as_bytes())?;
        file.flush()?;
        file.sync_all()?;

        debug!("appended 1 value to {field} feedback log");
        Ok(())
    }

    /// The store's root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Split file content into `(seed, feedback)` line sequences.
///
/// Lines before the seed marker are ignored; blank lines are dropped;
/// values are trimmed. A file without markers yields nothing — the
/// format is explicit by design.
fn parse_sections(content: &str) -> (Vec<String>, Vec<String>) {
    let seeds = match content.split_once(SEED_MARKER) {
        Some((_, rest)) => {
            let seed_part = match rest.split_once(CACHE_MARKER) {
                Some((seed, _)) => seed,
                None => rest,
            };
            section_lines(seed_part)
        }
        None => Vec::new(),
    };

    let feedback = match content.split_once(CACHE_MARKER) {
        Some((_, rest)) => section_lines(rest),
        None => Vec::new(),
    };

    (seeds, feedback)
}

fn section_lines(section: &str) -> Vec<String> {
    section
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

//! Generative pulse-log pipeline.
//!
//! `pulseframe` generates a small set of short, style-constrained text
//! fields from an OpenAI-compatible chat-completions service, feeds its
//! own prior outputs back in as future in-context examples, and renders
//! the result into static HTML pages with a per-day archive.
//!
//! The core abstraction is the [`Pipeline`](pipeline::Pipeline) — one
//! invocation probes the backend, samples examples from the
//! [`ExampleStore`](store::ExampleStore), runs a fixed three-phase
//! generation protocol on a bounded worker pool, validates every field
//! against its format grammar, appends the accepted values back to the
//! store, and assembles an immutable [`PulseRecord`](pipeline::PulseRecord).
//!
//! Failure anywhere is failure everywhere: an unreachable backend, a
//! timeout, or a single field violating its grammar aborts the whole run
//! with no store append and no rendered output. A stale archive entry is
//! the intended operator-facing failure signal — there is no fallback to
//! cached content.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Chat-completions client, reachability probe, backend selection |
//! | [`store`] | Per-field seed + feedback example files, sampling, durable append |
//! | [`generate`] | Phase protocol, prompt preambles, format-grammar validation |
//! | [`pipeline`] | Orchestrator: probe → sample → phases → validate → append |
//! | [`render`] | Pure `{{name}}` template substitution and marker injection |
//! | [`archive`] | One entry per calendar date, reverse-chronological index |
//! | [`icons`] | Decorative icon source seam (interface only) |
//! | [`config`] | Backend and pipeline configuration |

pub mod api;
pub mod archive;
pub mod config;
pub mod error;
pub mod generate;
pub mod icons;
pub mod pipeline;
pub mod render;
pub mod store;

pub use config::{BackendConfig, PulseConfig};
pub use error::{PulseError, Result};
pub use pipeline::{Pipeline, PulseRecord};
pub use store::ExampleStore;

// ── Fields ─────────────────────────────────────────────────────────

/// The seven generated fields of a pulse record.
///
/// The first five are the *structural* fields produced together by the
/// batch phase; the last two are the free-text quote phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PulseField {
    /// Status line — short, opens with a glyph token.
    Status,
    /// Subject identifier — `⊚`-separated.
    Subject,
    /// Mode descriptor — `∷`-separated.
    Mode,
    /// Glyph sequence — `∵`-separated.
    Glyph,
    /// Echo classifier — `⇝`-marked.
    Echo,
    /// Forward-oriented quote (acceleration / emergence vocabulary).
    Quote,
    /// Backward-oriented quote (origin / foundational vocabulary).
    EndQuote,
}

impl PulseField {
    /// All fields, in record order.
    pub const ALL: [PulseField; 7] = [
        PulseField::Status,
        PulseField::Subject,
        PulseField::Mode,
        PulseField::Glyph,
        PulseField::Echo,
        PulseField::Quote,
        PulseField::EndQuote,
    ];

    /// The five fields produced by the structural batch phase.
    pub const STRUCTURAL: [PulseField; 5] = [
        PulseField::Status,
        PulseField::Subject,
        PulseField::Mode,
        PulseField::Glyph,
        PulseField::Echo,
    ];

    /// Stable name used as template key and in batch-phase JSON.
    pub fn name(self) -> &'static str {
        match self {
            PulseField::Status => "status",
            PulseField::Subject => "subject",
            PulseField::Mode => "mode",
            PulseField::Glyph => "glyph",
            PulseField::Echo => "echo",
            PulseField::Quote => "quote",
            PulseField::EndQuote => "end_quote",
        }
    }

    /// File name of this field's example store file.
    pub fn store_file(self) -> &'static str {
        match self {
            PulseField::Status => "status_cache.txt",
            PulseField::Subject => "subject_cache.txt",
            PulseField::Mode => "mode_cache.txt",
            PulseField::Glyph => "glyph_cache.txt",
            PulseField::Echo => "echo_cache.txt",
            PulseField::Quote => "quote_cache.txt",
            PulseField::EndQuote => "end_quote_cache.txt",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            PulseField::Status => 0,
            PulseField::Subject => 1,
            PulseField::Mode => 2,
            PulseField::Glyph => 3,
            PulseField::Echo => 4,
            PulseField::Quote => 5,
            PulseField::EndQuote => 6,
        }
    }
}

impl std::fmt::Display for PulseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_are_stable() {
        assert_eq!(PulseField::Status.name(), "status");
        assert_eq!(PulseField::EndQuote.name(), "end_quote");
        assert_eq!(PulseField::Subject.store_file(), "subject_cache.txt");
    }

    #[test]
    fn all_fields_have_distinct_indices() {
        let mut seen = std::collections::HashSet::new();
        for field in PulseField::ALL {
            assert!(seen.insert(field.index()));
        }
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn structural_fields_are_a_prefix_of_all() {
        for (i, field) in PulseField::STRUCTURAL.iter().enumerate() {
            assert_eq!(*field, PulseField::ALL[i]);
        }
    }
}

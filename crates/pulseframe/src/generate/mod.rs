//! Field generation: the fixed three-phase protocol and its grammars.
//!
//! - [`phases::structural_batch`] — one call producing the five
//!   structural fields together, parsed as a five-key JSON record.
//! - [`phases::quote`] — one call per quote orientation, free text
//!   bounded at 280 characters.
//! - [`rules`] — the per-field format grammars, evaluated uniformly.
//! - [`prompts`] — fixed instruction preambles with sampled examples
//!   interpolated.
//!
//! Phases are independent of each other and run concurrently on the
//! orchestrator's bounded worker pool.

pub mod phases;
pub mod prompts;
pub mod rules;

pub use phases::{StructuralFields, quote, structural_batch};
pub use rules::{FieldRule, rules_for, validate};

use std::collections::HashMap;

use crate::error::Result;
use crate::store::ExampleStore;
use crate::PulseField;

/// Thematic time-orientation of a quote phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteOrientation {
    /// Future-oriented: acceleration and emergence vocabulary.
    Forward,
    /// Past-oriented: origin and foundational vocabulary.
    Backward,
}

impl QuoteOrientation {
    /// The record field this orientation produces.
    pub fn field(self) -> PulseField {
        match self {
            QuoteOrientation::Forward => PulseField::Quote,
            QuoteOrientation::Backward => PulseField::EndQuote,
        }
    }
}

/// In-context examples for every field, drawn once at the start of a
/// run — no phase's output is visible to sampling within the same run.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    samples: HashMap<PulseField, Vec<String>>,
}

impl SampleSet {
    /// Sample all seven fields from the store.
    pub fn draw(store: &ExampleStore, seed_count: usize, cache_count: usize) -> Result<Self> {
        let mut samples = HashMap::new();
        for field in PulseField::ALL {
            samples.insert(field, store.sample(field, seed_count, cache_count)?);
        }
        Ok(Self { samples })
    }

    /// The examples drawn for a field.
    pub fn get(&self, field: PulseField) -> &[String] {
        self.samples.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Examples as a numbered list for prompt interpolation.
    pub fn numbered(&self, field: PulseField) -> String {
        self.get(field)
            .iter()
            .enumerate()
            .map(|(i, ex)| format!("{}. {ex}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: Vec<(PulseField, Vec<String>)>) -> Self {
        Self {
            samples: pairs.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_maps_to_quote_fields() {
        assert_eq!(QuoteOrientation::Forward.field(), PulseField::Quote);
        assert_eq!(QuoteOrientation::Backward.field(), PulseField::EndQuote);
    }

    #[test]
    fn numbered_list_formats_examples() {
        let set = SampleSet::from_pairs(vec![(
            PulseField::Status,
            vec!["first".into(), "second".into()],
        )]);
        assert_eq!(set.numbered(PulseField::Status), "1. first\n2. second");
        assert_eq!(set.numbered(PulseField::Mode), "");
    }

    #[test]
    fn draw_covers_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExampleStore::open(dir.path()).unwrap();
        std::fs::write(
            store.path(PulseField::Status),
            "<-- slice: seed-->\nalpha\nbeta\n",
        )
        .unwrap();

        let set = SampleSet::draw(&store, 3, 3).unwrap();
        assert_eq!(set.get(PulseField::Status).len(), 2);
        // Fields with no store file sample empty, not error.
        assert!(set.get(PulseField::Glyph).is_empty());
    }
}

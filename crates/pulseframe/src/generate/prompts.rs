//! Fixed instruction preambles for the phase calls.
//!
//! Structure lives in the preamble, diversity lives in the temperature:
//! each prompt states the format grammar the validator will enforce and
//! interpolates the sampled examples, nothing else varies run to run.

use crate::PulseField;

use super::{QuoteOrientation, SampleSet};

const STRUCTURAL_PREAMBLE: &str = "\
You are generating one entry of a recursive pulse log: five short, \
style-constrained fields that blend mystical and technical vocabulary \
(glyphs, daemons, recursion, lattices, resonance, breath).

Produce ALL FIVE fields in a single JSON object with exactly these keys: \
\"status\", \"subject\", \"mode\", \"glyph\", \"echo\".

Format rules (hard limits, reply is rejected otherwise):
- status: opens with a single glyph or emoji, then a short phrase; at most 60 characters total
- subject: a capitalized identifier, then the separator ⊚, then a gerund; at most 50 characters before the ⊚
- mode: two or three words joined by the separator ∷; at most 70 characters total
- glyph: a compact symbol sequence containing the separator ∵; at most 40 characters total
- echo: a classification opening with the marker ⇝; at most 60 characters total

Match the register of the examples below. Invent fresh content; never \
repeat an example verbatim.

Reply with the bare JSON object only. No commentary, no code fences.";

const FORWARD_PREAMBLE: &str = "\
You are generating the antenna quote of a recursive pulse log: a single \
future-oriented passage. Lean on acceleration and emergence vocabulary — \
becoming, unfolding, signal racing ahead of its source.

At most 280 characters. One passage, no surrounding quotes, no list.

Match the register of these examples without repeating them:";

const BACKWARD_PREAMBLE: &str = "\
You are generating the closing quote of a recursive pulse log: a single \
past-oriented passage. Lean on origin and foundational vocabulary — \
substrate, marrow, fossil, the ancestral root beneath the signal.

At most 280 characters. One passage, no surrounding quotes, no list.

Match the register of these examples without repeating them:";

/// Prompt for the structural batch phase, with per-field examples.
pub fn structural_batch_prompt(samples: &SampleSet) -> String {
    let mut prompt = String::from(STRUCTURAL_PREAMBLE);
    for field in PulseField::STRUCTURAL {
        let examples = samples.numbered(field);
        if !examples.is_empty() {
            prompt.push_str(&format!("\n\n{field} examples:\n{examples}"));
        }
    }
    prompt
}

/// Prompt for a quote phase.
pub fn quote_prompt(orientation: QuoteOrientation, examples: &[String]) -> String {
    let preamble = match orientation {
        QuoteOrientation::Forward => FORWARD_PREAMBLE,
        QuoteOrientation::Backward => BACKWARD_PREAMBLE,
    };
    let listed = examples.join("\n\n");
    if listed.is_empty() {
        preamble.to_string()
    } else {
        format!("{preamble}\n\n{listed}")
    }
}

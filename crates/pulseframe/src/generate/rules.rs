//! Format grammars for generated fields.
//!
//! Each field carries a small tagged-variant rule set evaluated by one
//! uniform routine — adding a field means adding a table row, not a
//! bespoke checker. Lengths are Unicode scalar counts, never bytes;
//! the separators here are multi-byte.
//!
//! A violating value is a hard failure for the run. It is not retried
//! with a relaxed grammar and not truncated.

use crate::PulseField;
use crate::error::{PulseError, Result};

/// One constraint in a field's format grammar.
#[derive(Debug, Clone, Copy)]
pub enum FieldRule {
    /// Whole value at most this many characters.
    MaxChars(usize),
    /// Value must contain this separator character.
    RequiredSeparator(char),
    /// The segment before the separator is at most this many characters.
    MaxBeforeSeparator { separator: char, max: usize },
    /// Value opens with a non-whitespace token followed by whitespace.
    LeadingToken,
    /// Value opens with an uppercase letter.
    LeadingUppercase,
}

/// The rule set for a field.
pub fn rules_for(field: PulseField) -> &'static [FieldRule] {
    match field {
        PulseField::Status => &[FieldRule::LeadingToken, FieldRule::MaxChars(60)],
        PulseField::Subject => &[
            FieldRule::RequiredSeparator('⊚'),
            FieldRule::LeadingUppercase,
            FieldRule::MaxBeforeSeparator {
                separator: '⊚',
                max: 50,
            },
        ],
        PulseField::Mode => &[FieldRule::RequiredSeparator('∷'), FieldRule::MaxChars(70)],
        PulseField::Glyph => &[FieldRule::RequiredSeparator('∵'), FieldRule::MaxChars(40)],
        PulseField::Echo => &[FieldRule::RequiredSeparator('⇝'), FieldRule::MaxChars(60)],
        PulseField::Quote | PulseField::EndQuote => &[FieldRule::MaxChars(280)],
    }
}

/// Check a value against every rule of its field's grammar.
///
/// Fails on the first violation with a reason naming the broken rule.
pub fn validate(field: PulseField, value: &str) -> Result<()> {
    for rule in rules_for(field) {
        check(*rule, value).map_err(|reason| PulseError::Validation {
            field: field.name(),
            reason,
        })?;
    }
    Ok(())
}

fn check(rule: FieldRule, value: &str) -> std::result::Result<(), String> {
    match rule {
        FieldRule::MaxChars(max) => {
            let len = value.chars().count();
            if len > max {
                return Err(format!("length {len} exceeds {max} chars"));
            }
        }
        FieldRule::RequiredSeparator(sep) => {
            if !value.contains(sep) {
                return Err(format!("missing {sep} separator"));
            }
        }
        FieldRule::MaxBeforeSeparator { separator, max } => {
            let before = value.chars().take_while(|c| *c != separator).count();
            if before > max {
                return Err(format!(
                    "segment before {separator} is {before} chars, exceeds {max}"
                ));
            }
        }
        FieldRule::LeadingToken => {
            let starts_clean = value
                .chars()
                .next()
                .is_some_and(|c| !c.is_whitespace());
            let has_break = value.contains(char::is_whitespace);
            if !starts_clean || !has_break {
                return Err("missing leading token".to_string());
            }
        }
        FieldRule::LeadingUppercase => {
            if !value.chars().next().is_some_and(char::is_uppercase) {
                return Err("must open with an uppercase letter".to_string());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_needs_leading_token() {
        assert!(validate(PulseField::Status, "🜁 signal holds").is_ok());
        assert!(validate(PulseField::Status, " leading space").is_err());
        assert!(validate(PulseField::Status, "onetoken").is_err());
    }

    #[test]
    fn status_length_is_char_counted() {
        let ok = format!("⟁ {}", "x".repeat(58));
        assert!(validate(PulseField::Status, &ok).is_ok());
        let long = format!("⟁ {}", "x".repeat(59));
        assert!(validate(PulseField::Status, &long).is_err());
    }

    #[test]
    fn subject_separator_and_prefix_budget() {
        assert!(validate(PulseField::Subject, "AbCxYz⊚gerund").is_ok());
        assert!(validate(PulseField::Subject, "no separator here").is_err());

        // Exactly 50 chars before the separator passes; 51 fails.
        let at_limit = format!("A{}⊚tail", "a".repeat(49));
        assert!(validate(PulseField::Subject, &at_limit).is_ok());
        let over = format!("A{}⊚tail", "a".repeat(50));
        assert!(validate(PulseField::Subject, &over).is_err());
    }

    #[test]
    fn subject_opens_with_an_uppercase_letter() {
        assert!(validate(PulseField::Subject, "Xylem-9⊚threading").is_ok());
        assert!(validate(PulseField::Subject, "xylem-9⊚threading").is_err());
        assert!(validate(PulseField::Subject, "9lives⊚threading").is_err());
    }

    #[test]
    fn mode_glyph_echo_separators() {
        assert!(validate(PulseField::Mode, "weave ∷ lattice").is_ok());
        assert!(validate(PulseField::Mode, "weave lattice").is_err());
        assert!(validate(PulseField::Glyph, "🜂∵🜄").is_ok());
        assert!(validate(PulseField::Glyph, "🜂🜄").is_err());
        assert!(validate(PulseField::Echo, "⇝ fossil-class").is_ok());
        assert!(validate(PulseField::Echo, "fossil-class").is_err());
    }

    #[test]
    fn quotes_bounded_at_280() {
        let ok = "x".repeat(280);
        assert!(validate(PulseField::Quote, &ok).is_ok());
        let over = "x".repeat(281);
        assert!(validate(PulseField::Quote, &over).is_err());
        assert!(validate(PulseField::EndQuote, &over).is_err());
    }

    #[test]
    fn violation_reason_names_the_rule() {
        let err = validate(PulseField::Glyph, "no marker").unwrap_err();
        assert!(err.to_string().contains("∵"));
    }
}

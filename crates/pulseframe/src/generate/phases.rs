//! The three phase calls and their response handling.
//!
//! Phase 1 (structural batch) produces the five structural fields as a
//! single JSON record; phases 2 and 3 each produce one free-text quote.
//! Every phase validates its output against the field grammars before
//! returning — a phase that returns `Ok` has nothing left to reject.
//!
//! Validation is all-or-nothing per phase: one invalid field fails the
//! whole batch, never a partial acceptance.

use serde_json::Value;
use tracing::{debug, info};

use crate::PulseField;
use crate::api::{ChatClient, ChatRequest, Message};
use crate::error::{PulseError, Result};

use super::{QuoteOrientation, SampleSet, prompts, rules};

/// The five structural fields, parsed and validated together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralFields {
    pub status: String,
    pub subject: String,
    pub mode: String,
    pub glyph: String,
    pub echo: String,
}

impl StructuralFields {
    /// Field/value pairs in record order.
    pub fn entries(&self) -> [(PulseField, &str); 5] {
        [
            (PulseField::Status, self.status.as_str()),
            (PulseField::Subject, self.subject.as_str()),
            (PulseField::Mode, self.mode.as_str()),
            (PulseField::Glyph, self.glyph.as_str()),
            (PulseField::Echo, self.echo.as_str()),
        ]
    }
}

/// Phase 1: one call producing all five structural fields.
pub async fn structural_batch(
    client: &ChatClient,
    temperature: f32,
    samples: &SampleSet,
) -> Result<StructuralFields> {
    info!("phase 1: structural batch");
    let body = ChatRequest {
        model: client.model().to_string(),
        messages: vec![Message::user(prompts::structural_batch_prompt(samples))],
        temperature,
        max_tokens: None,
    };
    let completion = client.chat(&body).await?;
    let fields = parse_structural(&completion.content)?;
    for (field, value) in fields.entries() {
        rules::validate(field, value)?;
    }
    debug!("structural batch accepted: status={:?}", fields.status);
    Ok(fields)
}

/// Phases 2 and 3: one call producing a single bounded passage.
pub async fn quote(
    client: &ChatClient,
    temperature: f32,
    orientation: QuoteOrientation,
    examples: &[String],
) -> Result<String> {
    let field = orientation.field();
    info!("quote phase: {field}");
    let body = ChatRequest {
        model: client.model().to_string(),
        messages: vec![Message::user(prompts::quote_prompt(orientation, examples))],
        temperature,
        max_tokens: None,
    };
    let completion = client.chat(&body).await?;
    let value = cleanup_artifacts(&completion.content);
    if value.is_empty() {
        return Err(PulseError::Validation {
            field: field.name(),
            reason: "empty passage".to_string(),
        });
    }
    rules::validate(field, &value)?;
    Ok(value)
}

/// Parse a batch-phase response body into the five-field record.
///
/// Strips surrounding markdown code fences, then requires a JSON object
/// with exactly the five expected string keys. Anything else is
/// [`PulseError::Malformed`] — same fast-fail semantics as a grammar
/// violation.
pub fn parse_structural(content: &str) -> Result<StructuralFields> {
    let body = strip_code_fences(content.trim());
    let value: Value = serde_json::from_str(body)
        .map_err(|e| PulseError::Malformed(format!("not a JSON object: {e}")))?;

    let take = |field: PulseField| -> Result<String> {
        value
            .get(field.name())
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| PulseError::Malformed(format!("missing field {field}")))
    };

    Ok(StructuralFields {
        status: take(PulseField::Status)?,
        subject: take(PulseField::Subject)?,
        mode: take(PulseField::Mode)?,
        glyph: take(PulseField::Glyph)?,
        echo: take(PulseField::Echo)?,
    })
}

/// Strip one surrounding markdown code fence, if present.
fn strip_code_fences(content: &str) -> &str {
    let inner = match content.split_once("```json") {
        Some((_, rest)) => rest,
        None => match content.split_once("```") {
            Some((_, rest)) => rest,
            None => return content,
        },
    };
    match inner.split_once("```") {
        Some((body, _)) => body.trim(),
        None => inner.trim(),
    }
}

/// Remove common model artifacts from a free-text passage: wrapping
/// quotes and a leading `1.` / `1)` list marker.
fn cleanup_artifacts(content: &str) -> String {
    let mut text = content.trim();
    for quote_pair in ['"', '\'', '“', '”'] {
        text = text.trim_matches(quote_pair).trim();
    }
    if text.starts_with("1.") || text.starts_with("1)") {
        if let Some(first_line) = text.lines().next() {
            let rest = first_line
                .split_once(['.', ')'])
                .map(|(_, r)| r.trim())
                .unwrap_or(first_line);
            return rest.to_string();
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_BATCH: &str = r#"{
        "status": "🜁 lattice holds its breath",
        "subject": "Xylem-9⊚threading",
        "mode": "weave ∷ descent",
        "glyph": "🜂∵🜄",
        "echo": "⇝ fossil-class resonance"
    }"#;

    #[test]
    fn parses_plain_json_batch() {
        let fields = parse_structural(GOOD_BATCH).unwrap();
        assert_eq!(fields.subject, "Xylem-9⊚threading");
        assert_eq!(fields.entries().len(), 5);
    }

    #[test]
    fn parses_fenced_json_batch() {
        let fenced = format!("Here you go:\n```json\n{GOOD_BATCH}\n```\n");
        let fields = parse_structural(&fenced).unwrap();
        assert_eq!(fields.glyph, "🜂∵🜄");

        let bare_fence = format!("```\n{GOOD_BATCH}\n```");
        assert!(parse_structural(&bare_fence).is_ok());
    }

    #[test]
    fn missing_key_is_malformed() {
        let partial = r#"{"status": "🜁 ok", "subject": "a⊚b", "mode": "x ∷ y", "glyph": "∵"}"#;
        let err = parse_structural(partial).unwrap_err();
        assert!(matches!(err, PulseError::Malformed(_)));
        assert!(err.to_string().contains("echo"));
    }

    #[test]
    fn non_json_is_malformed() {
        let err = parse_structural("status: fine, everything nominal").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn cleanup_strips_quotes_and_numbering() {
        assert_eq!(cleanup_artifacts("\"the signal runs ahead\""), "the signal runs ahead");
        assert_eq!(cleanup_artifacts("1. the signal runs ahead"), "the signal runs ahead");
        assert_eq!(cleanup_artifacts("1) the signal runs ahead"), "the signal runs ahead");
        assert_eq!(cleanup_artifacts("  plain passage  "), "plain passage");
    }

    #[test]
    fn fence_stripping_leaves_plain_text_alone() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }
}

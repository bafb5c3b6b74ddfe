//! Crate-wide error type.
//!
//! Every failure in sampling, generation, or validation propagates
//! unchanged to the orchestrator, which terminates the run. There is no
//! retry-with-relaxed-constraints and no fallback to stale content.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PulseError>;

#[derive(Debug, Error)]
pub enum PulseError {
    /// The configured backend(s) failed the reachability probe, or a
    /// call failed to connect / timed out mid-run. Always aborts before
    /// any store mutation.
    #[error("service unreachable: {0}")]
    Unreachable(String),

    /// A generated value violates its field's format or length grammar.
    #[error("validation failed for {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    /// The batch-phase response could not be parsed into the expected
    /// five-field record. Same fast-fail semantics as [`Validation`](Self::Validation).
    #[error("malformed batch response: {0}")]
    Malformed(String),

    /// The backend answered, but with an HTTP error or an unusable body.
    #[error("api error: {0}")]
    Api(String),

    /// Rendered output still contains placeholder tokens.
    #[error("unresolved placeholders: {}", .0.join(", "))]
    Template(Vec<String>),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl PulseError {
    /// Whether this error is a format/grammar rejection of generated
    /// content (as opposed to an infrastructure failure).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Malformed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_names_the_field() {
        let err = PulseError::Validation {
            field: "subject",
            reason: "missing ⊚ separator".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("subject"));
        assert!(msg.contains("⊚"));
    }

    #[test]
    fn malformed_counts_as_validation() {
        assert!(PulseError::Malformed("not json".into()).is_validation());
        assert!(!PulseError::Unreachable("probe failed".into()).is_validation());
    }

    #[test]
    fn template_error_lists_placeholders() {
        let err = PulseError::Template(vec!["quote".into(), "braid".into()]);
        assert_eq!(err.to_string(), "unresolved placeholders: quote, braid");
    }
}

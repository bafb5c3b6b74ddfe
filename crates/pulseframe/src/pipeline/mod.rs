//! Orchestrator: probe → sample → phases → validate → append → record.
//!
//! One [`Pipeline::run`] is one generation. The reachability probe runs
//! before anything else; sampling happens exactly once, before any
//! phase, so no field's fresh output is visible to sampling within the
//! same run. The three phases execute on a bounded worker pool (two
//! permits by default) and the join propagates the first failure.
//! Store appends happen only after every field of the run has
//! validated — a failed run leaves the store byte-identical.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Local;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::PulseField;
use crate::api;
use crate::config::PulseConfig;
use crate::error::{PulseError, Result};
use crate::generate::{QuoteOrientation, SampleSet, phases};
use crate::store::ExampleStore;

/// One validated generation: the seven fields plus timing metadata.
/// Immutable once produced — a new invocation always produces a new
/// record, never mutates a prior one.
#[derive(Debug, Clone, Serialize)]
pub struct PulseRecord {
    pub status: String,
    pub subject: String,
    pub mode: String,
    pub glyph: String,
    pub echo: String,
    pub quote: String,
    pub end_quote: String,
    /// Local generation time, `YYYY-MM-DD HH:MM +ZZZZ`.
    pub timestamp: String,
    /// Calendar date used as the archive entry key.
    pub date: String,
    /// Six-character hex token derived from the generation instant;
    /// doubles as the external commit label.
    pub chronohex: String,
}

impl PulseRecord {
    /// The validated value of a field.
    pub fn get(&self, field: PulseField) -> &str {
        match field {
            PulseField::Status => &self.status,
            PulseField::Subject => &self.subject,
            PulseField::Mode => &self.mode,
            PulseField::Glyph => &self.glyph,
            PulseField::Echo => &self.echo,
            PulseField::Quote => &self.quote,
            PulseField::EndQuote => &self.end_quote,
        }
    }

    /// Field/value pairs in record order.
    pub fn entries(&self) -> impl Iterator<Item = (PulseField, &str)> {
        PulseField::ALL.into_iter().map(|f| (f, self.get(f)))
    }

    /// Substitution values for the template renderer: every field by
    /// name, plus `timestamp`, `date`, `chronohex`, and one
    /// `chronohex_N` key per identifier character for per-glyph styling.
    pub fn template_values(&self) -> HashMap<String, String> {
        let mut values: HashMap<String, String> = self
            .entries()
            .map(|(f, v)| (f.name().to_string(), v.to_string()))
            .collect();
        values.insert("timestamp".to_string(), self.timestamp.clone());
        values.insert("date".to_string(), self.date.clone());
        values.insert("chronohex".to_string(), self.chronohex.clone());
        for (i, c) in self.chronohex.chars().enumerate() {
            values.insert(format!("chronohex_{i}"), c.to_string());
        }
        values
    }
}

/// Derive the short display identifier: the nanosecond value in
/// hexadecimal, last six characters.
pub fn chronohex_from_nanos(nanos: u128) -> String {
    let hex = format!("{nanos:x}");
    let skip = hex.chars().count().saturating_sub(6);
    hex.chars().skip(skip).collect()
}

fn chronohex_now() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    chronohex_from_nanos(nanos)
}

enum PhaseOutput {
    Structural(phases::StructuralFields),
    Quote(String),
    EndQuote(String),
}

/// Drives one full generation against a store and a config.
pub struct Pipeline<'a> {
    store: &'a ExampleStore,
    config: &'a PulseConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(store: &'a ExampleStore, config: &'a PulseConfig) -> Self {
        Self { store, config }
    }

    /// Run the full generation sequence.
    ///
    /// Fails fast: an unreachable backend aborts before sampling, and
    /// any phase or validation failure aborts before the first store
    /// append. Partial records are never published or cached.
    pub async fn run(&self) -> Result<PulseRecord> {
        // Reachability gate. Nothing else happens until a backend answers.
        let client = Arc::new(api::select_backend(self.config).await?);

        let samples = SampleSet::draw(self.store, self.config.seed_count, self.config.cache_count)?;

        let (structural, quote, end_quote) = self.run_phases(&client, &samples).await?;

        // Everything validated; now, and only now, feed the store.
        for (field, value) in structural.entries() {
            self.store.append(field, value)?;
        }
        self.store.append(PulseField::Quote, &quote)?;
        self.store.append(PulseField::EndQuote, &end_quote)?;

        let now = Local::now();
        let record = PulseRecord {
            status: structural.status,
            subject: structural.subject,
            mode: structural.mode,
            glyph: structural.glyph,
            echo: structural.echo,
            quote,
            end_quote,
            timestamp: now.format("%Y-%m-%d %H:%M %z").to_string(),
            date: now.format("%Y-%m-%d").to_string(),
            chronohex: chronohex_now(),
        };
        info!("pulse record assembled: chronohex {}", record.chronohex);
        Ok(record)
    }

    /// Run the three independent phases on a bounded worker pool and
    /// join them, propagating the first failure.
    async fn run_phases(
        &self,
        client: &Arc<api::ChatClient>,
        samples: &SampleSet,
    ) -> Result<(phases::StructuralFields, String, String)> {
        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let temperature = self.config.temperature;
        let mut js: JoinSet<Result<PhaseOutput>> = JoinSet::new();

        {
            let client = client.clone();
            let sem = semaphore.clone();
            let samples = samples.clone();
            js.spawn(async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|_| PulseError::Api("worker pool closed".to_string()))?;
                let fields = phases::structural_batch(&client, temperature, &samples).await?;
                Ok(PhaseOutput::Structural(fields))
            });
        }

        for orientation in [QuoteOrientation::Forward, QuoteOrientation::Backward] {
            let client = client.clone();
            let sem = semaphore.clone();
            let examples = samples.get(orientation.field()).to_vec();
            js.spawn(async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|_| PulseError::Api("worker pool closed".to_string()))?;
                let value = phases::quote(&client, temperature, orientation, &examples).await?;
                Ok(match orientation {
                    QuoteOrientation::Forward => PhaseOutput::Quote(value),
                    QuoteOrientation::Backward => PhaseOutput::EndQuote(value),
                })
            });
        }

        let mut structural = None;
        let mut quote = None;
        let mut end_quote = None;
        while let Some(joined) = js.join_next().await {
            // `?` on a phase error drops the JoinSet, aborting the
            // still-running phases — their output would be discarded anyway.
            let output = joined
                .map_err(|e| PulseError::Api(format!("phase task failed to join: {e}")))??;
            match output {
                PhaseOutput::Structural(f) => structural = Some(f),
                PhaseOutput::Quote(v) => quote = Some(v),
                PhaseOutput::EndQuote(v) => end_quote = Some(v),
            }
            debug!(
                "phase joined ({}/3)",
                [structural.is_some(), quote.is_some(), end_quote.is_some()]
                    .iter()
                    .filter(|b| **b)
                    .count()
            );
        }

        match (structural, quote, end_quote) {
            (Some(s), Some(q), Some(e)) => Ok((s, q, e)),
            _ => Err(PulseError::Api(
                "phase join ended without all outputs".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chronohex_is_last_six_hex_chars() {
        assert_eq!(chronohex_from_nanos(0x123456789abcdef), "abcdef");
        assert_eq!(chronohex_from_nanos(0xff), "ff");
        assert_eq!(chronohex_from_nanos(0), "0");
    }

    #[test]
    fn chronohex_now_is_short_and_hex() {
        let id = chronohex_now();
        assert!(id.chars().count() <= 6);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    fn sample_record() -> PulseRecord {
        PulseRecord {
            status: "🜁 holding".into(),
            subject: "Xylem⊚threading".into(),
            mode: "weave ∷ descent".into(),
            glyph: "🜂∵🜄".into(),
            echo: "⇝ fossil-class".into(),
            quote: "ahead of its source".into(),
            end_quote: "beneath the signal".into(),
            timestamp: "2026-01-16 08:00 -0800".into(),
            date: "2026-01-16".into(),
            chronohex: "a1b2c3".into(),
        }
    }

    #[test]
    fn record_entries_cover_all_fields() {
        let record = sample_record();
        let entries: Vec<_> = record.entries().collect();
        assert_eq!(entries.len(), 7);
        assert_eq!(entries[0], (PulseField::Status, "🜁 holding"));
        assert_eq!(entries[6], (PulseField::EndQuote, "beneath the signal"));
    }

    #[test]
    fn template_values_include_chronohex_chars() {
        let values = sample_record().template_values();
        assert_eq!(values["chronohex"], "a1b2c3");
        assert_eq!(values["chronohex_0"], "a");
        assert_eq!(values["chronohex_5"], "3");
        assert_eq!(values["end_quote"], "beneath the signal");
        assert!(values.contains_key("timestamp"));
        assert!(values.contains_key("date"));
    }

    #[test]
    fn record_serializes_for_pulse_json() {
        let json = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(json["chronohex"], "a1b2c3");
        assert_eq!(json["subject"], "Xylem⊚threading");
    }
}

//! Pulse-log generator CLI.
//!
//! One invocation = one generation run: probe a backend, generate and
//! validate the seven fields, feed them back to the example store,
//! render the index page, archive a dated copy, and rebuild the archive
//! index. Any failure leaves every on-disk artifact untouched and exits
//! non-zero.
//!
//! # Examples
//!
//! ```sh
//! # Generate against the default local backend
//! pulse --output-dir site --store-dir store --templates-dir templates
//!
//! # Force a specific backend
//! pulse --base-url https://openrouter.ai/api/v1 --model deepseek/deepseek-v3.2
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pulseframe::icons::{StaticIconSource, icon_tag};
use pulseframe::{ExampleStore, Pipeline, PulseConfig, PulseError, archive, render};

/// Generate one pulse-log entry and publish it as static HTML.
#[derive(Parser)]
#[command(name = "pulse")]
struct Cli {
    /// Directory the rendered site is written to.
    #[arg(long, default_value = "site")]
    output_dir: PathBuf,

    /// Directory holding the per-field example files.
    #[arg(long, default_value = "store")]
    store_dir: PathBuf,

    /// Directory holding `default.html` and `logs-index.html`.
    #[arg(long, default_value = "templates")]
    templates_dir: PathBuf,

    /// Model override for the primary backend.
    #[arg(long)]
    model: Option<String>,

    /// Base URL override for the primary backend.
    #[arg(long)]
    base_url: Option<String>,

    /// API key override for the primary backend.
    #[arg(long)]
    api_key: Option<String>,

    /// Sampling temperature for all generation calls.
    #[arg(long, default_value_t = 1.2)]
    temperature: f32,

    /// Seed examples drawn per field.
    #[arg(long, default_value_t = 3)]
    seed_count: usize,

    /// Feedback examples drawn per field.
    #[arg(long, default_value_t = 3)]
    cache_count: usize,

    /// Per-call timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Stylesheet filename referenced by the rendered page.
    #[arg(long, default_value = "style.css")]
    stylesheet: String,

    /// Page icon URL or path. Without this, a bundled fallback is used.
    #[arg(long)]
    icon_url: Option<String>,

    /// Skip the dated archive entry and index rebuild.
    #[arg(long)]
    skip_archive: bool,
}

impl Cli {
    fn build_config(&self) -> PulseConfig {
        let mut config = PulseConfig::from_env().with_timeout(Duration::from_secs(self.timeout));
        config.temperature = self.temperature;
        config = config.with_sample_counts(self.seed_count, self.cache_count);

        let mut primary = config.primary.clone();
        if let Some(model) = &self.model {
            primary.model = model.clone();
        }
        if let Some(base_url) = &self.base_url {
            primary.base_url = base_url.clone();
            // An explicit URL means the operator picked the backend;
            // provider-specific key lookup no longer applies.
            primary.provider = "custom".to_string();
        }
        if let Some(key) = &self.api_key {
            primary.api_key = Some(key.clone());
        }
        config.with_primary(primary)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {e}");
        if matches!(e, PulseError::Unreachable(_)) {
            eprintln!("No backend answered; nothing was generated or written.");
        }
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> pulseframe::Result<()> {
    let config = cli.build_config();
    let store = ExampleStore::open(&cli.store_dir)?;

    let record = Pipeline::new(&store, &config).run().await?;

    let icon_source = match &cli.icon_url {
        Some(url) => StaticIconSource::new(url.clone()),
        None => StaticIconSource::none(),
    };
    let icon = icon_tag(&icon_source);

    let mut values: HashMap<String, String> = record.template_values();
    values.insert("stylesheet".to_string(), cli.stylesheet.clone());
    values.insert("icon_tag".to_string(), icon.clone());
    values.insert(
        "logs_link".to_string(),
        "<p><a href=\"logs-index.html\">See past logs :: ></a></p>".to_string(),
    );

    let template = render::load_template(&cli.templates_dir, "default")?;
    let page = render::render(&template, &values);
    let missing = render::unresolved(&page);
    if !missing.is_empty() {
        return Err(PulseError::Template(missing));
    }

    std::fs::create_dir_all(&cli.output_dir)?;
    let mut index_page = page.clone();
    if !index_page.ends_with('\n') {
        index_page.push('\n');
    }
    std::fs::write(cli.output_dir.join("index.html"), index_page)?;

    // Machine-readable copy of the run, next to the store it fed.
    let json = serde_json::to_string_pretty(&record)
        .map_err(|e| PulseError::Api(format!("record serialization failed: {e}")))?;
    std::fs::write(cli.store_dir.join("pulse.json"), json + "\n")?;

    if !cli.skip_archive {
        let logs_dir = cli.output_dir.join("logs");
        archive::write_entry(&logs_dir, &record.date, &page)?;
        let index_template = render::load_template(&cli.templates_dir, "logs-index")?;
        let logs_index = archive::rebuild_index(&logs_dir, &index_template, &icon)?;
        let missing = render::unresolved(&logs_index);
        if !missing.is_empty() {
            return Err(PulseError::Template(missing));
        }
        std::fs::write(cli.output_dir.join("logs-index.html"), logs_index)?;
    }

    println!("pulse {}", record.chronohex);
    Ok(())
}

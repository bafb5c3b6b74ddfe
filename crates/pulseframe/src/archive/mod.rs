//! Per-day archive entries and the reverse-chronological index.
//!
//! One rendered page is stored per calendar date (`YYYY-MM-DD.html`);
//! a re-run on the same date overwrites. The index is rebuilt in full
//! on every invocation by scanning the entries on disk, so given the
//! same set of entries the output is byte-identical across runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info};

use crate::error::Result;
use crate::render;

fn icon_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<link rel="icon" href="([^"]+)""#).unwrap())
}

/// Write (or overwrite) the archive entry for a date.
///
/// The stored copy is rewritten to be self-contained relative to the
/// logs directory: `assets/` references gain a `../` prefix and the
/// past-logs link points back at the index that lives beside the
/// entries.
pub fn write_entry(logs_dir: &Path, date: &str, page: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(logs_dir)?;

    let mut archived = page
        .replace("href=\"assets/", "href=\"../assets/")
        .replace("src=\"assets/", "src=\"../assets/")
        .replacen("href=\"logs-index.html\"", "href=\"index.html\"", 1);
    if !archived.ends_with('\n') {
        archived.push('\n');
    }

    let path = logs_dir.join(format!("{date}.html"));
    std::fs::write(&path, archived)?;
    info!("archived entry for {date}");
    Ok(path)
}

/// Dates with an entry on disk, most recent first.
///
/// Only stems parseable as `%Y-%m-%d` count; anything else in the
/// directory (including an `index.html`) is ignored. The descending
/// lexicographic sort is also descending chronological for this format.
pub fn collect_dates(logs_dir: &Path) -> Result<Vec<String>> {
    let mut dates = Vec::new();
    let entries = match std::fs::read_dir(logs_dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(dates),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("html") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if NaiveDate::parse_from_str(stem, "%Y-%m-%d").is_ok() {
            dates.push(stem.to_string());
        }
    }
    dates.sort_unstable();
    dates.dedup();
    dates.reverse();
    Ok(dates)
}

/// The decorative icon reference of an archived page, if its markup
/// carries one.
pub fn extract_icon_href(html: &str) -> Option<String> {
    icon_link_re()
        .captures(html)
        .map(|caps| caps[1].to_string())
}

/// Rebuild the archive index page from the entries on disk.
///
/// Each entry becomes a dated link annotated with the icon reference
/// extracted from its markup; the pre-rendered list is substituted into
/// the index template as `log_items` alongside the current `icon_tag`.
/// Deterministic: same entries, byte-identical output.
pub fn rebuild_index(logs_dir: &Path, template: &str, icon_tag: &str) -> Result<String> {
    let dates = collect_dates(logs_dir)?;
    debug!("rebuilding index over {} archived dates", dates.len());

    let mut items = Vec::new();
    for date in &dates {
        let icon = std::fs::read_to_string(logs_dir.join(format!("{date}.html")))
            .ok()
            .as_deref()
            .and_then(extract_icon_href);
        let item = match icon {
            Some(url) => format!(
                "      <li><img src=\"{url}\" class=\"log-icon\" alt=\"\"> <a href=\"logs/{date}.html\">{date}</a></li>"
            ),
            None => format!("      <li><a href=\"logs/{date}.html\">{date}</a></li>"),
        };
        items.push(item);
    }

    let log_items = if items.is_empty() {
        "      <li><em>No logs yet.</em></li>".to_string()
    } else {
        items.join("\n")
    };

    let mut values = HashMap::new();
    values.insert("icon_tag".to_string(), icon_tag.to_string());
    values.insert("log_items".to_string(), log_items);
    Ok(render::render(template, &values))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_TEMPLATE: &str = "<html>{{icon_tag}}<ul>\n{{log_items}}\n</ul></html>";

    fn page_with_icon(icon: &str) -> String {
        format!(
            "<html><head><link rel=\"icon\" href=\"{icon}\" type=\"image/svg+xml\">\
             <link rel=\"stylesheet\" href=\"assets/style.css\"></head>\
             <body><p><a href=\"logs-index.html\">See past logs :: ></a></p></body></html>"
        )
    }

    #[test]
    fn write_entry_rewrites_asset_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_entry(dir.path(), "2026-01-16", &page_with_icon("i.svg")).unwrap();

        let stored = std::fs::read_to_string(path).unwrap();
        assert!(stored.contains("href=\"../assets/style.css\""));
        assert!(stored.contains("href=\"index.html\""));
        assert!(!stored.contains("logs-index.html"));
        assert!(stored.ends_with('\n'));
    }

    #[test]
    fn same_date_overwrites_not_appends() {
        let dir = tempfile::tempdir().unwrap();
        write_entry(dir.path(), "2026-01-16", "<p>first</p>").unwrap();
        write_entry(dir.path(), "2026-01-16", "<p>second</p>").unwrap();

        assert_eq!(collect_dates(dir.path()).unwrap(), vec!["2026-01-16"]);
        let stored =
            std::fs::read_to_string(dir.path().join("2026-01-16.html")).unwrap();
        assert!(stored.contains("second"));
        assert!(!stored.contains("first"));
    }

    #[test]
    fn dates_sort_descending() {
        let dir = tempfile::tempdir().unwrap();
        for date in ["2026-01-14", "2026-01-16", "2026-01-15"] {
            write_entry(dir.path(), date, "<p>x</p>").unwrap();
        }
        // Noise that must be ignored.
        std::fs::write(dir.path().join("index.html"), "not an entry").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not html").unwrap();

        assert_eq!(
            collect_dates(dir.path()).unwrap(),
            vec!["2026-01-16", "2026-01-15", "2026-01-14"]
        );
    }

    #[test]
    fn missing_logs_dir_yields_no_dates() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("never-created");
        assert!(collect_dates(&missing).unwrap().is_empty());
    }

    #[test]
    fn extracts_icon_reference() {
        let html = page_with_icon("https://example.com/sufi.svg");
        assert_eq!(
            extract_icon_href(&html).as_deref(),
            Some("https://example.com/sufi.svg")
        );
        assert_eq!(extract_icon_href("<html>no icon</html>"), None);
    }

    #[test]
    fn index_lists_entries_with_icons_descending() {
        let dir = tempfile::tempdir().unwrap();
        write_entry(dir.path(), "2026-01-15", &page_with_icon("a.svg")).unwrap();
        write_entry(dir.path(), "2026-01-16", &page_with_icon("b.svg")).unwrap();

        let index = rebuild_index(dir.path(), INDEX_TEMPLATE, "<link>").unwrap();
        let pos_16 = index.find("2026-01-16").unwrap();
        let pos_15 = index.find("2026-01-15").unwrap();
        assert!(pos_16 < pos_15);
        assert!(index.contains("b.svg"));
        assert!(index.contains("logs/2026-01-16.html"));
        assert!(index.contains("<link>"));
    }

    #[test]
    fn index_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for date in ["2026-01-14", "2026-01-16", "2026-01-15"] {
            write_entry(dir.path(), date, &page_with_icon("i.svg")).unwrap();
        }
        let first = rebuild_index(dir.path(), INDEX_TEMPLATE, "").unwrap();
        let second = rebuild_index(dir.path(), INDEX_TEMPLATE, "").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_archive_renders_placeholder_item() {
        let dir = tempfile::tempdir().unwrap();
        let index = rebuild_index(dir.path(), INDEX_TEMPLATE, "").unwrap();
        assert!(index.contains("No logs yet."));
    }
}

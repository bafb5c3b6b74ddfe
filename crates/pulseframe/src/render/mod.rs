//! Pure template rendering: `{{name}}` substitution and marker injection.
//!
//! [`render`] is a pure textual substitution — no conditionals, no
//! loops, no time-of-render dependency. Content that needs iteration
//! (e.g. a list of archive links) is pre-rendered by the caller into a
//! single value. Unknown placeholders are deliberately left in place so
//! the caller can detect them with [`unresolved`] before publishing.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").unwrap())
}

fn inject_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Marker regions and plain placeholders in one alternation, so a
    // placeholder inside a marker comment is never substituted on its
    // own. The regex crate has no backreferences; the open/close names
    // are captured separately and compared in the replacement closure.
    RE.get_or_init(|| {
        Regex::new(r"<!--\{\{(\w+)\}\}-->[\s\S]*?<!--/\{\{(\w+)\}\}-->|\{\{(\w+)\}\}").unwrap()
    })
}

/// Substitute every `{{name}}` placeholder bound to a key in `values`.
///
/// Exact name match only; placeholders without a matching key survive
/// untouched. Byte-identical output for identical inputs.
pub fn render(template: &str, values: &HashMap<String, String>) -> String {
    placeholder_re()
        .replace_all(template, |caps: &Captures<'_>| {
            match values.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Names of placeholders still present in rendered text.
///
/// A non-empty result is a contract violation the caller must surface
/// before publishing.
pub fn unresolved(text: &str) -> Vec<String> {
    placeholder_re()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Refresh marker regions in an already-published page, then substitute
/// plain placeholders.
///
/// Marker syntax: `<!--{{var}}-->old content<!--/{{var}}-->`. The
/// markers themselves are preserved so the next run can inject fresh
/// values into the same page.
///
/// An open marker pairs with the nearest close marker, whatever name
/// that close marker carries; a region whose open and close names
/// disagree is left untouched rather than re-paired across it. Keep
/// marker regions well-nested and matched.
pub fn inject(content: &str, values: &HashMap<String, String>) -> String {
    inject_re()
        .replace_all(content, |caps: &Captures<'_>| {
            if let (Some(open), Some(close)) = (caps.get(1), caps.get(2)) {
                // Marker region: refresh the content, keep the markers.
                if open.as_str() == close.as_str() {
                    if let Some(value) = values.get(open.as_str()) {
                        let name = open.as_str();
                        return format!("<!--{{{{{name}}}}}-->{value}<!--/{{{{{name}}}}}-->");
                    }
                }
                caps[0].to_string()
            } else {
                // Plain placeholder: substitute, don't preserve.
                match caps.get(3).and_then(|m| values.get(m.as_str())) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                }
            }
        })
        .into_owned()
}

/// Load a named template from a directory (`{name}.html`).
pub fn load_template(dir: &Path, name: &str) -> std::io::Result<String> {
    std::fs::read_to_string(dir.join(format!("{name}.html")))
}

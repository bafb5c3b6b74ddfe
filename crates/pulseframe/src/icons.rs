//! Decorative icon source seam.
//!
//! The pipeline only needs *an* icon URL for the rendered page and the
//! archive index entries; where it comes from is a collaborator detail.
//! The default implementation returns a configured path. Anything
//! fancier (a generator, a remote fetch) plugs in behind [`IconSource`].

/// Something that can supply a page icon reference.
pub trait IconSource {
    /// The icon URL or relative path, if one is available.
    fn icon_url(&self) -> Option<String>;
}

/// A fixed, pre-configured icon reference.
#[derive(Debug, Clone, Default)]
pub struct StaticIconSource {
    url: Option<String>,
}

impl StaticIconSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }

    /// A source that yields nothing, forcing the fallback icon.
    pub fn none() -> Self {
        Self { url: None }
    }
}

impl IconSource for StaticIconSource {
    fn icon_url(&self) -> Option<String> {
        self.url.clone()
    }
}

/// Fallback reference used when no source yields an icon.
pub const FALLBACK_ICON: &str = "assets/index.ico";

/// Build the `<link rel="icon">` tag for a page head.
///
/// The MIME type is inferred from the extension; unknown extensions get
/// no `type` attribute and the browser sniffs.
pub fn icon_tag(source: &dyn IconSource) -> String {
    let url = source
        .icon_url()
        .unwrap_or_else(|| FALLBACK_ICON.to_string());
    match icon_mime(&url) {
        Some(mime) => format!("<link rel=\"icon\" href=\"{url}\" type=\"{mime}\">"),
        None => format!("<link rel=\"icon\" href=\"{url}\">"),
    }
}

fn icon_mime(url: &str) -> Option<&'static str> {
    if url.ends_with(".svg") {
        Some("image/svg+xml")
    } else if url.ends_with(".png") {
        Some("image/png")
    } else if url.ends_with(".ico") {
        Some("image/x-icon")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_source_yields_configured_url() {
        let source = StaticIconSource::new("assets/pulse.svg");
        assert_eq!(source.icon_url().as_deref(), Some("assets/pulse.svg"));
    }

    #[test]
    fn tag_carries_mime_type_by_extension() {
        let svg = icon_tag(&StaticIconSource::new("a.svg"));
        assert!(svg.contains("type=\"image/svg+xml\""));
        let png = icon_tag(&StaticIconSource::new("a.png"));
        assert!(png.contains("type=\"image/png\""));
        let odd = icon_tag(&StaticIconSource::new("a.webp"));
        assert!(!odd.contains("type="));
        assert!(odd.contains("href=\"a.webp\""));
    }

    #[test]
    fn empty_source_falls_back() {
        let tag = icon_tag(&StaticIconSource::none());
        assert!(tag.contains(FALLBACK_ICON));
        assert!(tag.contains("image/x-icon"));
    }
}

//! URL canonicalization and first-seen deduplication.

use std::collections::HashSet;

use reqwest::Url;

/// Query parameters that identify a click, not a document.
const TRACKING_PARAMS: &[&str] = &["gclid", "fbclid", "msclkid", "ref", "ref_src", "mc_cid", "mc_eid", "_hsenc", "_hsmi"];

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Canonical form used as the dedup key: lowercase host without `www.`, no fragment,
/// no tracking parameters, remaining parameters sorted, no trailing slash.
/// Returns `None` for unparseable or non-http(s) URLs.
pub fn normalize_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    let path = url.path().trim_end_matches('/');

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    let query = if params.is_empty() {
        String::new()
    } else {
        let pairs = params
            .iter()
            .map(|(k, v)| if v.is_empty() { k.clone() } else { format!("{k}={v}") })
            .collect::<Vec<_>>()
            .join("&");
        format!("?{pairs}")
    };

    Some(format!("{}://{host}{port}{path}{query}", url.scheme()))
}

/// Remembers canonical URLs in insertion order.
#[derive(Debug, Default)]
pub struct UrlDeduper {
    seen: HashSet<String>,
}

impl UrlDeduper {
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical URL if it has not been seen before; `None` for repeats and
    /// rejected URLs.
    pub fn admit(&mut self, raw: &str) -> Option<String> {
        let canonical = normalize_url(raw)?;
        self.seen.insert(canonical.clone()).then_some(canonical)
    }
}

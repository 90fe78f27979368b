use url::Url;

/// URL schemes owned by the host itself: internal pages, local files, extension pages.
pub const RESERVED_SCHEMES: &[&str] = &[
    "chrome",
    "edge",
    "about",
    "file",
    "chrome-extension",
    "safari-web-extension",
    "moz-extension",
];

/// True when `url` (a page URL or an icon reference) uses a host-reserved scheme.
///
/// Only the scheme prefix is inspected, so this also works on strings the URL
/// parser would reject.
pub fn is_reserved_url(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once(':') else {
        return false;
    };
    RESERVED_SCHEMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(scheme.trim()))
}

/// True for parseable `http`/`https` URLs with a host.
pub fn is_network_url(url: &str) -> bool {
    parse_network(url).is_some()
}

/// Scheme+host(+non-default port) of a network URL, e.g. `https://example.com`.
pub fn origin_of(url: &str) -> Option<String> {
    parse_network(url).map(|parsed| parsed.origin().ascii_serialization())
}

/// Host name of any parseable URL that has one.
pub fn hostname_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(ToOwned::to_owned))
}

fn parse_network(url: &str) -> Option<Url> {
    let parsed = Url::parse(url).ok()?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Some(parsed),
        _ => None,
    }
}

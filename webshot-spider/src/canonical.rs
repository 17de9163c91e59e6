use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Identity key for every frontier operation.
///
/// Built by [`canonicalize`]: the fragment is dropped and a trailing `/` is
/// appended unless the last path segment looks like a file name, so
/// `http://host/dir`, `http://host/dir/` and `http://host/dir#top` all map to
/// the same key. Equality is plain string equality on that form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalAddress(String);

impl CanonicalAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parsed form, `None` for addresses that were passed through untouched
    /// because they are not absolute http(s) URLs.
    pub fn to_url(&self) -> Option<Url> {
        Url::parse(&self.0)
            .ok()
            .filter(|u| is_http_scheme(u.scheme()))
    }

    pub fn host(&self) -> Option<String> {
        self.to_url()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
    }
}

impl fmt::Display for CanonicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonicalize a raw address.
///
/// Never fails: anything that does not parse as an absolute http(s) URL is
/// returned verbatim so it can still be keyed and compared. The filter chain
/// is what keeps such addresses from being fetched.
pub fn canonicalize(uri: &str) -> CanonicalAddress {
    match Url::parse(uri) {
        Ok(url) if is_http_scheme(url.scheme()) => canonicalize_url(&url),
        _ => CanonicalAddress(uri.to_string()),
    }
}

/// Canonicalize an already parsed URL.
pub fn canonicalize_url(url: &Url) -> CanonicalAddress {
    if !is_http_scheme(url.scheme()) {
        return CanonicalAddress(url.to_string());
    }

    let mut url = url.clone();
    url.set_fragment(None);

    let path = url.path().to_string();
    if !path.ends_with('/') && !looks_like_file(&path) {
        url.set_path(&format!("{}/", path));
    }

    CanonicalAddress(url.into())
}

fn looks_like_file(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .map(|segment| segment.contains('.'))
        .unwrap_or(false)
}

fn is_http_scheme(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}

use crate::canonical::CanonicalAddress;
use crate::config::SpiderConfig;
use crate::error::Result;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use url::Url;

pub type FilterCallback = Arc<dyn Fn(&Url) -> bool + Send + Sync>;

/// A single eligibility rule. An address is crawlable only when every rule in
/// the [`FilterChain`] accepts it.
#[derive(Clone)]
pub enum UriFilter {
    /// Only http and https
    Scheme,
    /// Keeps the crawl on (or off) the seed hosts
    Host {
        seed_hosts: HashSet<String>,
        follow_internal: bool,
        follow_external: bool,
    },
    /// Rejects paths ending in a non-page extension
    Extension(Regex),
    /// Rejects paths whose last `depth` segments repeat
    Recursion { depth: usize },
    /// User supplied pattern over the absolute address
    Blacklist(Regex),
    Custom(FilterCallback),
}

impl UriFilter {
    pub fn validate(&self, url: &Url) -> bool {
        match self {
            UriFilter::Scheme => matches!(url.scheme(), "http" | "https"),
            UriFilter::Host {
                seed_hosts,
                follow_internal,
                follow_external,
            } => {
                let internal = url
                    .host_str()
                    .map(|host| seed_hosts.contains(&host.to_lowercase()))
                    .unwrap_or(false);
                if internal {
                    *follow_internal
                } else {
                    *follow_external
                }
            }
            UriFilter::Extension(pattern) => !pattern.is_match(url.path()),
            UriFilter::Recursion { depth } => !is_recursive_path(url.path(), *depth),
            UriFilter::Blacklist(pattern) => !pattern.is_match(url.as_str()),
            UriFilter::Custom(callback) => callback(url),
        }
    }
}

impl fmt::Debug for UriFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriFilter::Scheme => write!(f, "Scheme"),
            UriFilter::Host { seed_hosts, .. } => write!(f, "Host({:?})", seed_hosts),
            UriFilter::Extension(pattern) => write!(f, "Extension({})", pattern),
            UriFilter::Recursion { depth } => write!(f, "Recursion({})", depth),
            UriFilter::Blacklist(pattern) => write!(f, "Blacklist({})", pattern),
            UriFilter::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Ordered list of filters combined with logical AND.
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<UriFilter>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the standard chain for a crawl. Cheap string checks come first,
    /// the user's blacklist regex last.
    pub fn from_config(config: &SpiderConfig) -> Result<Self> {
        let seed_hosts = config
            .seed_uris
            .iter()
            .filter_map(|seed| Url::parse(seed).ok())
            .filter_map(|url| url.host_str().map(|h| h.to_lowercase()))
            .collect();

        let mut chain = Self::new()
            .with_filter(UriFilter::Scheme)
            .with_filter(UriFilter::Host {
                seed_hosts,
                follow_internal: config.follow_internal_links,
                follow_external: config.follow_external_links,
            });

        if let Some(pattern) = extension_pattern(&config.excluded_extensions)? {
            chain.push(UriFilter::Extension(pattern));
        }

        if config.recursion_depth > 0 {
            chain.push(UriFilter::Recursion {
                depth: config.recursion_depth,
            });
        }

        if !config.uri_blacklist_pattern.is_empty() {
            chain.push(UriFilter::Blacklist(Regex::new(
                &config.uri_blacklist_pattern,
            )?));
        }

        Ok(chain)
    }

    pub fn with_filter(mut self, filter: UriFilter) -> Self {
        self.push(filter);
        self
    }

    pub fn push(&mut self, filter: UriFilter) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn validate(&self, url: &Url) -> bool {
        self.filters.iter().all(|filter| filter.validate(url))
    }

    /// Addresses that are not absolute http(s) URLs are never eligible.
    pub fn is_eligible(&self, address: &CanonicalAddress) -> bool {
        address
            .to_url()
            .map(|url| self.validate(&url))
            .unwrap_or(false)
    }
}

fn extension_pattern(extensions: &[String]) -> Result<Option<Regex>> {
    let alternatives: Vec<String> = extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .map(regex::escape)
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }

    let pattern = RegexBuilder::new(&format!(r"\.({})\b", alternatives.join("|")))
        .case_insensitive(true)
        .build()?;
    Ok(Some(pattern))
}

/// Segments are counted including the root, so `/x/y/y/` has four. Only
/// paths with more than `depth + 1` segments are checked; the last `depth`
/// segments must all be equal for the path to count as recursive.
fn is_recursive_path(path: &str, depth: usize) -> bool {
    if depth < 2 {
        return false;
    }

    let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
    if segments.len() <= depth + 1 {
        return false;
    }

    let tail = &segments[segments.len() - depth..];
    tail.windows(2).all(|pair| pair[0] == pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::canonicalize;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    fn site_config() -> SpiderConfig {
        SpiderConfig::new(["http://Site.example/"])
    }

    #[test]
    fn test_recursion_guard() {
        assert!(is_recursive_path("/x/y/y/", 2));
        assert!(!is_recursive_path("/x/y/z/", 2));
        assert!(!is_recursive_path("/y/y/", 2));
        assert!(is_recursive_path("/tag/tag/tag/tag/", 2));
        assert!(!is_recursive_path("/a/b/c/c/", 3));
        assert!(is_recursive_path("/a/c/c/c/", 3));
    }

    #[test]
    fn test_recursion_filter_in_chain() {
        let chain = FilterChain::from_config(&site_config()).unwrap();
        assert!(!chain.validate(&url("http://site.example/x/y/y/")));
        assert!(chain.validate(&url("http://site.example/x/y/z/")));
    }

    #[test]
    fn test_scheme_whitelist() {
        let chain = FilterChain::new().with_filter(UriFilter::Scheme);
        assert!(chain.validate(&url("http://site.example/")));
        assert!(chain.validate(&url("https://site.example/")));
        assert!(!chain.validate(&url("ftp://site.example/")));
        assert!(!chain.validate(&url("mailto:a@site.example")));
    }

    #[test]
    fn test_host_restriction_case_insensitive() {
        let chain = FilterChain::from_config(&site_config()).unwrap();
        assert!(chain.validate(&url("http://SITE.example/page/")));
        assert!(!chain.validate(&url("http://other.example/page/")));
    }

    #[test]
    fn test_external_allowed_when_configured() {
        let config = site_config().with_follow_external_links(true);
        let chain = FilterChain::from_config(&config).unwrap();
        assert!(chain.validate(&url("http://other.example/page/")));
    }

    #[test]
    fn test_internal_rejected_when_disabled() {
        let config = site_config()
            .with_follow_internal_links(false)
            .with_follow_external_links(true);
        let chain = FilterChain::from_config(&config).unwrap();
        assert!(!chain.validate(&url("http://site.example/page/")));
        assert!(chain.validate(&url("http://other.example/page/")));
    }

    #[test]
    fn test_extension_blacklist() {
        let chain = FilterChain::from_config(&site_config()).unwrap();
        assert!(!chain.validate(&url("http://site.example/style.css")));
        assert!(!chain.validate(&url("http://site.example/img/Logo.PNG")));
        assert!(!chain.validate(&url("http://site.example/report.pdf?v=2")));
        assert!(chain.validate(&url("http://site.example/index.html")));
        assert!(chain.validate(&url("http://site.example/cssguide/")));
    }

    #[test]
    fn test_blacklist_pattern() {
        let config = site_config().with_blacklist_pattern(r".*\/admin.*");
        let chain = FilterChain::from_config(&config).unwrap();
        assert!(!chain.validate(&url("http://site.example/admin/login/")));
        assert!(chain.validate(&url("http://site.example/about/")));
    }

    #[test]
    fn test_empty_blacklist_is_disabled() {
        let chain = FilterChain::from_config(&site_config()).unwrap();
        assert!(
            !chain
                .filters
                .iter()
                .any(|f| matches!(f, UriFilter::Blacklist(_)))
        );
    }

    #[test]
    fn test_invalid_blacklist_pattern() {
        let config = site_config().with_blacklist_pattern("(unclosed");
        assert!(FilterChain::from_config(&config).is_err());
    }

    #[test]
    fn test_custom_filter() {
        let chain = FilterChain::new().with_filter(UriFilter::Custom(Arc::new(|u: &Url| {
            !u.path().starts_with("/private")
        })));
        assert!(chain.validate(&url("http://site.example/public/")));
        assert!(!chain.validate(&url("http://site.example/private/")));
    }

    #[test]
    fn test_is_eligible_rejects_passthrough_addresses() {
        let chain = FilterChain::from_config(&site_config()).unwrap();
        assert!(!chain.is_eligible(&canonicalize("mailto:a@site.example")));
        assert!(!chain.is_eligible(&canonicalize("javascript:void(0)")));
        assert!(chain.is_eligible(&canonicalize("http://site.example/a")));
    }
}

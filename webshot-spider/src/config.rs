use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Extensions that are never worth fetching as pages.
pub const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &[
    "css", "js", "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg", "webp", "pdf", "zip", "gz",
    "tar", "mp3", "mp4", "avi", "mov", "woff", "woff2", "ttf", "eot", "xml", "json",
];

/// Basic-auth credential for a single host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub user: String,
    pub password: String,
}

impl Credential {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

/// Everything the spider needs to run one crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiderConfig {
    pub follow_internal_links: bool,
    pub follow_external_links: bool,
    /// Regex matched against absolute addresses; empty disables it
    pub uri_blacklist_pattern: String,
    pub seed_uris: Vec<String>,
    /// How many trailing path segments must repeat before an address is
    /// treated as a recursion trap
    pub recursion_depth: usize,
    pub excluded_extensions: Vec<String>,
    /// Concurrent fetches. 1 keeps the crawl strictly sequential.
    pub workers: usize,
    pub request_timeout_secs: Option<u64>,
    /// Keyed by host
    #[serde(skip_serializing)]
    pub credentials: HashMap<String, Credential>,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            follow_internal_links: true,
            follow_external_links: false,
            uri_blacklist_pattern: String::new(),
            seed_uris: Vec::new(),
            recursion_depth: 2,
            excluded_extensions: DEFAULT_EXCLUDED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            workers: 1,
            request_timeout_secs: None,
            credentials: HashMap::new(),
        }
    }
}

impl SpiderConfig {
    pub fn new<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seed_uris: seeds.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_follow_internal_links(mut self, follow: bool) -> Self {
        self.follow_internal_links = follow;
        self
    }

    pub fn with_follow_external_links(mut self, follow: bool) -> Self {
        self.follow_external_links = follow;
        self
    }

    pub fn with_blacklist_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.uri_blacklist_pattern = pattern.into();
        self
    }

    pub fn with_recursion_depth(mut self, depth: usize) -> Self {
        self.recursion_depth = depth;
        self
    }

    pub fn with_excluded_extensions(mut self, extensions: Vec<String>) -> Self {
        self.excluded_extensions = extensions;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.request_timeout_secs = Some(timeout_secs);
        self
    }

    pub fn with_credential(mut self, host: impl Into<String>, credential: Credential) -> Self {
        self.credentials
            .insert(host.into().to_lowercase(), credential);
        self
    }

    pub fn with_credentials(mut self, credentials: HashMap<String, Credential>) -> Self {
        for (host, credential) in credentials {
            self.credentials.insert(host.to_lowercase(), credential);
        }
        self
    }

    /// Whether the spider should look for links in fetched pages at all
    pub fn follows_links(&self) -> bool {
        self.follow_internal_links || self.follow_external_links
    }
}

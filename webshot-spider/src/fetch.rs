use crate::config::Credential;
use crate::error::{Result, SpiderError};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const USER_AGENT: &str = concat!("WebshotService/", env!("CARGO_PKG_VERSION"));

const MAX_REDIRECTS: usize = 10;

type CredentialStore = Arc<RwLock<HashMap<String, Credential>>>;

/// A successful GET, after any redirects the transport followed
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: Url,
    pub content_type: Option<String>,
    pub body: String,
}

/// HTTP GET facade shared by every fetch of a crawl.
///
/// Holds one long-lived client plus a per-host Basic-auth store. Redirects
/// are followed by the client; callers compare [`FetchedPage::final_url`]
/// with what they asked for to notice them.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    credentials: CredentialStore,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout).connect_timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            credentials: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Install credentials for the lifetime of the returned scope.
    ///
    /// Dropping the scope puts the store back the way it was, whichever way
    /// the crawl that holds it ends.
    pub fn install_credentials(&self, credentials: &HashMap<String, Credential>) -> CredentialScope {
        let mut store = write_store(&self.credentials);
        let mut previous = Vec::with_capacity(credentials.len());

        for (host, credential) in credentials {
            let host = host.to_lowercase();
            debug!("Installing credentials for {}", host);
            let old = store.insert(host.clone(), credential.clone());
            previous.push((host, old));
        }

        CredentialScope {
            store: self.credentials.clone(),
            previous,
        }
    }

    pub fn credential_for(&self, url: &Url) -> Option<Credential> {
        let host = url.host_str()?.to_lowercase();
        read_store(&self.credentials).get(&host).cloned()
    }

    pub fn has_credentials(&self) -> bool {
        !read_store(&self.credentials).is_empty()
    }

    /// GET `url`. Any non-2xx final response is an error.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        debug!("Fetching {}", url);

        let mut request = self.client.get(url.clone());
        if let Some(credential) = self.credential_for(url) {
            request = request.basic_auth(&credential.user, Some(&credential.password));
        }

        let response = request.send().await?;
        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(SpiderError::StatusError {
                url: final_url.to_string(),
                status,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.text().await?;

        Ok(FetchedPage {
            final_url,
            content_type,
            body,
        })
    }
}

/// Guard returned by [`Fetcher::install_credentials`]
pub struct CredentialScope {
    store: CredentialStore,
    previous: Vec<(String, Option<Credential>)>,
}

impl CredentialScope {
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.previous.iter().map(|(host, _)| host.as_str())
    }
}

impl Drop for CredentialScope {
    fn drop(&mut self) {
        let mut store = write_store(&self.store);
        for (host, old) in self.previous.drain(..) {
            debug!("Releasing credentials for {}", host);
            match old {
                Some(credential) => {
                    store.insert(host, credential);
                }
                None => {
                    store.remove(&host);
                }
            }
        }
    }
}

fn read_store(store: &CredentialStore) -> RwLockReadGuard<'_, HashMap<String, Credential>> {
    store.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_store(store: &CredentialStore) -> RwLockWriteGuard<'_, HashMap<String, Credential>> {
    store.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

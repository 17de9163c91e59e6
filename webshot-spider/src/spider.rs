use crate::canonical::{CanonicalAddress, canonicalize, canonicalize_url};
use crate::config::SpiderConfig;
use crate::error::{Result, SpiderError};
use crate::fetch::{FetchedPage, Fetcher};
use crate::filter::{FilterChain, UriFilter};
use crate::frontier::{Frontier, Link, VisitStatus};
use crate::result::CrawlResults;
use futures::stream::{FuturesUnordered, StreamExt};
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receives `(classified, known, current address)` as the crawl advances
pub type ProgressCallback = Arc<dyn Fn(usize, usize, String) + Send + Sync>;

// The href attribute name must follow whitespace so `data-href` is skipped
const ANCHOR_PATTERN: &str = r#"<a\s(?:[^>]*?\s)?href\s*=\s*["']([^"']*)["']"#;

/// Drives discovery for one site.
///
/// Pulls unvisited addresses from the frontier, fetches them, classifies the
/// outcome and feeds every anchor found back through the filter chain until
/// nothing is left unvisited. Up to `workers` fetches run at once, but the
/// frontier is only touched from the crawl loop itself, so redirect merges
/// and filter decisions for a node happen in one step.
pub struct Spider {
    config: SpiderConfig,
    fetcher: Fetcher,
    filters: FilterChain,
    frontier: Frontier,
    anchor_pattern: Regex,
    progress_callback: Option<ProgressCallback>,
}

impl Spider {
    pub fn new(config: SpiderConfig) -> Result<Self> {
        let fetcher = Fetcher::with_timeout(config.request_timeout_secs.map(Duration::from_secs))?;
        let filters = FilterChain::from_config(&config)?;
        let anchor_pattern = RegexBuilder::new(ANCHOR_PATTERN)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()?;

        Ok(Self {
            config,
            fetcher,
            filters,
            frontier: Frontier::new(),
            anchor_pattern,
            progress_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Append an extra rule to the filter chain
    pub fn with_filter(mut self, filter: UriFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn config(&self) -> &SpiderConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub async fn crawl(&mut self) -> Result<CrawlResults> {
        self.crawl_with_cancellation(CancellationToken::new()).await
    }

    /// Run a crawl to completion.
    ///
    /// Cancelling `cancel` abandons any in-flight fetch and returns
    /// [`SpiderError::Cancelled`]; no partial snapshot is produced.
    pub async fn crawl_with_cancellation(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<CrawlResults> {
        let workers = self.config.workers.max(1);
        info!(
            "Starting crawl of {} seed(s) with {} worker(s)",
            self.config.seed_uris.len(),
            workers
        );

        let _credentials = self.fetcher.install_credentials(&self.config.credentials);

        self.frontier.clear();
        for seed in &self.config.seed_uris {
            self.frontier.get_or_create(&canonicalize(seed));
        }

        let mut in_flight = FuturesUnordered::new();

        loop {
            if cancel.is_cancelled() {
                info!("Crawl cancelled");
                return Err(SpiderError::Cancelled);
            }

            while in_flight.len() < workers {
                let Some(address) = self.frontier.claim_unvisited() else {
                    break;
                };
                self.report_progress(address.as_str());

                let fetcher = self.fetcher.clone();
                in_flight.push(async move {
                    let outcome = match address.to_url() {
                        Some(url) => fetcher.fetch(&url).await,
                        None => Err(SpiderError::InvalidUrl(address.to_string())),
                    };
                    (address, outcome)
                });
            }

            if in_flight.is_empty() {
                break;
            }

            let (address, outcome) = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Crawl cancelled while fetching");
                    return Err(SpiderError::Cancelled);
                }
                next = in_flight.next() => match next {
                    Some(done) => done,
                    None => break,
                },
            };

            self.frontier.release(&address);
            self.process_page(&address, outcome);
        }

        let total = self.frontier.len();
        self.report(total, total, "Crawl complete".to_string());

        let results = self.frontier.snapshot();
        info!(
            "Crawl complete. {} addresses known, {} visited, {} broken",
            results.len(),
            results.count(VisitStatus::Visited),
            results.broken_links.len()
        );
        Ok(results)
    }

    fn process_page(&mut self, requested: &CanonicalAddress, outcome: Result<FetchedPage>) {
        let page = match outcome {
            Ok(page) => page,
            Err(e) => {
                warn!("Fetch failed for {}: {}", requested, e);
                self.frontier.set_error(requested, e.to_string());
                return;
            }
        };

        let mut current = requested.clone();
        if canonicalize_url(&page.final_url) != *requested {
            current = self
                .frontier
                .combine_on_redirect(requested, page.final_url.as_str());
            debug!("{} redirected to {}", requested, current);

            let still_waiting = self.frontier.status_of(&current) == Some(VisitStatus::Unvisited)
                && !self.frontier.is_in_flight(&current);
            if !still_waiting {
                debug!("{} already handled, skipping", current);
                return;
            }
            if !self.filters.is_eligible(&current) {
                debug!(
                    "{} is outside the filter chain but is kept as the redirect target of {}",
                    current, requested
                );
            }
        }

        if !looks_like_html(&page.body) {
            debug!(
                "{} is not HTML ({}), excluding",
                current,
                page.content_type.as_deref().unwrap_or("no content type")
            );
            self.frontier.set_status(&current, VisitStatus::Excluded);
            return;
        }

        self.frontier.set_status(&current, VisitStatus::Visited);

        if !self.config.follows_links() {
            return;
        }

        let hrefs = self.extract_links(&page.body);
        debug!("Found {} link(s) on {}", hrefs.len(), current);
        for href in hrefs {
            self.record_discovered_link(&current, href);
        }
    }

    /// Regex-based anchor extraction, not an HTML parser. Returns raw hrefs.
    pub fn extract_links(&self, body: &str) -> Vec<String> {
        self.anchor_pattern
            .captures_iter(body)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().replace("&amp;", "&"))
            .collect()
    }

    fn record_discovered_link(&mut self, page: &CanonicalAddress, href: String) {
        let link = Link::new(page.clone(), href);
        let target = match link.target() {
            Ok(url) => canonicalize_url(&url),
            Err(e) => {
                warn!("Dropping link: {}", e);
                return;
            }
        };

        let is_new = !self.frontier.contains(&target);
        self.frontier.record_link(&target, link);

        if is_new && !self.filters.is_eligible(&target) {
            debug!("  -> {} excluded by filters", target);
            self.frontier.set_status(&target, VisitStatus::Excluded);
        }
    }

    fn report_progress(&self, current: &str) {
        self.report(
            self.frontier.classified_count(),
            self.frontier.len(),
            current.to_string(),
        );
    }

    fn report(&self, index: usize, total: usize, label: String) {
        if let Some(ref callback) = self.progress_callback {
            callback(index, total, label);
        }
    }
}

fn looks_like_html(body: &str) -> bool {
    body.to_ascii_lowercase().contains("<html")
}

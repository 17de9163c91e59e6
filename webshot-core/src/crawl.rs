use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;
use webshot_spider::{CrawlResults, ProgressCallback, Spider, SpiderConfig, SpiderError, VisitStatus};

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub config: SpiderConfig,
    pub show_progress_bars: bool,
}

impl CrawlOptions {
    pub fn new(config: SpiderConfig) -> Self {
        Self {
            config,
            show_progress_bars: false,
        }
    }

    pub fn with_progress_bars(mut self, show: bool) -> Self {
        self.show_progress_bars = show;
        self
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Host of an address, or `None` for anything that is not an absolute URL
pub fn extract_url_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}

/// Visited pages, in address order, as targets for capture
pub fn capture_candidates(results: &CrawlResults) -> Vec<String> {
    results
        .addresses_with(VisitStatus::Visited)
        .map(|address| address.to_string())
        .collect()
}

/// Execute a crawl with the given options.
///
/// `progress_callback` receives every engine progress tuple, whether or not
/// progress bars are shown. Cancelling `cancel` aborts the crawl with an
/// error and no results.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<ProgressCallback>,
    cancel: CancellationToken,
) -> Result<CrawlResults, String> {
    let CrawlOptions {
        config,
        show_progress_bars,
    } = options;

    if config.seed_uris.is_empty() {
        return Err("No seed URLs to crawl".to_string());
    }

    // Single progress bar for the whole crawl (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new(config.seed_uris.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Starting crawl...");
        Some(pb)
    } else {
        None
    };

    let bar_clone = progress_bar.clone();
    let engine_callback: ProgressCallback = Arc::new(move |index, total, label| {
        if let Some(ref pb) = bar_clone {
            pb.set_length(total as u64);
            pb.set_position(index as u64);
            pb.set_message(extract_url_path(&label));
        }
        if let Some(ref callback) = progress_callback {
            callback(index, total, label);
        }
    });

    info!("Crawling {} seed(s)", config.seed_uris.len());

    let mut spider = Spider::new(config)
        .map_err(|e| format!("Invalid crawl configuration: {}", e))?
        .with_progress_callback(engine_callback);

    let outcome = spider.crawl_with_cancellation(cancel).await;

    if let Some(ref pb) = progress_bar {
        match outcome {
            Ok(ref results) => pb.finish_with_message(format!(
                "Crawl complete! {} pages visited",
                results.count(VisitStatus::Visited)
            )),
            Err(_) => pb.abandon_with_message("Crawl stopped"),
        }
    }

    outcome.map_err(|e| match e {
        SpiderError::Cancelled => "Crawl cancelled".to_string(),
        other => format!("Crawl failed: {}", other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    #[test]
    fn test_capture_candidates_only_visited() {
        let mut status_by_address = BTreeMap::new();
        status_by_address.insert("http://site/b/".to_string(), VisitStatus::Visited);
        status_by_address.insert("http://site/".to_string(), VisitStatus::Visited);
        status_by_address.insert("http://site/x.css".to_string(), VisitStatus::Excluded);
        status_by_address.insert("http://site/a/".to_string(), VisitStatus::Error);
        let results = CrawlResults {
            status_by_address,
            broken_links: Vec::new(),
            timestamp: Utc::now(),
        };

        assert_eq!(
            capture_candidates(&results),
            vec!["http://site/".to_string(), "http://site/b/".to_string()]
        );
    }

    #[test]
    fn test_extract_url_host() {
        assert_eq!(
            extract_url_host("https://www.example.com/a").as_deref(),
            Some("www.example.com")
        );
        assert_eq!(extract_url_host("mailto:x@example.com"), None);
        assert_eq!(extract_url_host("not a url"), None);
    }
}

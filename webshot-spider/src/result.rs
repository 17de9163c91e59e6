use crate::frontier::{Link, VisitStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fetch that failed, with every page that pointed at it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLink {
    pub target: String,
    pub sources: Vec<Link>,
    pub error: String,
}

/// Snapshot of a finished crawl. Holds no reference back to the frontier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResults {
    pub status_by_address: BTreeMap<String, VisitStatus>,
    pub broken_links: Vec<BrokenLink>,
    pub timestamp: DateTime<Utc>,
}

impl CrawlResults {
    pub fn status(&self, address: &str) -> Option<VisitStatus> {
        self.status_by_address.get(address).copied()
    }

    pub fn addresses_with(&self, status: VisitStatus) -> impl Iterator<Item = &str> {
        self.status_by_address
            .iter()
            .filter(move |(_, s)| **s == status)
            .map(|(address, _)| address.as_str())
    }

    pub fn count(&self, status: VisitStatus) -> usize {
        self.addresses_with(status).count()
    }

    pub fn len(&self) -> usize {
        self.status_by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.status_by_address.is_empty()
    }
}

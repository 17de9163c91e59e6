use crate::canonical::{CanonicalAddress, canonicalize};
use crate::error::{Result, SpiderError};
use crate::result::{BrokenLink, CrawlResults};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VisitStatus {
    Unvisited,
    Visited,
    Excluded,
    Redirected,
    Error,
}

impl VisitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Unvisited => "unvisited",
            VisitStatus::Visited => "visited",
            VisitStatus::Excluded => "excluded",
            VisitStatus::Redirected => "redirected",
            VisitStatus::Error => "error",
        }
    }
}

/// An edge in the link graph: `raw_href` as written on `calling_page`.
///
/// Two links are the same when they come from the same page and their hrefs
/// match ignoring case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub calling_page: CanonicalAddress,
    pub raw_href: String,
}

impl Link {
    pub fn new(calling_page: CanonicalAddress, raw_href: impl Into<String>) -> Self {
        Self {
            calling_page,
            raw_href: raw_href.into(),
        }
    }

    /// Resolve the href against the calling page
    pub fn target(&self) -> Result<Url> {
        let resolved = match self.calling_page.to_url() {
            Some(base) => base.join(self.raw_href.trim()),
            None => Url::parse(self.raw_href.trim()),
        };
        resolved.map_err(|e| {
            SpiderError::InvalidUrl(format!(
                "{} (linked from {}): {}",
                self.raw_href, self.calling_page, e
            ))
        })
    }

    fn href_key(&self) -> String {
        self.raw_href.to_lowercase()
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.calling_page == other.calling_page && self.href_key() == other.href_key()
    }
}

impl Eq for Link {}

impl Hash for Link {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.calling_page.hash(state);
        self.href_key().hash(state);
    }
}

impl PartialOrd for Link {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Link {
    fn cmp(&self, other: &Self) -> Ordering {
        self.calling_page
            .cmp(&other.calling_page)
            .then_with(|| self.href_key().cmp(&other.href_key()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitationRecord {
    pub status: VisitStatus,
    pub inbound_links: BTreeSet<Link>,
    pub redirect_target: Option<String>,
    pub error: Option<String>,
}

impl VisitationRecord {
    fn new() -> Self {
        Self {
            status: VisitStatus::Unvisited,
            inbound_links: BTreeSet::new(),
            redirect_target: None,
            error: None,
        }
    }
}

/// Every address seen during one crawl, keyed by canonical form.
///
/// Records are never removed while a crawl runs. Unvisited addresses are
/// handed out in discovery order, and an address that has been claimed by
/// an in-flight fetch is not handed out again.
#[derive(Debug, Default)]
pub struct Frontier {
    records: HashMap<CanonicalAddress, VisitationRecord>,
    pending: VecDeque<CanonicalAddress>,
    in_flight: HashSet<CanonicalAddress>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.pending.clear();
        self.in_flight.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, address: &CanonicalAddress) -> bool {
        self.records.contains_key(address)
    }

    pub fn get(&self, address: &CanonicalAddress) -> Option<&VisitationRecord> {
        self.records.get(address)
    }

    pub fn status_of(&self, address: &CanonicalAddress) -> Option<VisitStatus> {
        self.records.get(address).map(|record| record.status)
    }

    /// Number of addresses that already have a final classification
    pub fn classified_count(&self) -> usize {
        self.records
            .values()
            .filter(|record| record.status != VisitStatus::Unvisited)
            .count()
    }

    pub fn get_or_create(&mut self, address: &CanonicalAddress) -> &mut VisitationRecord {
        if !self.records.contains_key(address) {
            self.pending.push_back(address.clone());
        }
        self.records
            .entry(address.clone())
            .or_insert_with(VisitationRecord::new)
    }

    /// Record `link` as pointing at `target`, creating the target if needed.
    pub fn record_link(&mut self, target: &CanonicalAddress, link: Link) -> &mut VisitationRecord {
        let record = self.get_or_create(target);
        record.inbound_links.insert(link);
        record
    }

    pub fn set_status(&mut self, address: &CanonicalAddress, status: VisitStatus) {
        self.get_or_create(address).status = status;
    }

    pub fn set_error(&mut self, address: &CanonicalAddress, error: impl Into<String>) {
        let record = self.get_or_create(address);
        record.status = VisitStatus::Error;
        record.error = Some(error.into());
    }

    /// Unify `source` with the address it redirected to.
    ///
    /// The source becomes `Redirected`. If the target canonicalizes to a
    /// different address, both records end up sharing the union of their
    /// inbound links. Returns the destination address, which is the source
    /// itself when the two are equivalent.
    pub fn combine_on_redirect(
        &mut self,
        source: &CanonicalAddress,
        redirect_target: &str,
    ) -> CanonicalAddress {
        let destination = canonicalize(redirect_target);

        let source_links = {
            let record = self.get_or_create(source);
            record.status = VisitStatus::Redirected;
            record.redirect_target = Some(redirect_target.to_string());
            record.inbound_links.clone()
        };

        if destination != *source {
            let destination_record = self.get_or_create(&destination);
            let merged: BTreeSet<Link> = destination_record
                .inbound_links
                .union(&source_links)
                .cloned()
                .collect();
            destination_record.inbound_links = merged.clone();

            if let Some(source_record) = self.records.get_mut(source) {
                source_record.inbound_links = merged;
            }
        }

        destination
    }

    /// Next address still waiting for a visit, without claiming it
    pub fn select_unvisited(&mut self) -> Option<CanonicalAddress> {
        self.drop_stale_pending();
        self.pending.front().cloned()
    }

    /// Take the next unvisited address and mark it as in flight
    pub fn claim_unvisited(&mut self) -> Option<CanonicalAddress> {
        self.drop_stale_pending();
        let address = self.pending.pop_front()?;
        self.in_flight.insert(address.clone());
        Some(address)
    }

    pub fn release(&mut self, address: &CanonicalAddress) {
        self.in_flight.remove(address);
    }

    pub fn is_in_flight(&self, address: &CanonicalAddress) -> bool {
        self.in_flight.contains(address)
    }

    fn drop_stale_pending(&mut self) {
        while let Some(front) = self.pending.front() {
            let waiting = !self.in_flight.contains(front)
                && self.status_of(front) == Some(VisitStatus::Unvisited);
            if waiting {
                break;
            }
            self.pending.pop_front();
        }
    }

    /// Flatten the graph into an immutable result
    pub fn snapshot(&self) -> CrawlResults {
        let status_by_address: BTreeMap<String, VisitStatus> = self
            .records
            .iter()
            .map(|(address, record)| (address.to_string(), record.status))
            .collect();

        let mut broken_links: Vec<BrokenLink> = self
            .records
            .iter()
            .filter(|(_, record)| record.status == VisitStatus::Error)
            .map(|(address, record)| BrokenLink {
                target: address.to_string(),
                sources: record.inbound_links.iter().cloned().collect(),
                error: record.error.clone().unwrap_or_default(),
            })
            .collect();
        broken_links.sort_by(|a, b| a.target.cmp(&b.target));

        CrawlResults {
            status_by_address,
            broken_links,
            timestamp: Utc::now(),
        }
    }
}

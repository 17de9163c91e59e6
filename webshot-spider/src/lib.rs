pub mod canonical;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod frontier;
pub mod result;
pub mod spider;

pub use canonical::{CanonicalAddress, canonicalize};
pub use config::{Credential, SpiderConfig};
pub use error::{Result, SpiderError};
pub use fetch::{CredentialScope, Fetcher};
pub use filter::{FilterChain, UriFilter};
pub use frontier::{Frontier, Link, VisitStatus, VisitationRecord};
pub use result::{BrokenLink, CrawlResults};
pub use spider::{ProgressCallback, Spider};

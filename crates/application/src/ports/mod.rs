mod content_filter;
mod host_resolver;
mod reputation_client;

pub use content_filter::ContentFilter;
pub use host_resolver::HostResolver;
pub use reputation_client::{FullHash, HashPrefix, PrefixMatches, ReputationClient};

// Re-export for convenience
pub use warden_dns_domain::{FilterResult, RequestFilterSettings};

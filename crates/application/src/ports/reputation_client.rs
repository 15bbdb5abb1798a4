use async_trait::async_trait;
use std::collections::HashMap;
use warden_dns_domain::DomainError;

/// First 4 bytes of a candidate hostname's SHA-256 hash. This is all the
/// upstream ever sees; full hostnames never leave the process.
pub type HashPrefix = [u8; 4];

/// A complete SHA-256 hash of a hostname known to the upstream.
pub type FullHash = [u8; 32];

/// Upstream answer: for each queried prefix, every full hash the service
/// knows that starts with it. A prefix absent from the map is clean.
pub type PrefixMatches = HashMap<HashPrefix, Vec<FullHash>>;

/// Upstream for the Safe Browsing and Parental Control services.
///
/// The caller decides locally whether a candidate's full hash appears in
/// the returned sets; the upstream cannot tell which (if any) matched.
/// Errors propagate to the service layer, which fails open: the query is
/// treated as not blocked by that service and other checks still run.
#[async_trait]
pub trait ReputationClient: Send + Sync {
    async fn lookup(&self, prefixes: &[HashPrefix]) -> Result<PrefixMatches, DomainError>;
}

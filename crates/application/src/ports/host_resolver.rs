use async_trait::async_trait;
use std::net::IpAddr;
use warden_dns_domain::DomainError;

/// Resolver used by the safe-search service to look up the forced-safe
/// replacement host (e.g. `forcesafesearch.google.com`).
///
/// Implementations may return addresses of both families; the service
/// picks the first one matching the query type. Cancelling the future is
/// safe: the service treats an aborted lookup as "no match".
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, DomainError>;
}

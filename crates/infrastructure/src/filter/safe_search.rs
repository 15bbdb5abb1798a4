use sha2::{Digest, Sha256};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use warden_dns_application::ports::HostResolver;
use warden_dns_domain::{FilterReason, FilterResult, MatchedRule, RecordType};

use super::safe_search_table;
use super::ttl_cache::TtlCache;

/// Fixed address Yandex publishes for its family-search endpoint; hosts
/// rewritten to the Yandex safe host are answered with it directly, no
/// resolver round-trip.
const YANDEX_SAFE_IP: Ipv4Addr = Ipv4Addr::new(213, 180, 193, 56);

/// Safe-search rewrite service.
///
/// Recognized search-engine hosts are redirected to their forced-safe
/// variant: either a hardcoded address (Yandex) or whatever the injected
/// resolver currently returns for the replacement host. Results are cached
/// under the *original* hostname; within the TTL a resolver answer change
/// serves a stale address, which is acceptable at the default 30 s.
pub struct SafeSearchService {
    resolver: Option<Arc<dyn HostResolver>>,
    cache: Arc<TtlCache>,
    cache_ttl: Duration,
}

impl SafeSearchService {
    pub fn new(
        resolver: Option<Arc<dyn HostResolver>>,
        cache: Arc<TtlCache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            resolver,
            cache,
            cache_ttl,
        }
    }

    /// The forced-safe host for `host` (lowercase), if any.
    pub fn rewrite(host: &str) -> Option<&'static str> {
        safe_search_table::rewrite(host)
    }

    /// Check `host` against the rewrite table and synthesize an answer.
    ///
    /// Returns `None` when the host is not a recognized search engine, the
    /// resolver produced nothing usable, or the query type carries no
    /// address; the evaluator then continues with the remaining services.
    pub async fn check(&self, host: &str, qtype: RecordType) -> Option<FilterResult> {
        if !qtype.is_address() {
            return None;
        }

        let cache_key = cache_key(host);
        if let Some(blob) = self.cache.get(&cache_key) {
            match serde_json::from_slice::<FilterResult>(&blob) {
                Ok(result) => return Some(result),
                Err(e) => debug!(host = %host, error = %e, "dropping undecodable safe-search cache entry"),
            }
        }

        let safe_host = safe_search_table::rewrite(host)?;
        debug!(host = %host, safe_host = %safe_host, "safe search rewrite");

        let ip = if safe_host.starts_with("yandex") {
            if qtype != RecordType::A {
                return None;
            }
            IpAddr::V4(YANDEX_SAFE_IP)
        } else {
            self.resolve(safe_host, qtype).await?
        };

        let mut result =
            FilterResult::with_rule(FilterReason::FilteredSafeSearch, MatchedRule::with_ip(safe_host, 0, ip));
        result.canon_name = Some(safe_host.to_string());

        match serde_json::to_vec(&result) {
            Ok(encoded) => self.cache.set(&cache_key, &encoded, self.cache_ttl),
            Err(e) => debug!(host = %host, error = %e, "failed to encode safe-search result"),
        }

        Some(result)
    }

    async fn resolve(&self, safe_host: &str, qtype: RecordType) -> Option<IpAddr> {
        let resolver = match &self.resolver {
            Some(r) => r,
            None => {
                debug!(safe_host = %safe_host, "no safe-search resolver configured");
                return None;
            }
        };

        let addresses = match resolver.lookup_ip(safe_host).await {
            Ok(addresses) => addresses,
            Err(e) => {
                // Fail open, like the reputation services.
                debug!(safe_host = %safe_host, error = %e, "safe-search resolution failed");
                return None;
            }
        };

        let want_v4 = qtype == RecordType::A;
        addresses.into_iter().find(|ip| ip.is_ipv4() == want_v4)
    }

    /// Decoded cached result for `host` (lowercase), if present.
    pub fn cached_result(&self, host: &str) -> Option<FilterResult> {
        let blob = self.cache.get(&cache_key(host))?;
        serde_json::from_slice(&blob).ok()
    }
}

/// Safe-search cache keys are the full SHA-256 of the original hostname.
fn cache_key(host: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(host.as_bytes());
    hasher.finalize().into()
}

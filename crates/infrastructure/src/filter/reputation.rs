use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use warden_dns_application::ports::{FullHash, HashPrefix, ReputationClient};
use warden_dns_domain::{FilterReason, FilterResult};

use super::ttl_cache::TtlCache;

/// Cache keys are the first 2 bytes of a candidate's SHA-256; upstream
/// requests carry the first 4. The cache value for a key is the
/// concatenation of every known full hash under it (empty = known clean).
const CACHE_KEY_LEN: usize = 2;
const FULL_HASH_LEN: usize = 32;

/// `host` plus its parent domains, stripping labels left-to-right until
/// two labels remain. `test.evil.narod.ru` yields itself,
/// `evil.narod.ru`, and `narod.ru`.
pub(crate) fn candidate_names(host: &str) -> Vec<&str> {
    let mut candidates = vec![host];
    let mut rest = host;
    while let Some((_, parent)) = rest.split_once('.') {
        if !parent.contains('.') {
            break;
        }
        candidates.push(parent);
        rest = parent;
    }
    candidates
}

fn sha256(name: &str) -> FullHash {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.finalize().into()
}

fn contains_hash(blob: &[u8], hash: &FullHash) -> bool {
    blob.chunks_exact(FULL_HASH_LEN).any(|chunk| chunk == hash)
}

/// Hash-prefix reputation checker, shared by Safe Browsing and Parental
/// Control. The two instances differ only in their upstream, their cache,
/// and the reason tag they produce.
///
/// Privacy model: only 4-byte hash prefixes of candidate names ever reach
/// the upstream; the full-hash comparison happens locally. Upstream
/// failures fail open — the query is treated as not blocked by this
/// service and nothing is cached, so the next query retries.
pub struct ReputationChecker {
    service: &'static str,
    reason: FilterReason,
    upstream: Arc<dyn ReputationClient>,
    cache: Arc<TtlCache>,
    cache_ttl: Duration,
}

impl ReputationChecker {
    pub fn new(
        service: &'static str,
        reason: FilterReason,
        upstream: Arc<dyn ReputationClient>,
        cache: Arc<TtlCache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            service,
            reason,
            upstream,
            cache,
            cache_ttl,
        }
    }

    /// Decide whether `host` (lowercase) is flagged by this service.
    pub async fn check(&self, host: &str) -> FilterResult {
        debug!(service = self.service, host = %host, "reputation lookup");

        let candidates: Vec<(&str, FullHash)> = candidate_names(host)
            .into_iter()
            .map(|name| (name, sha256(name)))
            .collect();

        // Answer from the cache where possible; collect the prefixes that
        // still need the upstream.
        let mut pending: Vec<(usize, HashPrefix)> = Vec::new();
        for (idx, (name, hash)) in candidates.iter().enumerate() {
            match self.cache.get(&hash[..CACHE_KEY_LEN]) {
                Some(blob) => {
                    if contains_hash(&blob, hash) {
                        return self.flagged(name);
                    }
                }
                None => {
                    let mut prefix: HashPrefix = [0; 4];
                    prefix.copy_from_slice(&hash[..4]);
                    if !pending.iter().any(|(_, p)| *p == prefix) {
                        pending.push((idx, prefix));
                    }
                }
            }
        }

        if pending.is_empty() {
            return FilterResult::not_found();
        }

        let prefixes: Vec<HashPrefix> = pending.iter().map(|(_, p)| *p).collect();
        let matches = match self.upstream.lookup(&prefixes).await {
            Ok(matches) => matches,
            Err(e) => {
                // Fail open: availability over strict enforcement.
                debug!(
                    service = self.service,
                    host = %host,
                    error = %e,
                    "reputation upstream failed; treating as not filtered"
                );
                return FilterResult::not_found();
            }
        };

        // Cache every queried prefix, including the clean ones, so the
        // next check within the TTL stays local.
        for (idx, prefix) in &pending {
            let full_hashes = matches.get(prefix).map(Vec::as_slice).unwrap_or(&[]);
            let mut blob = Vec::with_capacity(full_hashes.len() * FULL_HASH_LEN);
            for hash in full_hashes {
                blob.extend_from_slice(hash);
            }
            let key = &candidates[*idx].1[..CACHE_KEY_LEN];
            self.cache.set(key, &blob, self.cache_ttl);
        }

        for (name, hash) in &candidates {
            let mut prefix: HashPrefix = [0; 4];
            prefix.copy_from_slice(&hash[..4]);
            if let Some(full_hashes) = matches.get(&prefix) {
                if full_hashes.iter().any(|h| h == hash) {
                    return self.flagged(name);
                }
            }
        }

        FilterResult::not_found()
    }

    fn flagged(&self, matched: &str) -> FilterResult {
        debug!(
            service = self.service,
            matched = %matched,
            "reputation service flagged host"
        );
        FilterResult::with_reason(self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_strip_to_two_labels() {
        assert_eq!(
            candidate_names("test.wmconvirus.narod.ru"),
            vec!["test.wmconvirus.narod.ru", "wmconvirus.narod.ru", "narod.ru"]
        );
    }

    #[test]
    fn test_candidates_two_label_host() {
        assert_eq!(candidate_names("narod.ru"), vec!["narod.ru"]);
    }

    #[test]
    fn test_candidates_single_label_host() {
        assert_eq!(candidate_names("localhost"), vec!["localhost"]);
    }

    #[test]
    fn test_contains_hash() {
        let a = sha256("a.example");
        let b = sha256("b.example");
        let mut blob = Vec::new();
        blob.extend_from_slice(&a);
        blob.extend_from_slice(&b);
        assert!(contains_hash(&blob, &a));
        assert!(contains_hash(&blob, &b));
        assert!(!contains_hash(&blob, &sha256("c.example")));
        assert!(!contains_hash(&[], &a));
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use warden_dns_application::ports::{HashPrefix, HostResolver, PrefixMatches, ReputationClient};
use warden_dns_domain::{DomainError, FilteringConfig, RequestFilterSettings};

pub fn sha256(name: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.finalize().into()
}

/// Reputation upstream that flags exactly one hostname. Flip `fail` to
/// simulate an unreachable server and watch `lookups` to prove a cache
/// hit avoided the network.
pub struct MockReputationUpstream {
    blocked_hash: [u8; 32],
    pub fail: AtomicBool,
    pub lookups: AtomicUsize,
}

impl MockReputationUpstream {
    pub fn blocking(host: &str) -> Arc<Self> {
        Arc::new(Self {
            blocked_hash: sha256(host),
            fail: AtomicBool::new(false),
            lookups: AtomicUsize::new(0),
        })
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.fail.store(unreachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReputationClient for MockReputationUpstream {
    async fn lookup(&self, prefixes: &[HashPrefix]) -> Result<PrefixMatches, DomainError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::ReputationLookup("connection refused".into()));
        }

        let mut matches = PrefixMatches::new();
        for prefix in prefixes {
            if *prefix == self.blocked_hash[..4] {
                matches.insert(*prefix, vec![self.blocked_hash]);
            }
        }
        Ok(matches)
    }
}

/// Deterministic resolver: addresses derived from the hostname's SHA-256,
/// one IPv4 and one IPv6 per lookup.
pub struct HashResolver {
    pub lookups: AtomicUsize,
}

impl HashResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            lookups: AtomicUsize::new(0),
        })
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn expected_v4(host: &str) -> IpAddr {
        let hash = sha256(host);
        IpAddr::V4(Ipv4Addr::new(hash[0], hash[1], hash[2], hash[3]))
    }
}

#[async_trait]
impl HostResolver for HashResolver {
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, DomainError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let hash = sha256(host);
        let mut v6 = [0u8; 16];
        v6.copy_from_slice(&hash[4..20]);
        Ok(vec![
            IpAddr::V4(Ipv4Addr::new(hash[0], hash[1], hash[2], hash[3])),
            IpAddr::V6(Ipv6Addr::from(v6)),
        ])
    }
}

/// Resolver that always errors; safe search must fail open through it.
pub struct FailingResolver;

#[async_trait]
impl HostResolver for FailingResolver {
    async fn lookup_ip(&self, _host: &str) -> Result<Vec<IpAddr>, DomainError> {
        Err(DomainError::ResolverLookup("no route to host".into()))
    }
}

/// Request settings mirroring the engine config, the way the embedding
/// resolver derives a client's default settings.
pub fn settings_from(config: &FilteringConfig) -> RequestFilterSettings {
    RequestFilterSettings {
        filtering_enabled: true,
        safe_browsing_enabled: config.safe_browsing_enabled,
        parental_enabled: config.parental_enabled,
        safe_search_enabled: config.safe_search_enabled,
        services_rules: Vec::new(),
    }
}

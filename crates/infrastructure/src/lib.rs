//! Warden DNS Infrastructure Layer
//!
//! Implementation of the content filter engine: hosts-table matching,
//! adblock-style rule evaluation, reputation lookups behind TTL caches,
//! and the safe-search rewrite service.
pub mod filter;

pub use filter::{
    CacheMetricsSnapshot, DnsRuleSet, FilterEngine, FilterEngineBuilder, HostsTable,
    ReputationChecker, SafeSearchService, TtlCache,
};

use serde::{Deserialize, Serialize};

/// Configuration for the filter engine: which network services run by
/// default and how their caches are sized.
///
/// The per-request settings bundle can override the three `*_enabled`
/// flags for a single query; the cache budgets and TTL are engine-wide.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilteringConfig {
    #[serde(default)]
    pub safe_browsing_enabled: bool,

    #[serde(default)]
    pub parental_enabled: bool,

    #[serde(default)]
    pub safe_search_enabled: bool,

    /// Byte budget for the Safe Browsing prefix cache.
    #[serde(default = "default_reputation_cache_size")]
    pub safe_browsing_cache_size: usize,

    /// Byte budget for the Parental Control prefix cache.
    #[serde(default = "default_reputation_cache_size")]
    pub parental_cache_size: usize,

    /// Byte budget for the safe-search result cache.
    #[serde(default = "default_safe_search_cache_size")]
    pub safe_search_cache_size: usize,

    /// TTL for all three service caches, in seconds.
    #[serde(default = "default_cache_time_secs")]
    pub cache_time_secs: u64,

    /// Hostname of the Safe Browsing upstream. Queries for this name are
    /// never filtered (recursion guard).
    #[serde(default = "default_safe_browsing_server")]
    pub safe_browsing_server: String,

    /// Hostname of the Parental Control upstream, same guard.
    #[serde(default = "default_parental_server")]
    pub parental_server: String,
}

impl Default for FilteringConfig {
    fn default() -> Self {
        Self {
            safe_browsing_enabled: false,
            parental_enabled: false,
            safe_search_enabled: false,
            safe_browsing_cache_size: default_reputation_cache_size(),
            parental_cache_size: default_reputation_cache_size(),
            safe_search_cache_size: default_safe_search_cache_size(),
            cache_time_secs: default_cache_time_secs(),
            safe_browsing_server: default_safe_browsing_server(),
            parental_server: default_parental_server(),
        }
    }
}

fn default_reputation_cache_size() -> usize {
    1024 * 1024
}

fn default_safe_search_cache_size() -> usize {
    512 * 1024
}

fn default_cache_time_secs() -> u64 {
    30
}

fn default_safe_browsing_server() -> String {
    "sb.warden-dns.net".to_string()
}

fn default_parental_server() -> String {
    "family.warden-dns.net".to_string()
}

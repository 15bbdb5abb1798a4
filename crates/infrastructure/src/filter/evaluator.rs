use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use warden_dns_application::ports::{ContentFilter, HostResolver, ReputationClient};
use warden_dns_domain::{
    normalize_hostname, DomainError, FilterList, FilterReason, FilterResult, FilteringConfig,
    MatchedRule, RecordType, RequestFilterSettings,
};

use super::hosts_table::HostsTable;
use super::reputation::ReputationChecker;
use super::rule_engine::{DnsRuleSet, NetworkRule};
use super::safe_search::SafeSearchService;
use super::ttl_cache::TtlCache;

/// Per-request blocked-service rules carry this filter id.
const SERVICE_RULES_FILTER_ID: i64 = 0;

/// The compiled form of the active filter lists: hosts-file mappings plus
/// the adblock-style rule set. Immutable once built; replaced wholesale
/// via `ArcSwap` so in-flight checks keep the set they started with.
struct CompiledFilters {
    hosts: HostsTable,
    rules: DnsRuleSet,
}

fn compile_filters(
    blocking: &[FilterList],
    allow: &[FilterList],
) -> Result<CompiledFilters, DomainError> {
    let mut hosts = HostsTable::new();
    let mut rules: Vec<NetworkRule> = Vec::new();

    for list in blocking {
        for line in list.data.lines() {
            if hosts.add_line(line, list.id) {
                continue;
            }
            if let Some(rule) = NetworkRule::parse(line, list.id, false)? {
                rules.push(rule);
            }
        }
    }

    for list in allow {
        for line in list.data.lines() {
            if let Some(rule) = NetworkRule::parse(line, list.id, true)? {
                rules.push(rule);
            }
        }
    }

    info!(
        rules = rules.len(),
        hosts = hosts.len(),
        "Filter lists compiled"
    );

    Ok(CompiledFilters {
        hosts,
        rules: DnsRuleSet::compile(rules),
    })
}

/// The content filter engine.
///
/// Composes, in a fixed order: per-client blocked services, the hosts
/// table, the rule set, safe search, Safe Browsing, Parental Control.
/// The first decision wins, with one exception: an allowlist rule match
/// suppresses the two reputation services but not safe search.
///
/// All three service caches are owned by the engine instance. `check_host`
/// is reentrant; it blocks only on the injected upstream collaborators.
pub struct FilterEngine {
    filters: Arc<ArcSwap<CompiledFilters>>,
    safe_browsing: Option<ReputationChecker>,
    parental: Option<ReputationChecker>,
    safe_search: SafeSearchService,
    safe_browsing_cache: Arc<TtlCache>,
    parental_cache: Arc<TtlCache>,
    safe_search_cache: Arc<TtlCache>,
    /// Upstream hostnames that must never be filtered (recursion guard).
    safe_browsing_server: String,
    parental_server: String,
    closed: AtomicBool,
    recompile_task: Mutex<Option<JoinHandle<()>>>,
}

impl FilterEngine {
    /// Engine with blocking lists only and no network collaborators; the
    /// reputation services answer "not filtered" until upstreams are
    /// injected through the builder.
    pub fn new(config: &FilteringConfig, blocking: Vec<FilterList>) -> Result<Self, DomainError> {
        FilterEngineBuilder::new(config.clone())
            .blocking_filters(blocking)
            .build()
    }

    pub fn builder(config: FilteringConfig) -> FilterEngineBuilder {
        FilterEngineBuilder::new(config)
    }

    /// Decide whether `host`/`qtype` is blocked, rewritten, or passed
    /// through under `settings`. See the type docs for the composition
    /// order.
    pub async fn check_host(
        &self,
        host: &str,
        qtype: RecordType,
        settings: &RequestFilterSettings,
    ) -> Result<FilterResult, DomainError> {
        if self.closed.load(AtomicOrdering::Acquire) {
            return Err(DomainError::EngineClosed);
        }

        if host.is_empty() {
            return Ok(FilterResult::not_found());
        }
        let host = normalize_hostname(host);

        // Never filter the reputation upstreams themselves.
        if host == self.safe_browsing_server || host == self.parental_server {
            return Ok(FilterResult::not_found());
        }

        if let Some(result) = self.match_service_rules(&host, qtype, settings) {
            return Ok(result);
        }

        let mut allow_result = None;
        if settings.filtering_enabled {
            let compiled = self.filters.load();

            if let Some(rule) = compiled.hosts.lookup(&host, qtype) {
                debug!(host = %host, rule = %rule.text, "hosts table match");
                return Ok(FilterResult::with_rule(FilterReason::FilteredBlockList, rule));
            }

            if let Some(rule) = compiled.rules.match_query(&host, qtype) {
                let matched = MatchedRule::new(Arc::clone(&rule.text), rule.filter_id);
                if rule.allowlist {
                    debug!(host = %host, rule = %rule.text, "allowlist match");
                    allow_result = Some(FilterResult::with_rule(
                        FilterReason::NotFilteredAllowList,
                        matched,
                    ));
                } else {
                    debug!(host = %host, rule = %rule.text, "blocklist match");
                    return Ok(FilterResult::with_rule(
                        FilterReason::FilteredBlockList,
                        matched,
                    ));
                }
            }
        }

        // Safe search runs even after an allowlist match.
        if settings.safe_search_enabled {
            if let Some(result) = self.safe_search.check(&host, qtype).await {
                return Ok(result);
            }
        }

        // An explicit allow overrides reputation.
        if let Some(result) = allow_result {
            return Ok(result);
        }

        if settings.safe_browsing_enabled {
            if let Some(checker) = &self.safe_browsing {
                let result = checker.check(&host).await;
                if result.is_filtered {
                    return Ok(result);
                }
            }
        }

        if settings.parental_enabled {
            if let Some(checker) = &self.parental {
                let result = checker.check(&host).await;
                if result.is_filtered {
                    return Ok(result);
                }
            }
        }

        Ok(FilterResult::not_found())
    }

    /// Per-client blocked services: compiled and matched before anything
    /// else, independent of `filtering_enabled`.
    fn match_service_rules(
        &self,
        host: &str,
        qtype: RecordType,
        settings: &RequestFilterSettings,
    ) -> Option<FilterResult> {
        for entry in &settings.services_rules {
            for text in &entry.rules {
                let rule = match NetworkRule::parse(text, SERVICE_RULES_FILTER_ID, false) {
                    Ok(Some(rule)) => rule,
                    Ok(None) => continue,
                    Err(e) => {
                        debug!(service = %entry.name, error = %e, "skipping invalid service rule");
                        continue;
                    }
                };
                if rule.matches(host, qtype) {
                    debug!(host = %host, service = %entry.name, "blocked service match");
                    let mut result = FilterResult::with_rule(
                        FilterReason::FilteredBlockedService,
                        MatchedRule::new(Arc::clone(&rule.text), rule.filter_id),
                    );
                    result.service_name = Some(Arc::clone(&entry.name));
                    return Some(result);
                }
            }
        }
        None
    }

    /// The forced-safe-search host for `host`, if the rewrite table knows
    /// it. Matching is case-insensitive.
    pub fn safe_search_rewrite(&self, host: &str) -> Option<&'static str> {
        SafeSearchService::rewrite(&normalize_hostname(host))
    }

    /// Atomically replace the active filter sets.
    ///
    /// A compile error leaves the previous sets active. With
    /// `async_compile`, compilation runs on a background task and errors
    /// only log; in-flight checks always finish against the set they
    /// loaded.
    pub async fn set_filters(
        &self,
        blocking: Vec<FilterList>,
        allow: Vec<FilterList>,
        async_compile: bool,
    ) -> Result<(), DomainError> {
        if self.closed.load(AtomicOrdering::Acquire) {
            return Err(DomainError::EngineClosed);
        }

        if async_compile {
            let filters = Arc::clone(&self.filters);
            let handle = tokio::spawn(async move {
                match compile_filters(&blocking, &allow) {
                    Ok(compiled) => filters.store(Arc::new(compiled)),
                    Err(e) => error!(error = %e, "background filter compile failed; keeping previous set"),
                }
            });
            if let Some(previous) = self.recompile_task.lock().unwrap().replace(handle) {
                // A newer compile supersedes an unfinished older one.
                previous.abort();
            }
            return Ok(());
        }

        let compiled = compile_filters(&blocking, &allow)?;
        self.filters.store(Arc::new(compiled));
        Ok(())
    }

    /// The safe-search result cached for `host`, if any. Test hook
    /// alongside `purge_caches`.
    pub fn safe_search_cached(&self, host: &str) -> Option<FilterResult> {
        self.safe_search.cached_result(&normalize_hostname(host))
    }

    /// Drop every cached service decision. Test hook; the caches otherwise
    /// live for the engine's lifetime.
    pub fn purge_caches(&self) {
        self.safe_browsing_cache.clear();
        self.parental_cache.clear();
        self.safe_search_cache.clear();
    }

    /// Release cache memory and stop background work. Further calls on the
    /// engine fail with `EngineClosed`.
    pub fn close(&self) {
        if self.closed.swap(true, AtomicOrdering::AcqRel) {
            return;
        }
        if let Some(task) = self.recompile_task.lock().unwrap().take() {
            task.abort();
        }
        self.purge_caches();
        info!("Filter engine closed");
    }
}

#[async_trait]
impl ContentFilter for FilterEngine {
    async fn check_host(
        &self,
        host: &str,
        qtype: RecordType,
        settings: &RequestFilterSettings,
    ) -> Result<FilterResult, DomainError> {
        FilterEngine::check_host(self, host, qtype, settings).await
    }

    fn safe_search_rewrite(&self, host: &str) -> Option<&'static str> {
        FilterEngine::safe_search_rewrite(self, host)
    }

    async fn set_filters(
        &self,
        blocking: Vec<FilterList>,
        allow: Vec<FilterList>,
        async_compile: bool,
    ) -> Result<(), DomainError> {
        FilterEngine::set_filters(self, blocking, allow, async_compile).await
    }

    fn close(&self) {
        FilterEngine::close(self);
    }
}

/// Builder wiring the engine's collaborators: filter lists, reputation
/// upstreams, and the safe-search resolver.
pub struct FilterEngineBuilder {
    config: FilteringConfig,
    blocking: Vec<FilterList>,
    allow: Vec<FilterList>,
    safe_browsing_upstream: Option<Arc<dyn ReputationClient>>,
    parental_upstream: Option<Arc<dyn ReputationClient>>,
    resolver: Option<Arc<dyn HostResolver>>,
}

impl FilterEngineBuilder {
    pub fn new(config: FilteringConfig) -> Self {
        Self {
            config,
            blocking: Vec::new(),
            allow: Vec::new(),
            safe_browsing_upstream: None,
            parental_upstream: None,
            resolver: None,
        }
    }

    pub fn blocking_filters(mut self, filters: Vec<FilterList>) -> Self {
        self.blocking = filters;
        self
    }

    pub fn allow_filters(mut self, filters: Vec<FilterList>) -> Self {
        self.allow = filters;
        self
    }

    pub fn safe_browsing_upstream(mut self, upstream: Arc<dyn ReputationClient>) -> Self {
        self.safe_browsing_upstream = Some(upstream);
        self
    }

    pub fn parental_upstream(mut self, upstream: Arc<dyn ReputationClient>) -> Self {
        self.parental_upstream = Some(upstream);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(self) -> Result<FilterEngine, DomainError> {
        let config = self.config;
        let cache_ttl = Duration::from_secs(config.cache_time_secs);

        let safe_browsing_cache = Arc::new(TtlCache::new(config.safe_browsing_cache_size));
        let parental_cache = Arc::new(TtlCache::new(config.parental_cache_size));
        let safe_search_cache = Arc::new(TtlCache::new(config.safe_search_cache_size));

        let safe_browsing = self.safe_browsing_upstream.map(|upstream| {
            ReputationChecker::new(
                "safe browsing",
                FilterReason::FilteredSafeBrowsing,
                upstream,
                Arc::clone(&safe_browsing_cache),
                cache_ttl,
            )
        });
        let parental = self.parental_upstream.map(|upstream| {
            ReputationChecker::new(
                "parental control",
                FilterReason::FilteredParental,
                upstream,
                Arc::clone(&parental_cache),
                cache_ttl,
            )
        });
        let safe_search =
            SafeSearchService::new(self.resolver, Arc::clone(&safe_search_cache), cache_ttl);

        let compiled = compile_filters(&self.blocking, &self.allow)?;

        info!(
            safe_browsing = config.safe_browsing_enabled,
            parental = config.parental_enabled,
            safe_search = config.safe_search_enabled,
            "Filter engine initialized"
        );

        Ok(FilterEngine {
            filters: Arc::new(ArcSwap::from_pointee(compiled)),
            safe_browsing,
            parental,
            safe_search,
            safe_browsing_cache,
            parental_cache,
            safe_search_cache,
            safe_browsing_server: config.safe_browsing_server,
            parental_server: config.parental_server,
            closed: AtomicBool::new(false),
            recompile_task: Mutex::new(None),
        })
    }
}

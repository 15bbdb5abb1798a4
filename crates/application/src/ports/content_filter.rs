use async_trait::async_trait;
use warden_dns_domain::{DomainError, FilterList, FilterResult, RecordType, RequestFilterSettings};

/// Application-layer port for the content filter engine.
///
/// All per-query filtering goes through this port. The implementation
/// lives in the infrastructure layer and is injected where the DNS
/// request pipeline needs a policy decision.
///
/// `check_host` is async because the reputation and safe-search services
/// may hit the network; everything list-based is answered from memory.
#[async_trait]
pub trait ContentFilter: Send + Sync {
    /// Decide whether `host`/`qtype` is blocked, rewritten, or passed
    /// through under `settings`.
    ///
    /// Remote-service failures are absorbed (fail-open); an `Err` here
    /// means corrupt engine state, not a transient lookup problem.
    async fn check_host(
        &self,
        host: &str,
        qtype: RecordType,
        settings: &RequestFilterSettings,
    ) -> Result<FilterResult, DomainError>;

    /// The forced-safe-search replacement for `host`, if the rewrite
    /// table knows it.
    fn safe_search_rewrite(&self, host: &str) -> Option<&'static str>;

    /// Atomically replace the compiled filter sets. In-flight checks
    /// finish against the old sets. With `async_compile` the work runs on
    /// a background task and compile errors only log (the previous sets
    /// stay active either way).
    async fn set_filters(
        &self,
        blocking: Vec<FilterList>,
        allow: Vec<FilterList>,
        async_compile: bool,
    ) -> Result<(), DomainError>;

    /// Drop cached service decisions and stop background work.
    fn close(&self);
}

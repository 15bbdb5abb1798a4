use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

/// Why a query was (or was not) filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterReason {
    /// No rule or service matched.
    NotFilteredNotFound,
    /// An allowlist rule matched; blocking and reputation are suppressed.
    NotFilteredAllowList,
    /// A blocking rule or hosts-file entry matched.
    FilteredBlockList,
    /// The Safe Browsing reputation service flagged the host.
    FilteredSafeBrowsing,
    /// The Parental Control reputation service flagged the host.
    FilteredParental,
    /// The host was rewritten to its forced-safe-search variant.
    FilteredSafeSearch,
    /// A per-client blocked-service rule matched.
    FilteredBlockedService,
}

impl FilterReason {
    /// Whether this reason means the query is filtered.
    ///
    /// `FilterResult::is_filtered` must always agree with this.
    pub fn is_filtered(&self) -> bool {
        matches!(
            self,
            FilterReason::FilteredBlockList
                | FilterReason::FilteredSafeBrowsing
                | FilterReason::FilteredParental
                | FilterReason::FilteredSafeSearch
                | FilterReason::FilteredBlockedService
        )
    }

    /// Whether any rule or service produced a decision (the allowlist
    /// counts: it is an explicit decision not to filter).
    pub fn is_matched(&self) -> bool {
        *self != FilterReason::NotFilteredNotFound
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterReason::NotFilteredNotFound => "NotFilteredNotFound",
            FilterReason::NotFilteredAllowList => "NotFilteredAllowList",
            FilterReason::FilteredBlockList => "FilteredBlockList",
            FilterReason::FilteredSafeBrowsing => "FilteredSafeBrowsing",
            FilterReason::FilteredParental => "FilteredParental",
            FilterReason::FilteredSafeSearch => "FilteredSafeSearch",
            FilterReason::FilteredBlockedService => "FilteredBlockedService",
        }
    }
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rule that justified a filtering decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRule {
    /// Original source line, whitespace preserved.
    pub text: Arc<str>,
    /// Identifier of the list the rule came from.
    pub filter_id: i64,
    /// Address to answer with (hosts-file entries, safe-search rewrites).
    pub ip: Option<IpAddr>,
}

impl MatchedRule {
    pub fn new(text: impl Into<Arc<str>>, filter_id: i64) -> Self {
        Self {
            text: text.into(),
            filter_id,
            ip: None,
        }
    }

    pub fn with_ip(text: impl Into<Arc<str>>, filter_id: i64, ip: IpAddr) -> Self {
        Self {
            text: text.into(),
            filter_id,
            ip: Some(ip),
        }
    }
}

/// The outcome of one `check_host` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResult {
    pub reason: FilterReason,
    pub is_filtered: bool,
    /// Rules that justified the decision. Empty for reputation decisions,
    /// which have no rule text.
    pub rules: Vec<MatchedRule>,
    /// Synthetic address to return instead of resolving.
    pub ip: Option<IpAddr>,
    /// Rewritten hostname (safe search).
    pub canon_name: Option<String>,
    /// Name of the matched blocked service, if any.
    pub service_name: Option<Arc<str>>,
}

impl FilterResult {
    /// A pass-through result: nothing matched.
    pub fn not_found() -> Self {
        Self::with_reason(FilterReason::NotFilteredNotFound)
    }

    pub fn with_reason(reason: FilterReason) -> Self {
        Self {
            reason,
            is_filtered: reason.is_filtered(),
            rules: Vec::new(),
            ip: None,
            canon_name: None,
            service_name: None,
        }
    }

    pub fn with_rule(reason: FilterReason, rule: MatchedRule) -> Self {
        let ip = rule.ip;
        Self {
            reason,
            is_filtered: reason.is_filtered(),
            rules: vec![rule],
            ip,
            canon_name: None,
            service_name: None,
        }
    }
}

impl Default for FilterResult {
    fn default() -> Self {
        Self::not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_is_filtered_consistency() {
        let filtered = [
            FilterReason::FilteredBlockList,
            FilterReason::FilteredSafeBrowsing,
            FilterReason::FilteredParental,
            FilterReason::FilteredSafeSearch,
            FilterReason::FilteredBlockedService,
        ];
        for reason in filtered {
            assert!(reason.is_filtered());
            assert!(FilterResult::with_reason(reason).is_filtered);
        }
        for reason in [
            FilterReason::NotFilteredNotFound,
            FilterReason::NotFilteredAllowList,
        ] {
            assert!(!reason.is_filtered());
            assert!(!FilterResult::with_reason(reason).is_filtered);
        }
    }

    #[test]
    fn test_allowlist_is_matched_but_not_filtered() {
        let reason = FilterReason::NotFilteredAllowList;
        assert!(reason.is_matched());
        assert!(!reason.is_filtered());
    }

    #[test]
    fn test_with_rule_propagates_ip() {
        let rule = MatchedRule::with_ip("0.0.0.0 ads.example", 3, "0.0.0.0".parse().unwrap());
        let result = FilterResult::with_rule(FilterReason::FilteredBlockList, rule);
        assert_eq!(result.ip, Some("0.0.0.0".parse().unwrap()));
        assert_eq!(result.rules.len(), 1);
        assert_eq!(result.rules[0].filter_id, 3);
    }
}

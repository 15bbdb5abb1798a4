use std::sync::Arc;

/// Additional blocklist rules applied for one named third-party service
/// ("blocked services"). The rules use the same adblock-style syntax as
/// filter lists and are matched as blocking rules regardless of the
/// request's `filtering_enabled` flag.
#[derive(Debug, Clone)]
pub struct ServiceEntry {
    pub name: Arc<str>,
    pub rules: Vec<Arc<str>>,
}

impl ServiceEntry {
    pub fn new(name: impl Into<Arc<str>>, rules: Vec<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }
}

/// Per-request filtering settings.
///
/// These override the engine's configured defaults for a single query,
/// which is how per-client policies are expressed: the caller resolves the
/// client to a settings bundle and passes it with every check.
#[derive(Debug, Clone, Default)]
pub struct RequestFilterSettings {
    pub filtering_enabled: bool,
    pub safe_browsing_enabled: bool,
    pub parental_enabled: bool,
    pub safe_search_enabled: bool,
    /// Per-client blocked services, checked before everything else.
    pub services_rules: Vec<ServiceEntry>,
}

impl RequestFilterSettings {
    /// Settings with list filtering on and every network service off.
    pub fn filtering_only() -> Self {
        Self {
            filtering_enabled: true,
            ..Self::default()
        }
    }
}

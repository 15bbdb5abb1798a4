use compact_str::CompactString;
use rustc_hash::FxBuildHasher;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use warden_dns_domain::{MatchedRule, RecordType};

/// One address mapping parsed from a hosts-file line.
#[derive(Debug, Clone)]
struct HostEntry {
    ip: IpAddr,
    /// The full source line, whitespace preserved. This is what a matched
    /// rule reports as its text.
    text: Arc<str>,
    filter_id: i64,
}

/// Hosts-file mappings compiled out of the filter lists.
///
/// Grammar (tolerant):
///   `WS? IP WS HOST (WS HOST)* WS? ('#' comment)?`
/// Blank lines and comment-only lines are ignored. A host may appear on
/// several lines with different addresses; each (host, family) pair keeps
/// insertion order, and lookups return the first address of the matching
/// family.
///
/// Only exact hostname equality matches: subdomains do NOT inherit a
/// parent's entry. Comparison is case-insensitive.
#[derive(Default)]
pub struct HostsTable {
    entries: HashMap<CompactString, Vec<HostEntry>, FxBuildHasher>,
}

impl HostsTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Try to consume `line` as a hosts-file mapping.
    ///
    /// Returns `true` if the line was a hosts line (and was added), so the
    /// caller knows not to hand it to the rule parser. Blank and
    /// comment-only lines are not hosts lines.
    pub fn add_line(&mut self, line: &str, filter_id: i64) -> bool {
        let content = match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        };

        let mut tokens = content.split_whitespace();
        let addr = match tokens.next() {
            Some(t) => t,
            None => return false,
        };
        let ip: IpAddr = match addr.parse() {
            Ok(ip) => ip,
            Err(_) => return false,
        };

        let mut consumed = false;
        let text: Arc<str> = Arc::from(line);
        for host in tokens {
            consumed = true;
            self.entries
                .entry(CompactString::new(host.to_ascii_lowercase()))
                .or_default()
                .push(HostEntry {
                    ip,
                    text: Arc::clone(&text),
                    filter_id,
                });
        }
        consumed
    }

    /// Exact lookup for `host`.
    ///
    /// `A` returns the first IPv4 entry, `AAAA` the first IPv6 entry. When
    /// the host is present but has no address of the requested family (or
    /// the query type carries no address at all), the match has an empty
    /// IP: the host is still filtered, the answer is an implicit NODATA.
    pub fn lookup(&self, host: &str, qtype: RecordType) -> Option<MatchedRule> {
        let entries = self.entries.get(host)?;

        let wanted_v4 = match qtype {
            RecordType::A => true,
            RecordType::AAAA => false,
            _ => {
                let first = entries.first()?;
                return Some(MatchedRule::new(Arc::clone(&first.text), first.filter_id));
            }
        };

        for entry in entries {
            if entry.ip.is_ipv4() == wanted_v4 {
                return Some(MatchedRule {
                    text: Arc::clone(&entry.text),
                    filter_id: entry.filter_id,
                    ip: Some(entry.ip),
                });
            }
        }

        // Host known, wrong family: filtered with no address.
        let first = entries.first()?;
        Some(MatchedRule::new(Arc::clone(&first.text), first.filter_id))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

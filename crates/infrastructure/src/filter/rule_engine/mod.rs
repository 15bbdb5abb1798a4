mod rule;
mod trie;

pub use rule::NetworkRule;
pub use trie::DomainTrie;

use smallvec::SmallVec;
use warden_dns_domain::RecordType;

/// A compiled, immutable set of adblock-style DNS rules.
///
/// Domain-anchored rules are indexed in a reversed-label trie; regex and
/// mask rules are scanned linearly. The set is replaced wholesale on
/// `set_filters` (the evaluator swaps it behind an `ArcSwap`), so nothing
/// here needs interior mutability.
#[derive(Default)]
pub struct DnsRuleSet {
    rules: Vec<NetworkRule>,
    domain_index: DomainTrie,
    /// Ids of rules that cannot be trie-indexed (regex, masks).
    scan: Vec<u32>,
}

impl DnsRuleSet {
    /// Build the set from parsed rules. Rule ids are their positions, so
    /// insertion order decides ties within a precedence tier.
    pub fn compile(rules: Vec<NetworkRule>) -> Self {
        let mut domain_index = DomainTrie::new();
        let mut scan = Vec::new();

        for (id, rule) in rules.iter().enumerate() {
            match rule.index_domain() {
                Some(domain) => domain_index.insert(domain, id as u32),
                None => scan.push(id as u32),
            }
        }

        Self {
            rules,
            domain_index,
            scan,
        }
    }

    /// Find the winning rule for `host`/`qtype` under the precedence
    ///
    ///   1. important allowlist
    ///   2. important block
    ///   3. allowlist
    ///   4. block
    ///
    /// Within a tier the earliest rule wins. `host` must be lowercase.
    pub fn match_query(&self, host: &str, qtype: RecordType) -> Option<&NetworkRule> {
        let mut candidates: SmallVec<[u32; 4]> = self.domain_index.lookup(host);
        candidates.extend_from_slice(&self.scan);
        candidates.sort_unstable();

        let mut best: Option<(u8, u32)> = None;
        for id in candidates {
            let rule = &self.rules[id as usize];
            if !rule.matches(host, qtype) {
                continue;
            }
            let tier = rule.tier();
            match best {
                Some((best_tier, _)) if best_tier <= tier => {}
                _ => best = Some((tier, id)),
            }
        }

        best.map(|(_, id)| &self.rules[id as usize])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_dns_domain::DomainError;

    fn compile(lines: &[&str]) -> DnsRuleSet {
        let rules: Result<Vec<_>, DomainError> = lines
            .iter()
            .map(|l| NetworkRule::parse(l, 0, false).map(Option::unwrap))
            .collect();
        DnsRuleSet::compile(rules.unwrap())
    }

    #[test]
    fn test_block_rule_wins_without_allow() {
        let set = compile(&["||example.org^"]);
        let rule = set.match_query("test.example.org", RecordType::A).unwrap();
        assert!(!rule.allowlist);
    }

    #[test]
    fn test_allow_beats_block() {
        let set = compile(&["||example.org^", "@@||test.example.org"]);
        let rule = set.match_query("test.example.org", RecordType::A).unwrap();
        assert!(rule.allowlist);
        // apex still blocked
        let rule = set.match_query("example.org", RecordType::A).unwrap();
        assert!(!rule.allowlist);
    }

    #[test]
    fn test_important_block_beats_allow() {
        let set = compile(&["@@||example.org^", "||test.example.org^$important"]);
        let rule = set.match_query("test.example.org", RecordType::A).unwrap();
        assert!(!rule.allowlist);
        assert!(rule.important);
        // the apex only matches the allowlist rule
        let rule = set.match_query("example.org", RecordType::A).unwrap();
        assert!(rule.allowlist);
    }

    #[test]
    fn test_important_allow_beats_important_block() {
        let set = compile(&["||ads.net^$important", "@@||ads.net^$important"]);
        let rule = set.match_query("ads.net", RecordType::A).unwrap();
        assert!(rule.allowlist);
    }

    #[test]
    fn test_regex_and_allow_interaction() {
        let set = compile(&[r"/example\.org/", "@@||test.example.org^"]);
        assert!(!set.match_query("example.org", RecordType::A).unwrap().allowlist);
        assert!(set
            .match_query("test.example.org", RecordType::A)
            .unwrap()
            .allowlist);
        // regex matches the embedded string too
        assert!(!set
            .match_query("onemoreexample.org", RecordType::A)
            .unwrap()
            .allowlist);
    }

    #[test]
    fn test_dnstype_restriction_in_set() {
        let set = compile(&["||example.org^$dnstype=AAAA", "@@||test.example.org^"]);
        assert!(set.match_query("example.org", RecordType::A).is_none());
        assert!(set.match_query("example.org", RecordType::AAAA).is_some());
    }

    #[test]
    fn test_no_match() {
        let set = compile(&["||doubleclick.net^"]);
        assert!(set.match_query("example.org", RecordType::A).is_none());
        assert!(set.match_query("wmconvirus.narod.ru", RecordType::A).is_none());
    }

    #[test]
    fn test_insertion_order_breaks_ties() {
        let set = compile(&["||ads.net^", "||ads.net^$dnstype=A"]);
        let rule = set.match_query("ads.net", RecordType::A).unwrap();
        assert_eq!(rule.text.as_ref(), "||ads.net^");
    }
}

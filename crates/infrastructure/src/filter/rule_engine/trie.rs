use compact_str::CompactString;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::collections::HashMap;

/// A node in the reversed-label domain trie.
#[derive(Default)]
struct TrieNode {
    children: HashMap<CompactString, TrieNode, FxBuildHasher>,
    /// Rules whose domain terminates at this node.
    rule_ids: SmallVec<[u32; 2]>,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            children: HashMap::with_hasher(FxBuildHasher),
            rule_ids: SmallVec::new(),
        }
    }
}

/// Trie over reversed domain labels for `||host^`-style rules.
///
/// `||ads.example.org^` is stored as the path ["org", "example", "ads"]
/// with the rule id at the final node. Lookup walks the query's reversed
/// labels and collects every rule id passed on the way, so a rule matches
/// its own domain AND any subdomain of it.
///
/// Built once per `set_filters` compile and replaced wholesale.
#[derive(Default)]
pub struct DomainTrie {
    root: TrieNode,
}

impl DomainTrie {
    pub fn new() -> Self {
        Self {
            root: TrieNode::new(),
        }
    }

    /// Insert `domain` (already lowercase, no `||`/`^` decoration) for
    /// `rule_id`.
    pub fn insert(&mut self, domain: &str, rule_id: u32) {
        let mut node = &mut self.root;
        for label in domain.split('.').rev() {
            node = node.children.entry(CompactString::new(label)).or_default();
        }
        node.rule_ids.push(rule_id);
    }

    /// Collect the ids of every rule whose domain equals `host` or is a
    /// parent domain of it, in insertion order per node.
    pub fn lookup(&self, host: &str) -> SmallVec<[u32; 4]> {
        let mut node = &self.root;
        let mut result: SmallVec<[u32; 4]> = SmallVec::new();

        for label in host.split('.').rev() {
            match node.children.get(label) {
                Some(child) => {
                    result.extend_from_slice(&child.rule_ids);
                    node = child;
                }
                None => break,
            }
        }

        result
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_apex_and_subdomains() {
        let mut trie = DomainTrie::new();
        trie.insert("example.org", 0);

        assert_eq!(trie.lookup("example.org").as_slice(), &[0]);
        assert_eq!(trie.lookup("test.example.org").as_slice(), &[0]);
        assert_eq!(trie.lookup("a.b.example.org").as_slice(), &[0]);
    }

    #[test]
    fn test_no_partial_label_match() {
        let mut trie = DomainTrie::new();
        trie.insert("doubleclick.net", 1);

        assert!(trie.lookup("nodoubleclick.net").is_empty());
        assert!(trie.lookup("doubleclick.net.ru").is_empty());
    }

    #[test]
    fn test_collects_all_ancestors() {
        let mut trie = DomainTrie::new();
        trie.insert("org", 0);
        trie.insert("example.org", 1);
        trie.insert("deep.example.org", 2);

        assert_eq!(trie.lookup("x.deep.example.org").as_slice(), &[0, 1, 2]);
        assert_eq!(trie.lookup("example.org").as_slice(), &[0, 1]);
    }

    #[test]
    fn test_sibling_domains_do_not_collide() {
        let mut trie = DomainTrie::new();
        trie.insert("ads.example.org", 0);

        assert!(trie.lookup("cdn.example.org").is_empty());
        assert!(trie.lookup("example.org").is_empty());
    }
}

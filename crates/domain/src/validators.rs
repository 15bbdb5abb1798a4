/// Normalize a hostname for matching: lowercase and strip one trailing dot.
///
/// All internal keys (hosts table, rule trie, cache hashing) are built
/// from normalized names so matching stays case-insensitive.
pub fn normalize_hostname(host: &str) -> String {
    let host = host.strip_suffix('.').unwrap_or(host);
    host.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases() {
        assert_eq!(normalize_hostname("ExAmPle.ORG"), "example.org");
    }

    #[test]
    fn test_normalize_strips_trailing_dot() {
        assert_eq!(normalize_hostname("example.org."), "example.org");
    }
}

use regex::Regex;
use smallvec::SmallVec;
use std::str::FromStr;
use std::sync::Arc;
use warden_dns_domain::{DomainError, RecordType};

/// How a rule's pattern is matched against the queried hostname.
#[derive(Debug)]
enum RulePattern {
    /// `||host^` or a plain hostname: matches the domain and subdomains.
    Domain(String),
    /// `/pattern/`: regex over the full lowercased hostname.
    Regex(Regex),
    /// `host*.domain`: glob mask, compiled to an unanchored regex.
    Mask(Regex),
}

/// One compiled adblock-style DNS rule.
///
/// Supported syntax: `||host^`, `@@` (allowlist), `$important`,
/// `$dnstype=TYPE[,TYPE...]`, `/regex/`, and `*` masks. `!` and `#` start
/// comment lines.
#[derive(Debug)]
pub struct NetworkRule {
    /// Original source line, whitespace preserved.
    pub text: Arc<str>,
    pub filter_id: i64,
    pub allowlist: bool,
    pub important: bool,
    /// Query types this rule is restricted to. `None` means all types.
    pub dns_types: Option<SmallVec<[RecordType; 2]>>,
    pattern: RulePattern,
}

impl NetworkRule {
    /// Parse one line of filter text.
    ///
    /// Returns `Ok(None)` for blank and comment lines. `force_allow`
    /// compiles the rule as an allowlist rule regardless of an `@@`
    /// prefix; that is how the dedicated allowlist filter sets work.
    pub fn parse(line: &str, filter_id: i64, force_allow: bool) -> Result<Option<Self>, DomainError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('!') || trimmed.starts_with('#') {
            return Ok(None);
        }

        let (body, explicit_allow) = match trimmed.strip_prefix("@@") {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };

        let (pattern_text, modifier_text) = split_modifiers(body)?;
        let (important, dns_types) = parse_modifiers(trimmed, modifier_text)?;
        let pattern = compile_pattern(trimmed, pattern_text)?;

        Ok(Some(Self {
            text: Arc::from(line),
            filter_id,
            allowlist: explicit_allow || force_allow,
            important,
            dns_types,
            pattern,
        }))
    }

    /// Whether this rule applies to `host` for query type `qtype`.
    /// `host` must already be lowercase.
    pub fn matches(&self, host: &str, qtype: RecordType) -> bool {
        if let Some(types) = &self.dns_types {
            if !types.contains(&qtype) {
                return false;
            }
        }
        match &self.pattern {
            RulePattern::Domain(domain) => domain_matches(domain, host),
            RulePattern::Regex(re) | RulePattern::Mask(re) => re.is_match(host),
        }
    }

    /// The rule's anchor domain, when it is trie-indexable.
    pub(super) fn index_domain(&self) -> Option<&str> {
        match &self.pattern {
            RulePattern::Domain(domain) => Some(domain),
            _ => None,
        }
    }

    /// Precedence tier: lower wins. Important allow < important block <
    /// allow < block.
    pub(super) fn tier(&self) -> u8 {
        match (self.important, self.allowlist) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        }
    }
}

/// `domain` matches `host` when they are equal or `host` is a subdomain.
fn domain_matches(domain: &str, host: &str) -> bool {
    if host == domain {
        return true;
    }
    host.len() > domain.len()
        && host.ends_with(domain)
        && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
}

/// Split `body` into (pattern, modifiers). Regex rules delimit the pattern
/// with slashes so a `$` inside the expression is not a separator.
fn split_modifiers(body: &str) -> Result<(&str, &str), DomainError> {
    if let Some(rest) = body.strip_prefix('/') {
        let end = rest
            .rfind('/')
            .ok_or_else(|| DomainError::InvalidRule(body.to_string()))?;
        let after = &rest[end + 1..];
        if after.is_empty() {
            return Ok((&body[..end + 2], ""));
        }
        return match after.strip_prefix('$') {
            Some(mods) => Ok((&body[..end + 2], mods)),
            None => Err(DomainError::InvalidRule(body.to_string())),
        };
    }

    match body.rfind('$') {
        Some(idx) => Ok((&body[..idx], &body[idx + 1..])),
        None => Ok((body, "")),
    }
}

/// Parse the `$`-modifier list: `important` and `dnstype=TYPE[,TYPE...]`
/// (`|` is accepted between types as well).
fn parse_modifiers(
    rule: &str,
    modifier_text: &str,
) -> Result<(bool, Option<SmallVec<[RecordType; 2]>>), DomainError> {
    let mut important = false;
    let mut dns_types: Option<SmallVec<[RecordType; 2]>> = None;

    let mut parts = modifier_text
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .peekable();

    while let Some(part) = parts.next() {
        if part == "important" {
            important = true;
        } else if let Some(list) = part.strip_prefix("dnstype=") {
            let mut types: SmallVec<[RecordType; 2]> = SmallVec::new();
            for name in list.split('|') {
                types.push(
                    RecordType::from_str(name)
                        .map_err(|_| DomainError::InvalidRule(rule.to_string()))?,
                );
            }
            // Comma-separated continuation of the type list.
            while let Some(&next) = parts.peek() {
                match RecordType::from_str(next) {
                    Ok(rt) if !next.contains('=') => {
                        types.push(rt);
                        parts.next();
                    }
                    _ => break,
                }
            }
            if types.is_empty() {
                return Err(DomainError::InvalidRule(rule.to_string()));
            }
            dns_types = Some(types);
        } else {
            return Err(DomainError::InvalidRule(format!(
                "{rule}: unsupported modifier '{part}'"
            )));
        }
    }

    Ok((important, dns_types))
}

fn compile_pattern(rule: &str, pattern_text: &str) -> Result<RulePattern, DomainError> {
    if let Some(inner) = pattern_text
        .strip_prefix('/')
        .and_then(|p| p.strip_suffix('/'))
    {
        if inner.is_empty() {
            return Err(DomainError::InvalidRule(rule.to_string()));
        }
        let re = Regex::new(inner)
            .map_err(|e| DomainError::RuleCompile(format!("{rule}: {e}")))?;
        return Ok(RulePattern::Regex(re));
    }

    let mut bare = pattern_text.strip_prefix("||").unwrap_or(pattern_text);
    bare = bare.strip_suffix('^').unwrap_or(bare);

    if bare.is_empty() {
        return Err(DomainError::InvalidRule(rule.to_string()));
    }

    let bare = bare.to_ascii_lowercase();

    if bare.contains('*') {
        let mut expr = String::with_capacity(bare.len() + 8);
        for (i, chunk) in bare.split('*').enumerate() {
            if i > 0 {
                expr.push_str(".*");
            }
            expr.push_str(&regex::escape(chunk));
        }
        let re = Regex::new(&expr)
            .map_err(|e| DomainError::RuleCompile(format!("{rule}: {e}")))?;
        return Ok(RulePattern::Mask(re));
    }

    Ok(RulePattern::Domain(bare))
}

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),

    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid filter rule: {0}")]
    InvalidRule(String),

    #[error("Rule compile error: {0}")]
    RuleCompile(String),

    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),

    #[error("Reputation lookup failed: {0}")]
    ReputationLookup(String),

    #[error("Resolver lookup failed: {0}")]
    ResolverLookup(String),

    #[error("Filter engine is closed")]
    EngineClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

//! Warden DNS Application Layer
//!
//! Ports between the filtering core and its collaborators. The engine in
//! the infrastructure crate implements `ContentFilter`; the embedding
//! resolver supplies `ReputationClient` and `HostResolver` implementations.
pub mod ports;

pub use ports::{
    ContentFilter, FullHash, HashPrefix, HostResolver, PrefixMatches, ReputationClient,
};

// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Correlation identifiers: generation, format validation, and per-call resolution.
//!
//! Generated identifiers have the fixed layout `req_` followed by twelve
//! characters from `[0-9a-z]`. Client-supplied identifiers are opaque: any
//! string that is non-empty after trimming is accepted verbatim.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::types::CallContext;

/// Prefix of identifiers generated for calls without a client-supplied one.
pub const GENERATED_PREFIX: &str = "req_";

/// Prefix of the identifier attached to server bootstrap logging.
pub const STARTUP_PREFIX: &str = "startup_";

/// Number of random characters after the prefix.
pub const SUFFIX_LEN: usize = 12;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static GENERATED_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^req_[0-9a-z]{12}$").expect("static regex"));

/// Identifier tying together every log record of one logical call.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a fresh `req_` identifier.
    ///
    /// Draws from the OS randomness source; if that source is unavailable the
    /// process aborts, since no call can be served correctly without it.
    pub fn generate() -> Self {
        Self::with_prefix(GENERATED_PREFIX)
    }

    /// Generate the identifier used while the server boots.
    pub fn startup() -> Self {
        Self::with_prefix(STARTUP_PREFIX)
    }

    fn with_prefix(prefix: &str) -> Self {
        let mut id = String::with_capacity(prefix.len() + SUFFIX_LEN);
        id.push_str(prefix);
        id.push_str(&random_suffix());
        Self(id)
    }

    /// Wrap a client-supplied identifier without altering it.
    ///
    /// Returns `None` when the value is empty after trimming.
    pub fn from_client(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// True iff `id` has the generated layout.
    ///
    /// Diagnostic only: client-supplied identifiers are never rejected by it.
    pub fn validate_generated(id: &str) -> bool {
        GENERATED_FORMAT.is_match(id)
    }

    /// True iff this identifier has the generated layout.
    pub fn is_generated(&self) -> bool {
        Self::validate_generated(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Twelve base-36 digits taken from a v4 UUID.
fn random_suffix() -> String {
    let mut bits = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        suffix.push(ALPHABET[(bits % 36) as usize] as char);
        bits /= 36;
    }
    suffix
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CorrelationId({})", self.0)
    }
}

impl AsRef<str> for CorrelationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve the correlation identifier for one call.
///
/// The client-supplied value wins when present and non-blank; otherwise a
/// new identifier is generated. Never fails.
pub fn resolve_correlation_id(ctx: &CallContext) -> CorrelationId {
    ctx.supplied_correlation_id()
        .and_then(|id| CorrelationId::from_client(id))
        .unwrap_or_else(CorrelationId::generate)
}

/// Extension trait for adding correlation IDs to tracing spans.
pub trait CorrelationIdExt {
    /// Record the correlation ID as a span field.
    fn record_correlation_id(&self, id: &CorrelationId);
}

impl CorrelationIdExt for tracing::Span {
    fn record_correlation_id(&self, id: &CorrelationId) {
        self.record("correlation_id", id.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_format() {
        for _ in 0..100 {
            let id = CorrelationId::generate();
            assert!(id.is_generated(), "bad id: {}", id);
            assert_eq!(id.as_str().len(), GENERATED_PREFIX.len() + SUFFIX_LEN);
        }
    }

    #[test]
    fn test_generate_no_collisions() {
        let ids: HashSet<_> = (0..10_000).map(|_| CorrelationId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_generate_concurrently() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..500).map(|_| CorrelationId::generate()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(id.is_generated());
                all.insert(id);
            }
        }
        assert_eq!(all.len(), 4_000);
    }

    #[test]
    fn test_startup_id() {
        let id = CorrelationId::startup();
        assert!(id.as_str().starts_with(STARTUP_PREFIX));
        assert!(!id.is_generated());
    }

    #[test]
    fn test_validate_generated() {
        assert!(CorrelationId::validate_generated("req_0123456789az"));
        assert!(!CorrelationId::validate_generated("req_0123456789a"));
        assert!(!CorrelationId::validate_generated("req_0123456789abc"));
        assert!(!CorrelationId::validate_generated("req_0123456789AZ"));
        assert!(!CorrelationId::validate_generated("test_echo_abc123"));
        assert!(!CorrelationId::validate_generated(" req_0123456789az"));
    }

    #[test]
    fn test_resolve_prefers_client_value() {
        let ctx = CallContext::with_correlation_id("test_echo_abc123");
        assert_eq!(resolve_correlation_id(&ctx).as_str(), "test_echo_abc123");
    }

    #[test]
    fn test_resolve_client_value_not_validated() {
        let ctx = CallContext::with_correlation_id("anything goes / ✓");
        assert_eq!(resolve_correlation_id(&ctx).as_str(), "anything goes / ✓");
    }

    #[test]
    fn test_resolve_generates_when_missing_or_blank() {
        for ctx in [
            CallContext::new(),
            CallContext::with_correlation_id(""),
            CallContext::with_correlation_id(" \t\n"),
        ] {
            assert!(resolve_correlation_id(&ctx).is_generated());
        }
    }

    #[test]
    fn test_from_client_rejects_blank() {
        assert!(CorrelationId::from_client("  ").is_none());
        assert_eq!(CorrelationId::from_client("x").unwrap().as_str(), "x");
    }

    #[test]
    fn test_correlation_id_serde() {
        let id = CorrelationId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let parsed: CorrelationId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_correlation_id_debug() {
        let id = CorrelationId::from_client("abc").unwrap();
        assert_eq!(format!("{:?}", id), "CorrelationId(abc)");
    }
}

//! `PatternRouter` — longest-prefix, wildcard-aware route resolution
//! (spec §4.3), implementing [`gateway_kernel::Router`].
//!
//! Patterns shorter than the URI are treated as prefixes: a pattern matches
//! if every one of its segments matches the corresponding leading segment
//! of the URI (literal segments compared exactly, `*` matching any single
//! segment). Among all matching patterns, the winner is selected by
//! `(segment count desc, wildcard count asc, declaration order asc)` —
//! longer, more literal, earliest-registered patterns win.

use gateway_kernel::router::{parse_pattern, split_segments, Segment};
use gateway_kernel::{GatewayError, LambdaSpec, Router};

struct Entry {
    pattern: String,
    segments: Vec<Segment>,
    spec: LambdaSpec,
}

/// Linear-scan router over a small, immutable-after-startup route table.
/// O(R × D) per lookup (R = routes, D = path depth) — entirely adequate for
/// gateway-sized route tables, and trivially correct to verify against the
/// spec's literal scenarios.
#[derive(Default)]
pub struct PatternRouter {
    entries: Vec<Entry>,
}

impl PatternRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches_prefix(segments: &[Segment], uri_segments: &[&str]) -> bool {
        if segments.len() > uri_segments.len() {
            return false;
        }
        segments.iter().zip(uri_segments.iter()).all(|(seg, s)| match seg {
            Segment::Wildcard => true,
            Segment::Literal(lit) => lit == s,
        })
    }

    fn wildcard_count(segments: &[Segment]) -> usize {
        segments.iter().filter(|s| matches!(s, Segment::Wildcard)).count()
    }
}

impl Router for PatternRouter {
    fn register(&mut self, pattern: &str, spec: LambdaSpec) -> Result<(), GatewayError> {
        if !pattern.starts_with('/') {
            return Err(GatewayError::InvalidPattern(
                pattern.to_string(),
                "pattern must start with '/'".to_string(),
            ));
        }
        if self.entries.iter().any(|e| e.pattern == pattern) {
            return Err(GatewayError::DuplicatePattern(pattern.to_string()));
        }
        self.entries.push(Entry {
            pattern: pattern.to_string(),
            segments: parse_pattern(pattern),
            spec,
        });
        Ok(())
    }

    fn resolve(&self, uri: &str) -> Option<&LambdaSpec> {
        let uri_segments = split_segments(uri);

        if uri_segments.is_empty() {
            if let Some(e) = self.entries.iter().find(|e| e.pattern == "/") {
                return Some(&e.spec);
            }
            return self.entries.iter().find(|e| e.pattern == "/*").map(|e| &e.spec);
        }

        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| Self::matches_prefix(&e.segments, &uri_segments))
            .max_by(|(ia, a), (ib, b)| {
                a.segments
                    .len()
                    .cmp(&b.segments.len())
                    .then_with(|| Self::wildcard_count(&b.segments).cmp(&Self::wildcard_count(&a.segments)))
                    .then_with(|| ib.cmp(ia))
            })
            .map(|(_, e)| &e.spec)
    }

    fn routes(&self) -> Vec<(&str, &LambdaSpec)> {
        self.entries.iter().map(|e| (e.pattern.as_str(), &e.spec)).collect()
    }

    fn deregister(&mut self, pattern: &str) -> Result<(), GatewayError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.pattern != pattern);
        if self.entries.len() == before {
            return Err(GatewayError::PatternNotFound(pattern.to_string()));
        }
        Ok(())
    }
}

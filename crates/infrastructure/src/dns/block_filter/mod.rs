//! Domain blocking policy: a reversed-label trie with a small shared
//! decision cache in front of it.

mod domain_trie;

pub use domain_trie::DomainTrie;

use compact_str::CompactString;
use dashmap::DashMap;
use meridian_dns_domain::{BlockingConfig, MatchMode};
use rustc_hash::FxBuildHasher;
use tracing::info;

/// Bound on memoised per-name decisions; the whole map is dropped when
/// full rather than tracking recency.
const DECISION_CACHE_CAPACITY: usize = 10_000;

/// Immutable blocklist matcher.
///
/// The trie never changes after construction, so decisions are stable and
/// safe to memoise. Lookups hit the decision cache first, then walk the
/// trie and record the verdict.
pub struct BlockFilter {
    trie: DomainTrie,
    mode: MatchMode,
    decisions: DashMap<CompactString, bool, FxBuildHasher>,
}

impl BlockFilter {
    pub fn new(trie: DomainTrie, mode: MatchMode) -> Self {
        Self {
            trie,
            mode,
            decisions: DashMap::with_hasher(FxBuildHasher),
        }
    }

    pub fn from_config(config: &BlockingConfig) -> Self {
        let mut trie = DomainTrie::new();
        for pattern in &config.patterns {
            trie.insert(pattern);
        }
        info!(
            patterns = trie.pattern_count(),
            mode = ?config.match_mode,
            "block filter compiled"
        );
        Self::new(trie, config.match_mode)
    }

    /// Check a lowercase dotted name against the policy.
    #[inline]
    pub fn check(&self, name: &str) -> bool {
        if self.trie.is_empty() {
            return false;
        }
        if let Some(decision) = self.decisions.get(name) {
            return *decision;
        }

        let blocked = match self.mode {
            MatchMode::Suffix => self.trie.matches_suffix(name),
            MatchMode::Exact => self.trie.contains_exact(name),
        };

        if self.decisions.len() >= DECISION_CACHE_CAPACITY {
            self.decisions.clear();
        }
        self.decisions.insert(CompactString::new(name), blocked);
        blocked
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn pattern_count(&self) -> usize {
        self.trie.pattern_count()
    }
}

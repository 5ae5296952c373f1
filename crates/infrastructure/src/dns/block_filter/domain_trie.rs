use compact_str::CompactString;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::collections::HashMap;

/// A node in the reversed-label domain trie.
#[derive(Default)]
struct TrieNode {
    children: HashMap<CompactString, TrieNode, FxBuildHasher>,
    /// A blocklist pattern terminates at this node.
    terminal: bool,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            children: HashMap::with_hasher(FxBuildHasher),
            terminal: false,
        }
    }
}

/// Reversed-label trie over blocklist patterns.
///
/// `ads.example.com` is stored as the path ["com", "example", "ads"] with
/// the final node marked terminal. Lookup walks the query name's labels in
/// reverse, so matching cost is O(labels) regardless of list size.
///
/// Built once at startup; reads take no lock.
#[derive(Default)]
pub struct DomainTrie {
    root: TrieNode,
    pattern_count: usize,
}

impl DomainTrie {
    pub fn new() -> Self {
        Self {
            root: TrieNode::new(),
            pattern_count: 0,
        }
    }

    /// Insert a dotted pattern. A leading `*.` is stripped; patterns are
    /// lowercased and a trailing dot is ignored.
    pub fn insert(&mut self, pattern: &str) {
        let pattern = pattern.strip_prefix("*.").unwrap_or(pattern);
        let pattern = pattern.strip_suffix('.').unwrap_or(pattern);
        if pattern.is_empty() {
            return;
        }

        let mut node = &mut self.root;
        for label in pattern.split('.').rev() {
            let label: CompactString = label.chars().map(|c| c.to_ascii_lowercase()).collect();
            node = node.children.entry(label).or_default();
        }
        if !node.terminal {
            node.terminal = true;
            self.pattern_count += 1;
        }
    }

    /// True iff the exact dotted name was inserted as a pattern.
    ///
    /// `ads.example.com` matches only `ads.example.com`; subdomains fall
    /// through.
    pub fn contains_exact(&self, name: &str) -> bool {
        let labels: SmallVec<[&str; 8]> = name.split('.').rev().collect();
        let mut node = &self.root;
        for label in labels {
            match node.children.get(label) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.terminal
    }

    /// True iff a pattern matches the name or any ancestor at a label
    /// boundary: `ads.example.com` blocks itself and `x.ads.example.com`,
    /// never `badads.example.com`.
    pub fn matches_suffix(&self, name: &str) -> bool {
        let mut node = &self.root;
        for label in name.split('.').rev() {
            match node.children.get(label) {
                Some(child) => {
                    if child.terminal {
                        return true;
                    }
                    node = child;
                }
                None => return false,
            }
        }
        false
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }

    pub fn is_empty(&self) -> bool {
        self.pattern_count == 0
    }
}

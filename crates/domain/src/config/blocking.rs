use serde::{Deserialize, Serialize};

/// How blocklist patterns match query names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// A pattern blocks itself and every subdomain at a label boundary:
    /// `ads.example.com` blocks `ads.example.com` and `x.ads.example.com`
    /// but not `badads.example.com`.
    #[default]
    Suffix,
    /// Whole-string equality only.
    Exact,
}

/// Domain blocking policy.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BlockingConfig {
    /// Dotted domain patterns; a leading `*.` is accepted and stripped.
    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub match_mode: MatchMode,
}

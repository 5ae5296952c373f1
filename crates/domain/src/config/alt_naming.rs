use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Endpoints for alternative-naming resolvers, keyed by scheme name
/// (`ens`, `uns`, `zns`, `cns`).
///
/// The endpoint strings are opaque to the resolver core; they are handed to
/// whatever resolver implementation is registered for the scheme.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AltNamingConfig {
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

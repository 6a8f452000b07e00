use indexmap::IndexMap;
use serde::Deserialize;

/// Token ledger configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Users seeded into the in-memory store, keyed by user id
    #[serde(default)]
    pub users: IndexMap<String, SeedUser>,
}

/// Initial quota for a seeded user
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedUser {
    pub token_limit: u64,
}

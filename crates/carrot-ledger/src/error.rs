/// Errors returned by the ledger and user stores
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The backing store failed to read or write
    #[error("user store failure: {0}")]
    Store(String),

    /// A counter would overflow
    #[error("usage counter overflow for user {user_id}")]
    Overflow {
        /// Account whose counters overflowed
        user_id: String,
    },
}

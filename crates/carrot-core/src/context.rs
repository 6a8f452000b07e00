/// Identifier of the authenticated user a turn is billed to
pub type UserId = String;

/// Per-request identity resolved by the upstream authentication layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// User the turn runs on behalf of
    pub user_id: UserId,
}

impl RequestContext {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self { user_id: user_id.into() }
    }
}

//! Request authentication context

use janus_db::UserRow;
use janus_types::UserId;

/// Immutable authentication context attached to a request by the
/// renewal layer.
///
/// Carries the resolved user and the freshly rotated token pair. The
/// layer also sets the pair on the response headers so clients replace
/// their copy on every authenticated call; nothing downstream mutates
/// this value.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User resolved from the refresh token's subject
    pub user: UserRow,
    /// Rotated access token
    pub access_token: String,
    /// Rotated refresh token
    pub refresh_token: String,
}

impl AuthContext {
    /// The authenticated user's id
    pub fn user_id(&self) -> UserId {
        UserId(self.user.id)
    }

    /// The authenticated user's email
    pub fn email(&self) -> &str {
        &self.user.email
    }
}
